pub mod compare;
mod evaluate;
pub mod kappa;
pub mod status;
pub mod validate;
