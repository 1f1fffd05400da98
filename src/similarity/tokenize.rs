use std::collections::BTreeSet;

/// Word forms of a statement, in order of appearance.
///
/// Tokens are whitespace-delimited, lower-cased and stripped of leading and
/// trailing punctuation. A token made only of punctuation keeps its raw
/// lower-cased form, so a non-empty statement always yields at least one token.
/// Both the cosine vocabulary and the Jaccard word sets go through here.
pub fn tokenize(statement: &str) -> Vec<String> {
    statement
        .split_whitespace()
        .map(|raw| {
            let lowered = raw.to_lowercase();
            let stripped = lowered.trim_matches(|character: char| !character.is_alphanumeric());
            if stripped.is_empty() {
                lowered
            } else {
                stripped.to_string()
            }
        })
        .collect()
}

pub fn token_set(statement: &str) -> BTreeSet<String> {
    tokenize(statement).into_iter().collect()
}
