use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store::{
    LEDGER_SCHEMA_VERSION, ledger_counts, open_ledger_read_only, recent_runs, stored_schema_version,
};

pub fn run(args: StatusArgs) -> Result<()> {
    info!(db_path = %args.db_path.display(), "status requested");

    if !args.db_path.exists() {
        warn!(path = %args.db_path.display(), "run ledger missing");
        return Ok(());
    }

    let connection = open_ledger_read_only(&args.db_path)?;
    let schema_version = stored_schema_version(&connection)?.unwrap_or_default();
    if schema_version != LEDGER_SCHEMA_VERSION {
        warn!(
            found = %schema_version,
            expected = LEDGER_SCHEMA_VERSION,
            "ledger schema version differs from this build"
        );
    }

    let counts = ledger_counts(&connection)?;
    info!(
        path = %args.db_path.display(),
        schema_version = %schema_version,
        runs = counts.runs,
        results = counts.results,
        errors = counts.errors,
        "ledger status"
    );

    for run in recent_runs(&connection, args.recent)? {
        info!(
            run_id = %run.run_id,
            started_at = %run.started_at,
            mode = %run.mode,
            rows = run.row_count,
            errors = run.error_count,
            "recent run"
        );
    }

    Ok(())
}
