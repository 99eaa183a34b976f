use thiserror::Error;

use crate::browser::BrowserError;
use crate::ledger::LedgerError;

/// Errors that end a scrape run.
///
/// Per-job browser failures are caught inside the page loop and never reach the
/// caller; only failures outside a job (initial navigation) surface as `Browser`.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
}
