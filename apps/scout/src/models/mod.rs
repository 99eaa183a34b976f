pub mod job;

pub use job::{ApplyMode, JobRecord, LEDGER_HEADERS};
