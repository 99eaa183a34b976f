pub mod dates;
pub mod ids;
pub mod interact;
pub mod listing;
pub mod orchestrator;
pub mod selectors;

pub use orchestrator::{RunSummary, ScrapeSettings, Scraper};
