use serde::{Serialize, Serializer};

/// Column headers shared by the master and latest-run logs, in write order.
pub const LEDGER_HEADERS: [&str; 12] = [
    "Job Title",
    "Company Name",
    "Location",
    "Job Description",
    "Posting Date",
    "Apply Link",
    "Job Listing URL",
    "Job ID",
    "Date Recorded",
    "Internal apply",
    "Resume path",
    "Suitability",
];

/// Sentinel apply link when none of the apply controls could be found.
pub const APPLY_LINK_NOT_FOUND: &str = "Apply link not found";
/// Sentinel apply link when an external apply button exists but carries no href.
pub const APPLY_LINK_NOT_AVAILABLE: &str = "Apply link not available";

/// One scraped listing, as persisted to both ledgers.
///
/// Field order matches `LEDGER_HEADERS`; the csv writer relies on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    #[serde(rename = "Job Title")]
    pub title: String,
    #[serde(rename = "Company Name")]
    pub company: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Job Description")]
    pub description: String,
    /// ISO date, or "Not available".
    #[serde(rename = "Posting Date")]
    pub posting_date: String,
    #[serde(rename = "Apply Link")]
    pub apply_link: String,
    #[serde(rename = "Job Listing URL")]
    pub listing_url: String,
    #[serde(rename = "Job ID")]
    pub job_id: String,
    #[serde(rename = "Date Recorded")]
    pub date_recorded: String,
    #[serde(rename = "Internal apply", serialize_with = "yes_no")]
    pub internal_apply: bool,
    #[serde(rename = "Resume path")]
    pub resume_path: Option<String>,
    #[serde(rename = "Suitability")]
    pub suitability: String,
}

/// Where the "apply" action of a listing leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyMode {
    /// The board's own in-page application flow.
    Internal { link: String },
    External { link: String },
    NotFound,
}

impl ApplyMode {
    pub fn is_internal(&self) -> bool {
        matches!(self, ApplyMode::Internal { .. })
    }

    pub fn link(&self) -> &str {
        match self {
            ApplyMode::Internal { link } | ApplyMode::External { link } => link,
            ApplyMode::NotFound => APPLY_LINK_NOT_FOUND,
        }
    }
}

fn yes_no<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "Yes" } else { "No" })
}
