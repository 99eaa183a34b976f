//! Suitability Classifier: asks the model whether the candidate fits a listing and,
//! if so, for tailored profile/skills blurbs.
//!
//! The model answers in free-form text that is supposed to contain a JSON object.
//! Parsing is best-effort and never raises: every outcome is a `Classification`
//! variant the orchestrator can match on.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError};

pub mod prompts;

use prompts::{SUITABILITY_PROMPT_TEMPLATE, SUITABILITY_SYSTEM};

pub const LABEL_SUITABLE: &str = "Yes";
pub const LABEL_NOT_SUITABLE: &str = "No";
pub const LABEL_MALFORMED: &str = "Error: malformed response";
pub const LABEL_TRANSPORT_ERROR: &str = "Error: request failed";

/// Outcome of one classification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    NotSuitable,
    Suitable { profile: String, skills: String },
    /// The model answered, but not with a usable object.
    Malformed { raw_message: String },
    /// The request never produced a model answer.
    TransportError { message: String },
}

impl Classification {
    /// Value written to the ledger's Suitability column.
    pub fn suitability_label(&self) -> &'static str {
        match self {
            Classification::Suitable { .. } => LABEL_SUITABLE,
            Classification::NotSuitable => LABEL_NOT_SUITABLE,
            Classification::Malformed { .. } => LABEL_MALFORMED,
            Classification::TransportError { .. } => LABEL_TRANSPORT_ERROR,
        }
    }

    pub fn is_suitable(&self) -> bool {
        matches!(self, Classification::Suitable { .. })
    }
}

/// Pluggable classifier. The scraper holds one of these; tests swap in a scripted one.
#[async_trait]
pub trait SuitabilityClassifier: Send + Sync {
    async fn classify(&self, job_description: &str) -> Classification;
}

/// Classifier backed by the chat-completion endpoint.
pub struct LlmClassifier {
    llm: LlmClient,
    profile: String,
}

impl LlmClassifier {
    pub fn new(llm: LlmClient, profile: String) -> Self {
        Self { llm, profile }
    }

    fn build_prompt(&self, job_description: &str) -> String {
        SUITABILITY_PROMPT_TEMPLATE
            .replace("{json_only_instruction}", JSON_ONLY_INSTRUCTION)
            .replace("{profile}", &self.profile)
            .replace("{job_description}", job_description)
    }
}

#[async_trait]
impl SuitabilityClassifier for LlmClassifier {
    async fn classify(&self, job_description: &str) -> Classification {
        let prompt = self.build_prompt(job_description);

        let classification = match self.llm.call_text(&prompt, SUITABILITY_SYSTEM).await {
            Ok(text) => interpret_response(&text),
            // An answer with no content is still an answer, just not a usable one.
            Err(LlmError::EmptyContent) => Classification::Malformed {
                raw_message: String::new(),
            },
            Err(e) => Classification::TransportError {
                message: e.to_string(),
            },
        };

        match &classification {
            Classification::Malformed { raw_message } => {
                warn!("Classifier response unusable: {raw_message:?}")
            }
            Classification::TransportError { message } => {
                warn!("Classifier request failed: {message}")
            }
            other => info!("Is it suitable? {}", other.suitability_label()),
        }

        classification
    }
}

/// Returns the first brace-delimited substring: first `{` through the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Turns raw model output into a `Classification`.
pub fn interpret_response(text: &str) -> Classification {
    let Some(object) = extract_json_object(text) else {
        return Classification::Malformed {
            raw_message: text.to_string(),
        };
    };

    let malformed = || Classification::Malformed {
        raw_message: object.to_string(),
    };

    let Ok(value) = serde_json::from_str::<Value>(object) else {
        return malformed();
    };

    let verdict = value
        .get("suitable")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_ascii_lowercase());

    match verdict.as_deref() {
        Some("no") => Classification::NotSuitable,
        Some("yes") => match (
            value.get("profile").and_then(text_block),
            value.get("skills").and_then(text_block),
        ) {
            (Some(profile), Some(skills)) => Classification::Suitable { profile, skills },
            _ => malformed(),
        },
        _ => malformed(),
    }
}

/// Models sometimes return skills as a list instead of a string.
fn text_block(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}
