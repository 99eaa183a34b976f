// All LLM prompt constants for the Suitability Classifier.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for suitability classification.
pub const SUITABILITY_SYSTEM: &str = "You are a helpful assistant that determines the \
    suitability of my profile with the job description.";

/// Suitability prompt template. Replace `{profile}`, `{job_description}` and
/// `{json_only_instruction}` before sending.
pub const SUITABILITY_PROMPT_TEMPLATE: &str = r#"Given the following profile: {profile}
And the following job description:
{job_description}

Do you think I am a suitable match for this job?
If No, respond with a structured JSON containing "suitable":"No". Strictly follow the schema. {json_only_instruction}
If Yes,
Based on the job description and profile write a small profile section for a cv. Make sure to include relevant keywords so that it will get detected by ATS.
Based on the job description and profile write a skill section for a cv. Make sure to include relevant skills so that the cv will get detected by ATS.
Respond with a structured JSON containing "suitable":"Yes", "profile":"", "skills":"".
{json_only_instruction}"#;
