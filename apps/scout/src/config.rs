use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::llm_client::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::resume::FontSpec;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub candidate_profile: String,
    pub keywords: Vec<String>,
    pub pagination_limit: u32,
    pub resume_template_path: PathBuf,
    pub resume_output_dir: PathBuf,
    pub current_resume_path: PathBuf,
    pub resume_font: FontSpec,
    pub master_csv: PathBuf,
    pub latest_csv: PathBuf,
    pub board_home_url: String,
    pub webdriver_url: String,
    pub keep_browser_open: bool,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let candidate_profile = match (var("CANDIDATE_PROFILE"), var("CANDIDATE_PROFILE_PATH")) {
            (Some(profile), _) => profile,
            (None, Some(path)) => std::fs::read_to_string(&path)
                .with_context(|| format!("Could not read CANDIDATE_PROFILE_PATH '{path}'"))?,
            (None, None) => bail!(
                "Required environment variable 'CANDIDATE_PROFILE' (or 'CANDIDATE_PROFILE_PATH') is not set"
            ),
        };

        let keywords = parse_keywords(&require_env(&var, "JOB_SEARCH_KEYWORDS")?);
        if keywords.is_empty() {
            bail!("JOB_SEARCH_KEYWORDS must contain at least one keyword");
        }

        let pagination_limit = or_default("PAGINATION_LIMIT", "3")
            .trim()
            .parse::<u32>()
            .context("PAGINATION_LIMIT must be a positive integer")?;
        if pagination_limit == 0 {
            bail!("PAGINATION_LIMIT must be at least 1");
        }

        let default_font = FontSpec::default();
        let size_pt = match var("RESUME_FONT_SIZE") {
            Some(size) => size
                .trim()
                .parse::<f32>()
                .context("RESUME_FONT_SIZE must be a number of points")?,
            None => default_font.size_pt,
        };
        if !size_pt.is_finite() || size_pt <= 0.0 {
            bail!("RESUME_FONT_SIZE must be a positive number of points, got {size_pt}");
        }
        let resume_font = FontSpec {
            name: or_default("RESUME_FONT", &default_font.name),
            size_pt,
            bold: match var("RESUME_FONT_BOLD") {
                Some(flag) => parse_bool(&flag).context("RESUME_FONT_BOLD must be true or false")?,
                None => default_font.bold,
            },
        };

        Ok(Config {
            openai_api_key: require_env(&var, "OPENAI_API_KEY")?,
            llm_api_url: or_default("LLM_API_URL", DEFAULT_API_URL),
            llm_model: or_default("LLM_MODEL", DEFAULT_MODEL),
            candidate_profile,
            keywords,
            pagination_limit,
            resume_template_path: require_env(&var, "RESUME_TEMPLATE_PATH")?.into(),
            resume_output_dir: or_default("RESUME_OUTPUT_DIR", "resumes").into(),
            current_resume_path: or_default("CURRENT_RESUME_PATH", "Current - resume.docx").into(),
            resume_font,
            master_csv: or_default("MASTER_CSV", "jobs_master.csv").into(),
            latest_csv: or_default("LATEST_CSV", "jobs_latest.csv").into(),
            board_home_url: or_default("BOARD_HOME_URL", "https://www.indeed.com"),
            webdriver_url: or_default("WEBDRIVER_URL", "http://localhost:9515"),
            keep_browser_open: match var("KEEP_BROWSER_OPEN") {
                Some(flag) => parse_bool(&flag).context("KEEP_BROWSER_OPEN must be true or false")?,
                None => false,
            },
            rust_log: or_default("RUST_LOG", "info"),
        })
    }
}

fn require_env(var: impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Comma-separated, order preserved, blanks dropped.
fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("invalid boolean '{other}'"),
    }
}
