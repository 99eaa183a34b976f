mod browser;
mod classifier;
mod config;
mod errors;
mod ledger;
mod llm_client;
mod models;
mod pacing;
mod resume;
mod scrape;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::browser::webdriver::WebDriverSession;
use crate::classifier::LlmClassifier;
use crate::config::Config;
use crate::ledger::Ledger;
use crate::llm_client::LlmClient;
use crate::resume::{ResumeMaterializer, ResumeSettings};
use crate::scrape::{ScrapeSettings, Scraper};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Scout v{}", env!("CARGO_PKG_VERSION"));

    // Ledger first: a broken log path should fail before a browser window opens
    let ledger = Ledger::open(&config.master_csv, &config.latest_csv)?;

    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.llm_api_url.clone(),
        config.llm_model.clone(),
    );
    info!("LLM client initialized (model: {})", llm.model());
    let classifier = LlmClassifier::new(llm, config.candidate_profile.clone());

    let materializer = ResumeMaterializer::new(ResumeSettings {
        template_path: config.resume_template_path.clone(),
        working_path: config.current_resume_path.clone(),
        output_dir: config.resume_output_dir.clone(),
        font: config.resume_font.clone(),
    });

    let session = WebDriverSession::start(&config.webdriver_url)
        .await
        .with_context(|| format!("Could not start a browser session at {}", config.webdriver_url))?;

    let outcome = {
        let mut scraper = Scraper::new(
            &session,
            &classifier,
            ledger,
            materializer,
            ScrapeSettings {
                home_url: config.board_home_url.clone(),
                pagination_limit: config.pagination_limit,
            },
        );
        let outcome = scraper.run(&config.keywords).await;
        info!(
            "{} job ids now in {} (this run: {})",
            scraper.ledger().len(),
            scraper.ledger().master_path().display(),
            scraper.ledger().latest_path().display()
        );
        outcome
    };

    if config.keep_browser_open {
        info!("Leaving the browser open");
    } else if let Err(e) = session.close().await {
        warn!("Could not close browser session: {e}");
    }

    match outcome {
        Ok(summary) => {
            info!(
                "Recorded {} jobs, {} suitable, {} resumes written",
                summary.recorded, summary.suitable, summary.resumes
            );
            Ok(())
        }
        Err(e) => {
            error!("Scrape aborted: {e}");
            Err(e.into())
        }
    }
}
