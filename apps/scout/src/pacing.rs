//! Human-paced delays between browser interactions.
//!
//! Every wait in the scraper goes through `Pacer` so tests can run the whole
//! pipeline with `Pacer::instant()`.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone)]
pub struct Pacer {
    /// Between individual keystrokes.
    pub keystroke: Range<f64>,
    /// Between the steps of a search (type, clear, retype).
    pub step: Range<f64>,
    /// After a submit, sort, or initial navigation.
    pub page_settle: Range<f64>,
    /// After opening a listing or moving to the next result page.
    pub listing_settle: Range<f64>,
    /// Between the ESCAPE and ENTER of a popup dismissal.
    pub dismiss_key: f64,
    /// Between click retries.
    pub click_retry: f64,
}

impl Default for Pacer {
    fn default() -> Self {
        Self {
            keystroke: 0.05..0.2,
            step: 0.5..1.5,
            page_settle: 1.5..3.0,
            listing_settle: 2.0..3.0,
            dismiss_key: 0.5,
            click_retry: 2.0,
        }
    }
}

impl Pacer {
    pub fn instant() -> Self {
        Self {
            keystroke: 0.0..0.0,
            step: 0.0..0.0,
            page_settle: 0.0..0.0,
            listing_settle: 0.0..0.0,
            dismiss_key: 0.0,
            click_retry: 0.0,
        }
    }

    pub async fn keystroke(&self) {
        pause_between(&self.keystroke).await;
    }

    pub async fn step(&self) {
        pause_between(&self.step).await;
    }

    pub async fn page_settle(&self) {
        pause_between(&self.page_settle).await;
    }

    pub async fn listing_settle(&self) {
        pause_between(&self.listing_settle).await;
    }

    pub async fn dismiss_key(&self) {
        pause(self.dismiss_key).await;
    }

    pub async fn click_retry(&self) {
        pause(self.click_retry).await;
    }
}

async fn pause_between(range: &Range<f64>) {
    if range.is_empty() {
        pause(range.start).await;
        return;
    }
    let secs = rand::rng().random_range(range.clone());
    pause(secs).await;
}

async fn pause(secs: f64) {
    if secs > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }
}
