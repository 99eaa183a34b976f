//! Scrape Orchestrator: keyword search, pagination, and the per-job pipeline.
//!
//! For every keyword: search, sort by date, then walk result pages up to the
//! pagination limit. For every card: dedupe on job id, open, extract, classify,
//! optionally generate a resume, and append to the ledger. Browser failures on a
//! single job never leave the page loop; ledger failures end the run.

use chrono::Local;
use tracing::{debug, info, warn};

use crate::browser::{try_find, BrowserError, Element, Page};
use crate::classifier::{Classification, SuitabilityClassifier};
use crate::errors::ScoutError;
use crate::ledger::Ledger;
use crate::models::JobRecord;
use crate::pacing::Pacer;
use crate::resume::ResumeMaterializer;
use crate::scrape::ids::extract_job_id;
use crate::scrape::interact::{
    click_with_retry, dismiss_popups_quietly, reject_cookies, type_like_human,
};
use crate::scrape::listing::{
    detect_apply_mode, read_card_details, read_card_link, read_description, read_posting_date,
};
use crate::scrape::selectors::BoardSelectors;

const RECORDED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub home_url: String,
    /// Result pages visited per keyword, at most.
    pub pagination_limit: u32,
}

/// Counters for one run, logged at the end and returned from `Scraper::run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub keywords: usize,
    pub pages: usize,
    /// Cards encountered on result pages.
    pub listings_seen: usize,
    /// Cards without a job id, or already in the ledger.
    pub skipped: usize,
    pub recorded: usize,
    pub suitable: usize,
    pub resumes: usize,
    /// Jobs dropped after a browser failure or exhausted click retries.
    pub abandoned: usize,
}

enum JobOutcome {
    Skipped,
    Abandoned,
    Recorded { suitable: bool, resume: bool },
}

/// Run context: the page, the classifier, and all state owned by one scrape.
pub struct Scraper<'a, P: Page + ?Sized, C: SuitabilityClassifier + ?Sized> {
    page: &'a P,
    classifier: &'a C,
    ledger: Ledger,
    materializer: ResumeMaterializer,
    selectors: BoardSelectors,
    pacer: Pacer,
    settings: ScrapeSettings,
}

impl<'a, P, C> Scraper<'a, P, C>
where
    P: Page + ?Sized,
    C: SuitabilityClassifier + ?Sized,
{
    pub fn new(
        page: &'a P,
        classifier: &'a C,
        ledger: Ledger,
        materializer: ResumeMaterializer,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            page,
            classifier,
            ledger,
            materializer,
            selectors: BoardSelectors::default(),
            pacer: Pacer::default(),
            settings,
        }
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Scrapes every keyword in order. Only ledger I/O and the initial navigation are fatal.
    pub async fn run(&mut self, keywords: &[String]) -> Result<RunSummary, ScoutError> {
        let mut summary = RunSummary::default();

        self.page.navigate(&self.settings.home_url).await?;
        self.pacer.page_settle().await;
        reject_cookies(self.page, &self.selectors).await;

        for keyword in keywords {
            summary.keywords += 1;
            info!("Searching for keyword: {keyword}");

            if let Err(e) = self.search(keyword).await {
                warn!("Search for {keyword:?} failed, moving to next keyword: {e}");
                continue;
            }
            self.sort_by_date().await;
            self.scrape_pages(keyword, &mut summary).await?;
        }

        info!(
            "Run finished: {} keywords, {} pages, {} listings seen, {} skipped, {} recorded, \
             {} suitable, {} resumes, {} abandoned",
            summary.keywords,
            summary.pages,
            summary.listings_seen,
            summary.skipped,
            summary.recorded,
            summary.suitable,
            summary.resumes,
            summary.abandoned
        );
        Ok(summary)
    }

    /// Types the keyword, resets the box with its clear control, retypes, and submits.
    async fn search(&self, keyword: &str) -> Result<(), BrowserError> {
        let s = &self.selectors;

        let input = self.page.find(&s.search_input).await?;
        self.page.clear(&input).await?;
        type_like_human(self.page, &input, keyword, &self.pacer).await?;
        self.pacer.step().await;

        if let Some(clear) = try_find(self.page, &s.search_clear).await? {
            self.page.click(&clear).await?;
            self.pacer.step().await;
        }

        let input = self.page.find(&s.search_input).await?;
        self.page.clear(&input).await?;
        type_like_human(self.page, &input, keyword, &self.pacer).await?;
        self.pacer.step().await;

        let submit = self.page.find(&s.search_submit).await?;
        self.page.click(&submit).await?;
        self.pacer.page_settle().await;
        Ok(())
    }

    async fn sort_by_date(&self) {
        let sort = match try_find(self.page, &self.selectors.sort_by_date).await {
            Ok(Some(sort)) => sort,
            Ok(None) => {
                info!("Sort-by-date control not found; keeping default order");
                return;
            }
            Err(e) => {
                warn!("Could not look up sort control: {e}");
                return;
            }
        };

        match click_with_retry(self.page, &sort, &self.selectors, &self.pacer).await {
            Ok(true) => {
                info!("Sorted results by date");
                self.pacer.page_settle().await;
            }
            Ok(false) => warn!("Sort-by-date click kept being intercepted"),
            Err(e) => warn!("Sort-by-date failed: {e}"),
        }
    }

    async fn scrape_pages(
        &mut self,
        keyword: &str,
        summary: &mut RunSummary,
    ) -> Result<(), ScoutError> {
        let limit = self.settings.pagination_limit.max(1);
        let mut page_number = 1;

        loop {
            info!("Scraping page {page_number} for {keyword:?}");
            summary.pages += 1;
            self.scrape_page(summary).await?;

            if page_number >= limit {
                info!("Reached pagination limit of {limit} for {keyword:?}");
                break;
            }
            if !self.next_page().await {
                info!("No more result pages for {keyword:?}");
                break;
            }
            page_number += 1;
        }
        Ok(())
    }

    /// Clicks the next-page control. `false` when there is none or it cannot be clicked.
    async fn next_page(&self) -> bool {
        let next = match try_find(self.page, &self.selectors.next_page).await {
            Ok(Some(next)) => next,
            Ok(None) => return false,
            Err(e) => {
                warn!("Could not look up next-page control: {e}");
                return false;
            }
        };

        match click_with_retry(self.page, &next, &self.selectors, &self.pacer).await {
            Ok(true) => {
                self.pacer.listing_settle().await;
                true
            }
            Ok(false) => {
                warn!("Next-page click kept being intercepted");
                false
            }
            Err(e) => {
                warn!("Next-page click failed: {e}");
                false
            }
        }
    }

    async fn scrape_page(&mut self, summary: &mut RunSummary) -> Result<(), ScoutError> {
        let cards = match self.page.find_all(&self.selectors.listing_cards).await {
            Ok(cards) => cards,
            Err(e) => {
                warn!("Could not read listing cards: {e}");
                return Ok(());
            }
        };
        info!("Found {} listings on page", cards.len());

        for card in &cards {
            summary.listings_seen += 1;
            match self.process_listing(card).await {
                Ok(JobOutcome::Skipped) => summary.skipped += 1,
                Ok(JobOutcome::Abandoned) => summary.abandoned += 1,
                Ok(JobOutcome::Recorded { suitable, resume }) => {
                    summary.recorded += 1;
                    summary.suitable += usize::from(suitable);
                    summary.resumes += usize::from(resume);
                }
                Err(ScoutError::Browser(e)) => {
                    warn!("Error processing job listing: {e}");
                    summary.abandoned += 1;
                }
                Err(e) => return Err(e),
            }
            dismiss_popups_quietly(self.page, &self.selectors, &self.pacer).await;
        }
        Ok(())
    }

    async fn process_listing(&mut self, card: &Element) -> Result<JobOutcome, ScoutError> {
        let s = &self.selectors;
        let link = read_card_link(self.page, card, s).await?;

        let Some(job_id) = extract_job_id(&link.listing_url) else {
            debug!("No job id in {:?}; skipping", link.listing_url);
            return Ok(JobOutcome::Skipped);
        };
        if self.ledger.contains(&job_id) {
            info!("Job {job_id} already recorded; skipping");
            return Ok(JobOutcome::Skipped);
        }

        let details = read_card_details(self.page, card, s).await?;
        let today = Local::now().date_naive();
        let posting_date = read_posting_date(self.page, card, s, today).await?;

        if !click_with_retry(self.page, &link.element, s, &self.pacer).await? {
            warn!("Could not open job {job_id} after retries; skipping");
            return Ok(JobOutcome::Abandoned);
        }
        self.pacer.listing_settle().await;

        let description = read_description(self.page, s).await?;
        let apply = detect_apply_mode(self.page, s).await?;
        info!("Job {job_id}: {} at {}", link.title, details.company);

        let classification = self.classifier.classify(&description).await;
        let resume_path = match &classification {
            Classification::Suitable { profile, skills } => {
                self.materializer
                    .materialize(profile, skills, &link.title, &job_id)
            }
            _ => None,
        };

        let record = JobRecord {
            title: link.title,
            company: details.company,
            location: details.location,
            description,
            posting_date,
            apply_link: apply.link().to_string(),
            listing_url: link.listing_url,
            job_id,
            date_recorded: Local::now().format(RECORDED_AT_FORMAT).to_string(),
            internal_apply: apply.is_internal(),
            resume_path: resume_path.as_ref().map(|p| p.display().to_string()),
            suitability: classification.suitability_label().to_string(),
        };

        self.ledger.append_record(&record)?;
        self.ledger.add(&record.job_id);

        Ok(JobOutcome::Recorded {
            suitable: classification.is_suitable(),
            resume: resume_path.is_some(),
        })
    }
}
