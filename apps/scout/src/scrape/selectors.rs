use crate::browser::Locator;

/// Every locator the scraper relies on, in one place.
///
/// Defaults target Indeed's markup as of the last crawl. When the board changes its
/// class names, this is the only struct that needs updating.
#[derive(Debug, Clone)]
pub struct BoardSelectors {
    pub search_input: Locator,
    /// The "x" inside the search box; clears stale autocomplete state.
    pub search_clear: Locator,
    pub search_submit: Locator,
    pub sort_by_date: Locator,
    pub listing_cards: Locator,
    pub card_title_link: Locator,
    pub card_company: Locator,
    pub card_location: Locator,
    pub card_posted: Locator,
    pub description: Locator,
    pub internal_apply: Locator,
    pub external_apply: Locator,
    pub external_apply_alt: Locator,
    pub next_page: Locator,
    pub popup_close: Locator,
    pub page_body: Locator,
    pub cookie_reject: Locator,
}

impl Default for BoardSelectors {
    fn default() -> Self {
        Self {
            search_input: Locator::name("q"),
            search_clear: Locator::xpath(
                r#"//*[@id="jobsearch"]/div/div[1]/div[1]/div/div/span/span[2]"#,
            ),
            search_submit: Locator::xpath("//button[contains(text(), 'Find jobs')]"),
            sort_by_date: Locator::xpath(r#"//*[@id="dateLabel"]"#),
            listing_cards: Locator::css("ul.css-zu9cdh li"),
            card_title_link: Locator::css("h2.jobTitle a"),
            card_company: Locator::css("span[data-testid='company-name']"),
            card_location: Locator::css("div[data-testid='text-location']"),
            card_posted: Locator::css("div.job_seen_beacon span.css-qvloho.eu4oa1w0"),
            description: Locator::id("jobDescriptionText"),
            internal_apply: Locator::id("indeedApplyButton"),
            external_apply: Locator::xpath("//button[.//span[text()='Apply now']]"),
            external_apply_alt: Locator::css("div#applyButtonLinkContainer button"),
            next_page: Locator::xpath(r#"//a[@data-testid="pagination-page-next"]"#),
            popup_close: Locator::xpath("//button[@aria-label='close' and @type='button']"),
            page_body: Locator::tag("body"),
            cookie_reject: Locator::id("onetrust-reject-all-handler"),
        }
    }
}
