//! Listing Field Scraper: reads one job's fields from the result card and the opened listing.

use chrono::NaiveDate;
use tracing::debug;

use crate::browser::{try_find, BrowserError, Element, Page};
use crate::models::job::APPLY_LINK_NOT_AVAILABLE;
use crate::models::ApplyMode;
use crate::scrape::dates::{normalize_posting_date, DATE_NOT_AVAILABLE};
use crate::scrape::selectors::BoardSelectors;

/// The card's title link, enough to identify the job before anything else is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLink {
    pub title: String,
    pub listing_url: String,
    /// The clickable title link, used to open the listing.
    pub element: Element,
}

/// Company and location from a search-result card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub company: String,
    pub location: String,
}

pub async fn read_card_link<P: Page + ?Sized>(
    page: &P,
    card: &Element,
    selectors: &BoardSelectors,
) -> Result<CardLink, BrowserError> {
    let element = page.find_in(card, &selectors.card_title_link).await?;
    let title = page.text(&element).await?.trim().to_string();
    let listing_url = page.attribute(&element, "href").await?.unwrap_or_default();
    Ok(CardLink {
        title,
        listing_url,
        element,
    })
}

pub async fn read_card_details<P: Page + ?Sized>(
    page: &P,
    card: &Element,
    selectors: &BoardSelectors,
) -> Result<CardDetails, BrowserError> {
    let company = page.find_in(card, &selectors.card_company).await?;
    let company = page.text(&company).await?.trim().to_string();
    let location = page.find_in(card, &selectors.card_location).await?;
    let location = page.text(&location).await?.trim().to_string();
    Ok(CardDetails { company, location })
}

/// ISO posting date from the card, or "Not available" when the card has no date element.
pub async fn read_posting_date<P: Page + ?Sized>(
    page: &P,
    card: &Element,
    selectors: &BoardSelectors,
    today: NaiveDate,
) -> Result<String, BrowserError> {
    match page.find_in(card, &selectors.card_posted).await {
        Ok(element) => {
            let text = page.text(&element).await?;
            Ok(normalize_posting_date(&text, today))
        }
        Err(e) if e.is_not_found() => Ok(DATE_NOT_AVAILABLE.to_string()),
        Err(e) => Err(e),
    }
}

/// Full description text of the opened listing.
pub async fn read_description<P: Page + ?Sized>(
    page: &P,
    selectors: &BoardSelectors,
) -> Result<String, BrowserError> {
    let element = page.find(&selectors.description).await?;
    Ok(page.text(&element).await?.trim().to_string())
}

/// Checks the apply controls in order: internal, external "Apply now", alternate container.
pub async fn detect_apply_mode<P: Page + ?Sized>(
    page: &P,
    selectors: &BoardSelectors,
) -> Result<ApplyMode, BrowserError> {
    if try_find(page, &selectors.internal_apply).await?.is_some() {
        let link = page.current_url().await?;
        debug!("Internal apply at {link}");
        return Ok(ApplyMode::Internal { link });
    }

    for locator in [&selectors.external_apply, &selectors.external_apply_alt] {
        if let Some(button) = try_find(page, locator).await? {
            let link = page
                .attribute(&button, "href")
                .await?
                .filter(|href| !href.is_empty())
                .unwrap_or_else(|| APPLY_LINK_NOT_AVAILABLE.to_string());
            return Ok(ApplyMode::External { link });
        }
    }

    Ok(ApplyMode::NotFound)
}
