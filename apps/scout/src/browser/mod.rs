//! Browser capability: the only surface the scraper uses to talk to a live page.
//!
//! The orchestrator never touches a driver directly: it goes through `Page`, so the
//! retry and popup-dismissal logic can run against `fake::FakePage` in tests and
//! against `webdriver::WebDriverSession` in production.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod webdriver;

#[cfg(test)]
pub mod fake;

/// W3C WebDriver key codes used by the scraper.
pub mod keys {
    pub const ENTER: &str = "\u{E007}";
    pub const ESCAPE: &str = "\u{E00C}";
}

/// How an element is located on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
    Id(String),
    Name(String),
    Tag(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Locator::Name(name.into())
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Locator::Tag(tag.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={s}"),
            Locator::XPath(s) => write!(f, "xpath={s}"),
            Locator::Id(s) => write!(f, "id={s}"),
            Locator::Name(s) => write!(f, "name={s}"),
            Locator::Tag(s) => write!(f, "tag={s}"),
        }
    }
}

/// Opaque handle to an element the driver has resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element(pub(crate) String);

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("element not found: {locator}")]
    NotFound { locator: String },

    /// Click intercepted by an overlay, or the target is outside the viewport.
    #[error("interaction blocked: {0}")]
    Blocked(String),

    #[error("timed out after {waited:?} waiting for {locator}")]
    Timeout { locator: String, waited: Duration },

    #[error("stale element reference: {0}")]
    Stale(String),

    #[error("webdriver error ({code}): {message}")]
    Protocol { code: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BrowserError {
    pub fn not_found(locator: &Locator) -> Self {
        BrowserError::NotFound {
            locator: locator.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BrowserError::NotFound { .. })
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, BrowserError::Blocked(_))
    }
}

/// A single browser tab. Every call is awaited before the next one is issued.
#[async_trait]
pub trait Page: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Returns `BrowserError::NotFound` when nothing matches.
    async fn find(&self, locator: &Locator) -> Result<Element, BrowserError>;

    /// Returns an empty vec when nothing matches.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>, BrowserError>;

    async fn find_in(&self, parent: &Element, locator: &Locator)
        -> Result<Element, BrowserError>;

    async fn text(&self, element: &Element) -> Result<String, BrowserError>;

    async fn attribute(&self, element: &Element, name: &str)
        -> Result<Option<String>, BrowserError>;

    async fn is_displayed(&self, element: &Element) -> Result<bool, BrowserError>;

    async fn is_enabled(&self, element: &Element) -> Result<bool, BrowserError>;

    async fn scroll_into_view(&self, element: &Element) -> Result<(), BrowserError>;

    async fn click(&self, element: &Element) -> Result<(), BrowserError>;

    async fn clear(&self, element: &Element) -> Result<(), BrowserError>;

    async fn send_keys(&self, element: &Element, text: &str) -> Result<(), BrowserError>;

    /// Polls until `locator` resolves or `timeout` elapses.
    async fn wait_for(&self, locator: &Locator, timeout: Duration)
        -> Result<Element, BrowserError>;
}

/// Resolves `locator`, mapping "not found" to `None`.
pub async fn try_find<P: Page + ?Sized>(
    page: &P,
    locator: &Locator,
) -> Result<Option<Element>, BrowserError> {
    match page.find(locator).await {
        Ok(element) => Ok(Some(element)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
