//! Scripted in-memory job board for exercising the scraper without a browser.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{keys, BrowserError, Element, Locator, Page};
use crate::scrape::selectors::BoardSelectors;

const HOME_URL: &str = "https://board.test/";

#[derive(Debug, Clone)]
pub enum FakeApply {
    Internal,
    External(Option<String>),
    AlternateExternal(Option<String>),
    Missing,
}

#[derive(Debug, Clone)]
pub struct FakeListing {
    pub href: String,
    pub title: String,
    /// `None` leaves the element off the card.
    pub company: Option<String>,
    pub location: Option<String>,
    pub posted: Option<String>,
    /// `None` leaves the description element off the opened listing.
    pub description: Option<String>,
    pub apply: FakeApply,
    /// Number of clicks on the title that fail as intercepted before one succeeds.
    pub blocked_clicks: u32,
}

impl FakeListing {
    pub fn new(job_id: &str, title: &str) -> Self {
        Self {
            href: format!("https://board.test/rc/clk?jk={job_id}&from=serp"),
            title: title.to_string(),
            company: Some(format!("{title} Corp")),
            location: Some("Remote".to_string()),
            posted: Some("Posted 2 days ago".to_string()),
            description: Some(format!("description for {job_id}")),
            apply: FakeApply::Internal,
            blocked_clicks: 0,
        }
    }

    pub fn without_id(title: &str) -> Self {
        let mut listing = Self::new("unused", title);
        listing.href = "https://board.test/pagead/clk?ad=1".to_string();
        listing
    }
}

#[derive(Debug, Default)]
struct FakeState {
    pages: Vec<Vec<FakeListing>>,
    endless_pagination: bool,
    page: usize,
    opened: Option<(usize, usize)>,
    popup_visible: bool,
    cookie_banner: bool,
    sort_available: bool,
    blocked: HashMap<String, u32>,
    listing_reads: usize,
    events: Vec<String>,
}

pub struct FakePage {
    selectors: BoardSelectors,
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new(pages: Vec<Vec<FakeListing>>) -> Self {
        let mut blocked = HashMap::new();
        for (p, listings) in pages.iter().enumerate() {
            for (i, listing) in listings.iter().enumerate() {
                if listing.blocked_clicks > 0 {
                    blocked.insert(format!("title:{p}:{i}"), listing.blocked_clicks);
                }
            }
        }

        Self {
            selectors: BoardSelectors::default(),
            state: Mutex::new(FakeState {
                pages,
                sort_available: true,
                blocked,
                ..FakeState::default()
            }),
        }
    }

    /// A "next page" control is always present; clicking it past the end reloads the last page.
    pub fn with_endless_pagination(self) -> Self {
        self.state.lock().unwrap().endless_pagination = true;
        self
    }

    pub fn with_popup(self) -> Self {
        self.state.lock().unwrap().popup_visible = true;
        self
    }

    pub fn with_cookie_banner(self) -> Self {
        self.state.lock().unwrap().cookie_banner = true;
        self
    }

    pub fn without_sort_control(self) -> Self {
        self.state.lock().unwrap().sort_available = false;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn clicks_on(&self, element_id: &str) -> usize {
        let needle = format!("click:{element_id}");
        self.events().iter().filter(|e| **e == needle).count()
    }

    pub fn keys_sent_to(&self, element_id: &str) -> Vec<String> {
        let prefix = format!("keys:{element_id}:");
        self.events()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    /// How many times the listing cards of a result page were read.
    pub fn listing_reads(&self) -> usize {
        self.state.lock().unwrap().listing_reads
    }

    fn resolve(&self, state: &FakeState, locator: &Locator) -> Option<String> {
        let s = &self.selectors;
        let opened = state.opened.map(|(p, i)| &state.pages[p][i]);

        let id = if *locator == s.search_input {
            "search"
        } else if *locator == s.search_clear {
            "search-clear"
        } else if *locator == s.search_submit {
            "search-submit"
        } else if *locator == s.sort_by_date && state.sort_available {
            "sort"
        } else if *locator == s.page_body {
            "body"
        } else if *locator == s.popup_close && state.popup_visible {
            "popup-close"
        } else if *locator == s.cookie_reject && state.cookie_banner {
            "cookie-reject"
        } else if *locator == s.next_page
            && (state.endless_pagination || state.page + 1 < state.pages.len())
        {
            "next"
        } else if *locator == s.description
            && opened.is_some_and(|l| l.description.is_some())
        {
            "description"
        } else if let Some(listing) = opened {
            match (&listing.apply, locator) {
                (FakeApply::Internal, l) if *l == s.internal_apply => "apply-internal",
                (FakeApply::External(_), l) if *l == s.external_apply => "apply-external",
                (FakeApply::AlternateExternal(_), l) if *l == s.external_apply_alt => {
                    "apply-alt"
                }
                _ => return None,
            }
        } else {
            return None;
        };
        Some(id.to_string())
    }

    fn card_part(&self, state: &FakeState, parent: &Element, locator: &Locator) -> Option<String> {
        let (p, i) = parse_position(parent.id().strip_prefix("card:")?)?;
        let listing = state.pages.get(p)?.get(i)?;
        let s = &self.selectors;

        let part = if *locator == s.card_title_link {
            "title"
        } else if *locator == s.card_company && listing.company.is_some() {
            "company"
        } else if *locator == s.card_location && listing.location.is_some() {
            "location"
        } else if *locator == s.card_posted && listing.posted.is_some() {
            "posted"
        } else {
            return None;
        };
        Some(format!("{part}:{p}:{i}"))
    }

    fn listing<'a>(state: &'a FakeState, element: &Element) -> Option<&'a FakeListing> {
        let (_, rest) = element.id().split_once(':')?;
        let (p, i) = parse_position(rest)?;
        state.pages.get(p)?.get(i)
    }
}

fn parse_position(s: &str) -> Option<(usize, usize)> {
    let (p, i) = s.split_once(':')?;
    Some((p.parse().ok()?, i.parse().ok()?))
}

#[async_trait]
impl Page for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.state.lock().unwrap().events.push(format!("navigate:{url}"));
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let state = self.state.lock().unwrap();
        Ok(match state.opened {
            Some((p, i)) => format!("{HOME_URL}viewjob?listing={p}-{i}"),
            None => HOME_URL.to_string(),
        })
    }

    async fn find(&self, locator: &Locator) -> Result<Element, BrowserError> {
        let state = self.state.lock().unwrap();
        self.resolve(&state, locator)
            .map(Element::new)
            .ok_or_else(|| BrowserError::not_found(locator))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>, BrowserError> {
        let mut state = self.state.lock().unwrap();
        if *locator != self.selectors.listing_cards {
            return Ok(Vec::new());
        }
        state.listing_reads += 1;
        let page = state.page;
        let count = state.pages.get(page).map(Vec::len).unwrap_or(0);
        Ok((0..count)
            .map(|i| Element::new(format!("card:{page}:{i}")))
            .collect())
    }

    async fn find_in(
        &self,
        parent: &Element,
        locator: &Locator,
    ) -> Result<Element, BrowserError> {
        let state = self.state.lock().unwrap();
        self.card_part(&state, parent, locator)
            .map(Element::new)
            .ok_or_else(|| BrowserError::not_found(locator))
    }

    async fn text(&self, element: &Element) -> Result<String, BrowserError> {
        let state = self.state.lock().unwrap();
        if element.id() == "description" {
            let (p, i) = state.opened.ok_or_else(|| BrowserError::Stale("description".into()))?;
            return Ok(state.pages[p][i].description.clone().unwrap_or_default());
        }
        let listing = Self::listing(&state, element);
        let text = match (element.id().split(':').next(), listing) {
            (Some("title"), Some(l)) => l.title.clone(),
            (Some("company"), Some(l)) => l.company.clone().unwrap_or_default(),
            (Some("location"), Some(l)) => l.location.clone().unwrap_or_default(),
            (Some("posted"), Some(l)) => l.posted.clone().unwrap_or_default(),
            _ => String::new(),
        };
        Ok(text)
    }

    async fn attribute(
        &self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        if name != "href" {
            return Ok(None);
        }
        let state = self.state.lock().unwrap();
        if element.id().starts_with("title:") {
            return Ok(Self::listing(&state, element).map(|l| l.href.clone()));
        }
        let opened = state.opened.map(|(p, i)| &state.pages[p][i]);
        Ok(match opened.map(|l| &l.apply) {
            Some(FakeApply::External(href)) | Some(FakeApply::AlternateExternal(href)) => {
                href.clone()
            }
            _ => None,
        })
    }

    async fn is_displayed(&self, element: &Element) -> Result<bool, BrowserError> {
        let state = self.state.lock().unwrap();
        Ok(element.id() != "popup-close" || state.popup_visible)
    }

    async fn is_enabled(&self, _element: &Element) -> Result<bool, BrowserError> {
        Ok(true)
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<(), BrowserError> {
        self.state
            .lock()
            .unwrap()
            .events
            .push(format!("scroll:{}", element.id()));
        Ok(())
    }

    async fn click(&self, element: &Element) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        let id = element.id().to_string();
        state.events.push(format!("click:{id}"));

        if let Some(remaining) = state.blocked.get_mut(&id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BrowserError::Blocked(format!("overlay intercepted click on {id}")));
            }
        }

        if let Some(rest) = id.strip_prefix("title:") {
            state.opened = parse_position(rest);
        }
        match id.as_str() {
            "search-submit" => {
                state.page = 0;
                state.opened = None;
            }
            "next" => {
                if state.page + 1 < state.pages.len() {
                    state.page += 1;
                }
                state.opened = None;
            }
            "cookie-reject" => state.cookie_banner = false,
            _ => {}
        }
        Ok(())
    }

    async fn clear(&self, element: &Element) -> Result<(), BrowserError> {
        self.state
            .lock()
            .unwrap()
            .events
            .push(format!("clear:{}", element.id()));
        Ok(())
    }

    async fn send_keys(&self, element: &Element, text: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.events.push(format!("keys:{}:{}", element.id(), text));
        if element.id() == "body" && text == keys::ESCAPE {
            state.popup_visible = false;
        }
        Ok(())
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Element, BrowserError> {
        self.find(locator).await.map_err(|_| BrowserError::Timeout {
            locator: locator.to_string(),
            waited: timeout,
        })
    }
}
