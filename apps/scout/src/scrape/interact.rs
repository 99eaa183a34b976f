//! Best-effort UI interactions: popup dismissal, intercepted-click retries, paced typing.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::browser::{keys, try_find, BrowserError, Element, Page};
use crate::pacing::Pacer;
use crate::scrape::selectors::BoardSelectors;

/// Attempts per click before the target is given up on.
pub const CLICK_ATTEMPTS: u32 = 3;

const COOKIE_BANNER_WAIT: Duration = Duration::from_secs(10);

/// Closes a modal overlay if a visible close control is on the page.
///
/// Sends ESCAPE then ENTER to the page body. Returns whether a popup was found.
pub async fn dismiss_popups<P: Page + ?Sized>(
    page: &P,
    selectors: &BoardSelectors,
    pacer: &Pacer,
) -> Result<bool, BrowserError> {
    let Some(close) = try_find(page, &selectors.popup_close).await? else {
        return Ok(false);
    };
    if !page.is_displayed(&close).await? {
        return Ok(false);
    }

    let body = page.find(&selectors.page_body).await?;
    page.send_keys(&body, keys::ESCAPE).await?;
    pacer.dismiss_key().await;
    page.send_keys(&body, keys::ENTER).await?;
    info!("Popup closed");
    Ok(true)
}

/// Same as `dismiss_popups`, but failures are only logged.
pub async fn dismiss_popups_quietly<P: Page + ?Sized>(
    page: &P,
    selectors: &BoardSelectors,
    pacer: &Pacer,
) {
    if let Err(e) = dismiss_popups(page, selectors, pacer).await {
        debug!("Popup dismissal failed: {e}");
    }
}

/// Scrolls `element` into view and clicks it, dismissing popups between blocked attempts.
///
/// `Ok(false)` means every attempt was intercepted. Errors other than `Blocked`
/// propagate immediately.
pub async fn click_with_retry<P: Page + ?Sized>(
    page: &P,
    element: &Element,
    selectors: &BoardSelectors,
    pacer: &Pacer,
) -> Result<bool, BrowserError> {
    for attempt in 1..=CLICK_ATTEMPTS {
        let outcome = match page.scroll_into_view(element).await {
            Ok(()) => page.click(element).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => return Ok(true),
            Err(e) if e.is_blocked() => {
                warn!("Click attempt {attempt}/{CLICK_ATTEMPTS} blocked: {e}");
                dismiss_popups_quietly(page, selectors, pacer).await;
                pacer.click_retry().await;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

/// Sends `text` one character at a time with keystroke pacing.
pub async fn type_like_human<P: Page + ?Sized>(
    page: &P,
    element: &Element,
    text: &str,
    pacer: &Pacer,
) -> Result<(), BrowserError> {
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        page.send_keys(element, ch.encode_utf8(&mut buf)).await?;
        pacer.keystroke().await;
    }
    Ok(())
}

/// Clicks the cookie banner's "reject all" control if it shows up. Never fails.
pub async fn reject_cookies<P: Page + ?Sized>(page: &P, selectors: &BoardSelectors) {
    let result = async {
        let button = page
            .wait_for(&selectors.cookie_reject, COOKIE_BANNER_WAIT)
            .await?;
        if page.is_displayed(&button).await? && page.is_enabled(&button).await? {
            page.click(&button).await?;
            return Ok(true);
        }
        Ok::<bool, BrowserError>(false)
    }
    .await;

    match result {
        Ok(true) => info!("Clicked 'Reject All' on the cookie banner"),
        Ok(false) => debug!("Cookie banner present but not clickable"),
        Err(e) => debug!("No cookie banner handled: {e}"),
    }
}
