//! Thin W3C WebDriver client (chromedriver, geckodriver) implementing `Page`.
//!
//! Only the endpoints the scraper needs are wired up. Every request is a JSON
//! round-trip; driver-side failures arrive as `{"value": {"error": ..., "message": ...}}`
//! and are mapped onto `BrowserError` so callers can tell "absent" from "blocked".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{BrowserError, Element, Locator, Page};

/// Key under which W3C drivers return element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4d7ba9ab6a8a";
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// A live browser session on a WebDriver server.
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// Starts a Chrome session with automation flags suppressed.
    pub async fn start(webdriver_url: &str) -> Result<Self, BrowserError> {
        let client = Client::builder().timeout(COMMAND_TIMEOUT).build()?;
        let base_url = webdriver_url.trim_end_matches('/').to_string();

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": ["--disable-blink-features=AutomationControlled"],
                        "detach": true
                    }
                }
            }
        });

        let response = client
            .post(format!("{base_url}/session"))
            .json(&capabilities)
            .send()
            .await?;
        let value = unwrap_response(response).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Protocol {
                code: "session not created".to_string(),
                message: format!("missing sessionId in {value}"),
            })?
            .to_string();

        info!("WebDriver session {session_id} started at {base_url}");

        Ok(Self {
            client,
            base_url,
            session_id,
        })
    }

    /// Ends the session. The browser window closes unless the driver was told to detach.
    pub async fn close(self) -> Result<(), BrowserError> {
        self.command(Method::DELETE, "", None).await?;
        info!("WebDriver session {} closed", self.session_id);
        Ok(())
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        unwrap_response(response).await
    }

    async fn locate(
        &self,
        path: &str,
        locator: &Locator,
    ) -> Result<Element, BrowserError> {
        let value = self
            .command(Method::POST, path, Some(locator_body(locator)))
            .await
            .map_err(|e| match e {
                BrowserError::NotFound { .. } => BrowserError::not_found(locator),
                other => other,
            })?;
        element_from_value(&value).ok_or_else(|| BrowserError::not_found(locator))
    }
}

#[async_trait]
impl Page for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        debug!("navigate {url}");
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "/url", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn find(&self, locator: &Locator) -> Result<Element, BrowserError> {
        self.locate("/element", locator).await
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>, BrowserError> {
        let value = self
            .command(Method::POST, "/elements", Some(locator_body(locator)))
            .await?;
        Ok(value
            .as_array()
            .map(|items| items.iter().filter_map(element_from_value).collect())
            .unwrap_or_default())
    }

    async fn find_in(
        &self,
        parent: &Element,
        locator: &Locator,
    ) -> Result<Element, BrowserError> {
        self.locate(&format!("/element/{}/element", parent.id()), locator)
            .await
    }

    async fn text(&self, element: &Element) -> Result<String, BrowserError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.id()), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(
        &self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        // Properties give resolved values (absolute hrefs); fall back to the raw attribute.
        for kind in ["property", "attribute"] {
            let value = self
                .command(
                    Method::GET,
                    &format!("/element/{}/{kind}/{name}", element.id()),
                    None,
                )
                .await?;
            if let Some(s) = value.as_str() {
                return Ok(Some(s.to_string()));
            }
        }
        Ok(None)
    }

    async fn is_displayed(&self, element: &Element) -> Result<bool, BrowserError> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/displayed", element.id()),
                None,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &Element) -> Result<bool, BrowserError> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/enabled", element.id()),
                None,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<(), BrowserError> {
        let body = json!({
            "script": "arguments[0].scrollIntoView({block: 'center'});",
            "args": [{ ELEMENT_KEY: element.id() }]
        });
        self.command(Method::POST, "/execute/sync", Some(body))
            .await
            .map(|_| ())
    }

    async fn click(&self, element: &Element) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &format!("/element/{}/click", element.id()),
            Some(json!({})),
        )
        .await
        .map(|_| ())
    }

    async fn clear(&self, element: &Element) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &format!("/element/{}/clear", element.id()),
            Some(json!({})),
        )
        .await
        .map(|_| ())
    }

    async fn send_keys(&self, element: &Element, text: &str) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &format!("/element/{}/value", element.id()),
            Some(json!({ "text": text })),
        )
        .await
        .map(|_| ())
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Element, BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.find(locator).await {
                Ok(element) => return Ok(element),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    locator: locator.to_string(),
                    waited: timeout,
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }
}

/// Reads a driver response, turning W3C error payloads into `BrowserError`.
async fn unwrap_response(response: reqwest::Response) -> Result<Value, BrowserError> {
    let status = response.status();
    let body: WireResponse = response.json().await?;

    if status.is_success() {
        return Ok(body.value);
    }

    match serde_json::from_value::<WireError>(body.value.clone()) {
        Ok(err) => Err(map_wire_error(err)),
        Err(_) => Err(BrowserError::Protocol {
            code: status.as_u16().to_string(),
            message: body.value.to_string(),
        }),
    }
}

fn map_wire_error(err: WireError) -> BrowserError {
    match err.error.as_str() {
        "no such element" => BrowserError::NotFound {
            locator: err.message,
        },
        "element click intercepted" | "move target out of bounds" | "element not interactable" => {
            BrowserError::Blocked(err.message)
        }
        "stale element reference" => BrowserError::Stale(err.message),
        "timeout" | "script timeout" => BrowserError::Timeout {
            locator: err.message,
            waited: Duration::ZERO,
        },
        _ => BrowserError::Protocol {
            code: err.error,
            message: err.message,
        },
    }
}

fn locator_body(locator: &Locator) -> Value {
    let (using, value) = match locator {
        Locator::Css(s) => ("css selector", s.clone()),
        Locator::XPath(s) => ("xpath", s.clone()),
        Locator::Id(s) => ("css selector", format!("[id=\"{s}\"]")),
        Locator::Name(s) => ("css selector", format!("[name=\"{s}\"]")),
        Locator::Tag(s) => ("tag name", s.clone()),
    };
    json!({ "using": using, "value": value })
}

fn element_from_value(value: &Value) -> Option<Element> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(Element::new)
}
