use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::model::ElementHandle;
use crate::domain::ports::PageDriver;
use crate::utils::error::{Result, ScrapeError};

/// `PageDriver` over server-rendered HTML.
///
/// The document is fetched once on `navigate` and queried with CSS selectors.
/// No script runs, so `click` and `wait_for_network_idle` do nothing; use the
/// `chrome` driver for pages that build their listing client-side.
pub struct StaticHtmlPage {
    client: Client,
    page: Mutex<Option<LoadedPage>>,
}

/// A fetched body plus the node texts of every selector queried against it.
struct LoadedPage {
    body: String,
    selections: HashMap<String, Vec<String>>,
    parse_passes: usize,
}

impl LoadedPage {
    fn new(body: String) -> Self {
        Self {
            body,
            selections: HashMap::new(),
            parse_passes: 0,
        }
    }

    fn select(&mut self, selector: &str) -> Result<&[String]> {
        if !self.selections.contains_key(selector) {
            let parsed = parse_selector(selector)?;
            let html = Html::parse_document(&self.body);
            self.parse_passes += 1;
            let texts = html
                .select(&parsed)
                .map(|element| normalize_whitespace(&element.text().collect::<String>()))
                .collect();
            self.selections.insert(selector.to_string(), texts);
        }
        Ok(self
            .selections
            .get(selector)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}

impl StaticHtmlPage {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            page: Mutex::new(None),
        }
    }

    /// Driver with `html` already loaded.
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            page: Mutex::new(Some(LoadedPage::new(html.into()))),
        }
    }

    /// Runs `f` over the texts `selector` matches, in document order. The
    /// document is parsed at most once per selector per loaded page.
    fn with_selection<R>(&self, selector: &str, f: impl FnOnce(&[String]) -> R) -> Result<R> {
        let mut guard = self.page.lock().map_err(|_| ScrapeError::DriverError {
            message: "document lock poisoned".to_string(),
        })?;
        let page = guard.as_mut().ok_or_else(|| ScrapeError::DriverError {
            message: "no page loaded; call navigate first".to_string(),
        })?;
        Ok(f(page.select(selector)?))
    }
}

impl Default for StaticHtmlPage {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::SelectorError {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl PageDriver for StaticHtmlPage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        tracing::debug!("GET {}", url);
        let navigation_error = |message: String| ScrapeError::NavigationError {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;
        tracing::debug!("Loaded {} bytes", body.len());

        let mut guard = self.page.lock().map_err(|_| ScrapeError::DriverError {
            message: "document lock poisoned".to_string(),
        })?;
        *guard = Some(LoadedPage::new(body));
        Ok(())
    }

    async fn find_one(&self, selector: &str) -> Result<Option<ElementHandle>> {
        let found = self.with_selection(selector, |texts| !texts.is_empty())?;
        Ok(found.then(|| ElementHandle::new(selector, 0)))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let count = self.with_selection(selector, <[String]>::len)?;
        Ok((0..count).map(|i| ElementHandle::new(selector, i)).collect())
    }

    async fn click(&self, handle: &ElementHandle) -> Result<()> {
        tracing::debug!("Static page: click on '{}' has no effect", handle.selector());
        Ok(())
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn text_content(&self, handle: &ElementHandle) -> Result<String> {
        let text = self.with_selection(handle.selector(), |texts| {
            texts.get(handle.index()).cloned()
        })?;

        text.ok_or_else(|| ScrapeError::DriverError {
                message: format!(
                    "stale handle: '{}' has no match at index {}",
                    handle.selector(),
                    handle.index()
                ),
            })
    }
}
