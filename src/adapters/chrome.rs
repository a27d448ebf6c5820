use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::model::ElementHandle;
use crate::domain::ports::PageDriver;
use crate::utils::error::{Result, ScrapeError};

fn driver_error(e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::DriverError {
        message: e.to_string(),
    }
}

/// `PageDriver` backed by a headless Chrome tab.
///
/// `headless_chrome` is blocking, so every call runs on the blocking pool.
/// Handles are re-resolved by (selector, index) on each use.
///
/// The tab's default timeout is sticky. Navigation and idle waits raise it for
/// their own call and put it back to the lookup timeout, so a missing optional
/// control costs at most `lookup_timeout`.
pub struct ChromePage {
    _browser: Browser,
    tab: Arc<Tab>,
    lookup_timeout: Duration,
}

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

impl ChromePage {
    pub fn launch(headless: bool) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .build()
            .map_err(driver_error)?;
        let browser = Browser::new(options).map_err(driver_error)?;
        let tab = browser.new_tab().map_err(driver_error)?;
        tab.set_default_timeout(DEFAULT_LOOKUP_TIMEOUT);
        Ok(Self {
            _browser: browser,
            tab,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        })
    }

    /// Bounds element lookups, clicks and text reads.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.tab.set_default_timeout(timeout);
        self.lookup_timeout = timeout;
        self
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Tab>) -> anyhow::Result<T> + Send + 'static,
    {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || f(tab))
            .await
            .map_err(driver_error)?
            .map_err(driver_error)
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let target = url.to_string();
        let lookup = self.lookup_timeout;
        self.blocking(move |tab| {
            tab.set_default_timeout(timeout);
            let navigated = tab
                .navigate_to(&target)
                .and_then(|tab| tab.wait_until_navigated().map(|_| ()));
            tab.set_default_timeout(lookup);
            navigated
        })
        .await
        .map_err(|e| ScrapeError::NavigationError {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn find_one(&self, selector: &str) -> Result<Option<ElementHandle>> {
        let query = selector.to_string();
        let found = self
            .blocking(move |tab| Ok(tab.find_element(&query).is_ok()))
            .await?;
        Ok(found.then(|| ElementHandle::new(selector, 0)))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let query = selector.to_string();
        let count = self
            .blocking(move |tab| match tab.find_elements(&query) {
                Ok(elements) => Ok(elements.len()),
                Err(e) => {
                    tracing::debug!("No elements for '{}': {}", query, e);
                    Ok(0)
                }
            })
            .await?;
        Ok((0..count).map(|i| ElementHandle::new(selector, i)).collect())
    }

    async fn click(&self, handle: &ElementHandle) -> Result<()> {
        let handle = handle.clone();
        self.blocking(move |tab| {
            let elements = tab.find_elements(handle.selector())?;
            let element = elements
                .get(handle.index())
                .ok_or_else(|| anyhow::anyhow!("stale handle for '{}'", handle.selector()))?;
            element.click()?;
            Ok(())
        })
        .await
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
        let lookup = self.lookup_timeout;
        self.blocking(move |tab| {
            tab.set_default_timeout(timeout);
            let settled = tab.wait_until_navigated().map(|_| ());
            tab.set_default_timeout(lookup);
            settled
        })
        .await
    }

    async fn text_content(&self, handle: &ElementHandle) -> Result<String> {
        let handle = handle.clone();
        self.blocking(move |tab| {
            let elements = tab.find_elements(handle.selector())?;
            let element = elements
                .get(handle.index())
                .ok_or_else(|| anyhow::anyhow!("stale handle for '{}'", handle.selector()))?;
            element.get_inner_text()
        })
        .await
    }
}
