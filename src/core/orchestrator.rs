use crate::core::extractor::PageExtractor;
use crate::core::snapshot::{DropCounts, SnapshotBuilder};
use crate::domain::model::Snapshot;
use crate::domain::ports::{PageDriver, SnapshotSink};
use crate::utils::error::{Result, ScrapeError};
use chrono::NaiveDateTime;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Steps of one scrape run, in the order they execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    NavigatePage,
    DismissConsent,
    ExpandLocationFilter,
    ExtractPairs,
    ParseAndFilter,
    Persist,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::NavigatePage => "navigating to page",
            Stage::DismissConsent => "dismissing consent dialog",
            Stage::ExpandLocationFilter => "expanding location filter",
            Stage::ExtractPairs => "extracting location pairs",
            Stage::ParseAndFilter => "parsing and filtering",
            Stage::Persist => "persisting snapshot",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Where to scrape and how long to wait.
#[derive(Debug, Clone)]
pub struct ScrapeTarget {
    pub url: String,
    pub consent_selector: Option<String>,
    pub filter_selector: Option<String>,
    pub navigation_timeout: Duration,
    pub idle_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub snapshot: Snapshot,
    pub stages: Vec<Stage>,
    pub consent_dismissed: bool,
    pub filter_expanded: bool,
    pub label_nodes: usize,
    pub count_nodes: usize,
    pub dropped: DropCounts,
    /// Rows written, or `None` when the run had no sink.
    pub persisted: Option<usize>,
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Drives one linear scrape run: navigate, best-effort page interactions,
/// extract, build the snapshot and optionally persist it.
///
/// Runs are not serialized here. A scheduler invoking this repeatedly must not
/// start a run before the previous one has returned.
pub struct ScrapeOrchestrator<D: PageDriver> {
    driver: D,
    target: ScrapeTarget,
    extractor: PageExtractor,
    builder: SnapshotBuilder,
    sink: Option<Box<dyn SnapshotSink>>,
    clock: fn() -> NaiveDateTime,
}

impl<D: PageDriver> ScrapeOrchestrator<D> {
    pub fn new(
        driver: D,
        target: ScrapeTarget,
        extractor: PageExtractor,
        builder: SnapshotBuilder,
    ) -> Self {
        Self {
            driver,
            target,
            extractor,
            builder,
            sink: None,
            clock: local_now,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn SnapshotSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub async fn run(&self) -> Result<RunReport> {
        let mut stages = vec![Stage::Start];
        tracing::info!("🚀 Starting scrape of {}", self.target.url);

        self.enter(&mut stages, Stage::NavigatePage);
        self.navigate().await?;

        self.enter(&mut stages, Stage::DismissConsent);
        let consent_dismissed = match &self.target.consent_selector {
            Some(selector) => self.best_effort_click(selector, Stage::DismissConsent).await?,
            None => false,
        };
        if consent_dismissed {
            tracing::info!("✅ Accepted cookies");
        }

        self.enter(&mut stages, Stage::ExpandLocationFilter);
        let filter_expanded = match &self.target.filter_selector {
            Some(selector) => {
                self.best_effort_click(selector, Stage::ExpandLocationFilter)
                    .await?
            }
            None => false,
        };
        if filter_expanded {
            tracing::info!("✅ Expanded location filter");
        }

        self.enter(&mut stages, Stage::ExtractPairs);
        let extraction = self.extractor.extract(&self.driver).await?;
        let captured_at = (self.clock)();

        self.enter(&mut stages, Stage::ParseAndFilter);
        let (snapshot, mut dropped) = self.builder.build(&extraction.entries, captured_at);
        dropped.unpaired = extraction.surplus();
        dropped.unreadable = extraction.unreadable;
        tracing::info!(
            "Built snapshot at {}: {} countries from {} entries ({} dropped)",
            snapshot.timestamp(),
            snapshot.len(),
            extraction.entries.len(),
            dropped.total()
        );

        let persisted = match &self.sink {
            Some(sink) => {
                self.enter(&mut stages, Stage::Persist);
                let rows = sink.append(&snapshot).await?;
                tracing::info!("💾 Persisted {} rows", rows);
                Some(rows)
            }
            None => None,
        };

        self.enter(&mut stages, Stage::Done);
        Ok(RunReport {
            snapshot,
            stages,
            consent_dismissed,
            filter_expanded,
            label_nodes: extraction.label_nodes,
            count_nodes: extraction.count_nodes,
            dropped,
            persisted,
        })
    }

    fn enter(&self, stages: &mut Vec<Stage>, stage: Stage) {
        tracing::debug!("Stage: {}", stage);
        stages.push(stage);
    }

    async fn navigate(&self) -> Result<()> {
        let timeout = self.target.navigation_timeout;
        let result = bounded(
            Stage::NavigatePage,
            timeout,
            self.driver.navigate(&self.target.url, timeout),
        )
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) => match e {
                ScrapeError::NavigationError { .. } | ScrapeError::TimeoutError { .. } => Err(e),
                other => Err(ScrapeError::NavigationError {
                    url: self.target.url.clone(),
                    message: other.to_string(),
                }),
            },
        }
    }

    /// Clicks an optional control and waits for the page to settle.
    ///
    /// Every failure here is recovered by skipping the step: a missing or
    /// unclickable control, or a page that does not settle within the idle
    /// timeout after the click.
    async fn best_effort_click(&self, selector: &str, stage: Stage) -> Result<bool> {
        let handle = match self.driver.find_one(selector).await {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                let skipped = ScrapeError::InteractionNotFound {
                    selector: selector.to_string(),
                };
                tracing::warn!("⚠️ {}; skipping {}", skipped, stage);
                return Ok(false);
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Could not look up '{}': {}; skipping {}",
                    selector,
                    e,
                    stage
                );
                return Ok(false);
            }
        };

        if let Err(e) = self.driver.click(&handle).await {
            tracing::warn!("⚠️ Click on '{}' failed: {}; skipping {}", selector, e, stage);
            return Ok(false);
        }

        let idle = self.target.idle_timeout;
        if let Err(e) = bounded(stage, idle, self.driver.wait_for_network_idle(idle)).await {
            tracing::warn!("⚠️ {}; proceeding without {}", e, stage);
            return Ok(false);
        }
        Ok(true)
    }
}

async fn bounded<T>(
    stage: Stage,
    timeout: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::TimeoutError {
            stage: stage.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::CountryRegistry;
    use crate::domain::model::ElementHandle;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockPage {
        nodes: HashMap<String, Vec<String>>,
        fail_navigation: bool,
        hang_after_click: bool,
        detached: Option<ElementHandle>,
        calls: Mutex<Vec<String>>,
    }

    impl MockPage {
        fn with_nodes(mut self, selector: &str, texts: &[&str]) -> Self {
            self.nodes.insert(
                selector.to_string(),
                texts.iter().map(|s| s.to_string()).collect(),
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl PageDriver for MockPage {
        async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
            self.record(format!("navigate {}", url));
            if self.fail_navigation {
                return Err(ScrapeError::DriverError {
                    message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
                });
            }
            Ok(())
        }

        async fn find_one(&self, selector: &str) -> Result<Option<ElementHandle>> {
            Ok(self
                .nodes
                .get(selector)
                .filter(|texts| !texts.is_empty())
                .map(|_| ElementHandle::new(selector, 0)))
        }

        async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
            let len = self.nodes.get(selector).map(Vec::len).unwrap_or(0);
            Ok((0..len).map(|i| ElementHandle::new(selector, i)).collect())
        }

        async fn click(&self, handle: &ElementHandle) -> Result<()> {
            self.record(format!("click {}", handle.selector()));
            Ok(())
        }

        async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<()> {
            if self.hang_after_click {
                std::future::pending::<()>().await;
            }
            self.record("idle".to_string());
            Ok(())
        }

        async fn text_content(&self, handle: &ElementHandle) -> Result<String> {
            if self.detached.as_ref() == Some(handle) {
                return Err(ScrapeError::DriverError {
                    message: "node is detached from the document".to_string(),
                });
            }
            Ok(self.nodes[handle.selector()][handle.index()].clone())
        }
    }

    #[derive(Clone, Default)]
    struct MockSink {
        appended: Arc<Mutex<Vec<Snapshot>>>,
        fail: bool,
    }

    #[async_trait]
    impl SnapshotSink for MockSink {
        async fn append(&self, snapshot: &Snapshot) -> Result<usize> {
            if self.fail {
                return Err(ScrapeError::PersistenceError(sqlx::Error::PoolClosed));
            }
            self.appended.lock().unwrap().push(snapshot.clone());
            Ok(snapshot.len())
        }
    }

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap()
    }

    fn target() -> ScrapeTarget {
        ScrapeTarget {
            url: "https://careers.example.com/search-results".to_string(),
            consent_selector: Some("#consent".to_string()),
            filter_selector: Some("#filter".to_string()),
            navigation_timeout: Duration::from_millis(500),
            idle_timeout: Duration::from_millis(50),
        }
    }

    fn orchestrator(page: MockPage) -> ScrapeOrchestrator<MockPage> {
        ScrapeOrchestrator::new(
            page,
            target(),
            PageExtractor::new("span.label", "span.count"),
            SnapshotBuilder::new(CountryRegistry::new(["United Kingdom", "Canada"])),
        )
        .with_clock(fixed_clock)
    }

    fn listing_page() -> MockPage {
        MockPage::default()
            .with_nodes("span.label", &["United Kingdom", "Remote", "Canada"])
            .with_nodes("span.count", &["1,204", "300", "58 open roles"])
    }

    #[tokio::test]
    async fn test_full_run_persists_filtered_snapshot() {
        let page = listing_page()
            .with_nodes("#consent", &["Accept"])
            .with_nodes("#filter", &["Location"]);
        let sink = MockSink::default();
        let appended = sink.appended.clone();

        let report = orchestrator(page)
            .with_sink(Box::new(sink))
            .run()
            .await
            .unwrap();

        assert_eq!(
            report.stages,
            vec![
                Stage::Start,
                Stage::NavigatePage,
                Stage::DismissConsent,
                Stage::ExpandLocationFilter,
                Stage::ExtractPairs,
                Stage::ParseAndFilter,
                Stage::Persist,
                Stage::Done,
            ]
        );
        assert!(report.consent_dismissed);
        assert!(report.filter_expanded);
        assert_eq!(report.persisted, Some(2));
        assert_eq!(report.snapshot.get("United Kingdom"), Some(1204));
        assert_eq!(report.snapshot.get("Canada"), Some(58));
        assert_eq!(report.snapshot.get("Remote"), None);
        assert_eq!(report.dropped.not_a_country, 1);

        let appended = appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].timestamp(), "2025-03-01 08:15:00");
    }

    #[tokio::test]
    async fn test_interactions_run_in_order() {
        let page = listing_page()
            .with_nodes("#consent", &["Accept"])
            .with_nodes("#filter", &["Location"]);
        let orchestrator = orchestrator(page);

        orchestrator.run().await.unwrap();

        assert_eq!(
            orchestrator.driver().calls(),
            vec![
                "navigate https://careers.example.com/search-results",
                "click #consent",
                "idle",
                "click #filter",
                "idle",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_controls_are_skipped() {
        let report = orchestrator(listing_page()).run().await.unwrap();

        assert!(!report.consent_dismissed);
        assert!(!report.filter_expanded);
        assert_eq!(report.persisted, None);
        assert!(!report.stages.contains(&Stage::Persist));
        assert_eq!(report.stages.last(), Some(&Stage::Done));
        assert_eq!(report.snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_navigation_failure_aborts_before_persisting() {
        let page = MockPage {
            fail_navigation: true,
            ..listing_page()
        };
        let sink = MockSink::default();
        let appended = sink.appended.clone();

        let err = orchestrator(page)
            .with_sink(Box::new(sink))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::NavigationError { .. }));
        assert!(err.is_fatal());
        assert!(appended.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_persists_empty_snapshot() {
        let sink = MockSink::default();
        let appended = sink.appended.clone();

        let report = orchestrator(MockPage::default())
            .with_sink(Box::new(sink))
            .run()
            .await
            .unwrap();

        assert!(report.snapshot.is_empty());
        assert_eq!(report.persisted, Some(0));
        assert_eq!(appended.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_hung_page_after_click_skips_step_and_completes() {
        let page = MockPage {
            hang_after_click: true,
            ..listing_page().with_nodes("#consent", &["Accept"])
        };
        let sink = MockSink::default();
        let appended = sink.appended.clone();

        let report = orchestrator(page)
            .with_sink(Box::new(sink))
            .run()
            .await
            .unwrap();

        assert!(!report.consent_dismissed);
        assert_eq!(report.stages.last(), Some(&Stage::Done));
        assert_eq!(report.snapshot.get("United Kingdom"), Some(1204));
        assert_eq!(report.snapshot.get("Canada"), Some(58));
        assert_eq!(appended.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_node_drops_only_its_country() {
        let page = MockPage {
            detached: Some(ElementHandle::new("span.count", 0)),
            ..listing_page()
        };
        let sink = MockSink::default();
        let appended = sink.appended.clone();

        let report = orchestrator(page)
            .with_sink(Box::new(sink))
            .run()
            .await
            .unwrap();

        assert_eq!(report.dropped.unreadable, 1);
        assert_eq!(report.dropped.not_a_country, 1);
        assert_eq!(report.snapshot.get("United Kingdom"), None);
        assert_eq!(report.snapshot.get("Canada"), Some(58));
        assert_eq!(report.persisted, Some(1));

        let appended = appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].get("Canada"), Some(58));
    }

    #[tokio::test]
    async fn test_persistence_failure_is_fatal() {
        let sink = MockSink {
            fail: true,
            ..MockSink::default()
        };

        let err = orchestrator(listing_page())
            .with_sink(Box::new(sink))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::PersistenceError(_)));
    }
}
