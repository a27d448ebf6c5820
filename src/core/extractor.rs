use crate::domain::model::RawLocationEntry;
use crate::domain::ports::PageDriver;
use crate::utils::error::{Result, ScrapeError};

/// Result of one extraction pass over a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub entries: Vec<RawLocationEntry>,
    pub label_nodes: usize,
    pub count_nodes: usize,
    /// Pairs skipped because a node's text could not be read.
    pub unreadable: usize,
}

impl Extraction {
    /// Either selector matched nothing.
    pub fn is_selector_empty(&self) -> bool {
        self.label_nodes == 0 || self.count_nodes == 0
    }

    /// Nodes on the longer side that had no partner.
    pub fn surplus(&self) -> usize {
        self.label_nodes.abs_diff(self.count_nodes)
    }
}

/// Pairs location-label nodes with count nodes by position.
///
/// The page is trusted to list both node sets in the same order. When the
/// sets differ in length, pairing stops at the shorter one and the surplus
/// nodes are dropped; a mismatch is logged but never corrected.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    label_selector: String,
    count_selector: String,
}

impl PageExtractor {
    pub fn new(label_selector: impl Into<String>, count_selector: impl Into<String>) -> Self {
        Self {
            label_selector: label_selector.into(),
            count_selector: count_selector.into(),
        }
    }

    pub fn label_selector(&self) -> &str {
        &self.label_selector
    }

    pub fn count_selector(&self) -> &str {
        &self.count_selector
    }

    pub async fn extract<D: PageDriver + ?Sized>(&self, driver: &D) -> Result<Extraction> {
        let labels = driver.find_all(&self.label_selector).await?;
        let counts = driver.find_all(&self.count_selector).await?;

        let mut extraction = Extraction {
            entries: Vec::new(),
            label_nodes: labels.len(),
            count_nodes: counts.len(),
            unreadable: 0,
        };

        if extraction.is_selector_empty() {
            let selector = if labels.is_empty() {
                &self.label_selector
            } else {
                &self.count_selector
            };
            let degraded = ScrapeError::SelectorEmpty {
                selector: selector.clone(),
            };
            tracing::warn!(
                "⚠️ {} (labels: {}, counts: {}); continuing with no entries",
                degraded,
                labels.len(),
                counts.len()
            );
            return Ok(extraction);
        }

        if labels.len() != counts.len() {
            tracing::warn!(
                "⚠️ Label/count node mismatch: {} labels vs {} counts; pairing the first {}",
                labels.len(),
                counts.len(),
                labels.len().min(counts.len())
            );
        }

        for (label, count) in labels.iter().zip(counts.iter()) {
            let texts = match driver.text_content(label).await {
                Ok(label_text) => driver
                    .text_content(count)
                    .await
                    .map(|count_text| (label_text, count_text)),
                Err(e) => Err(e),
            };

            match texts {
                Ok((label_text, count_text)) => extraction
                    .entries
                    .push(RawLocationEntry::new(label_text.trim(), count_text.trim())),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Skipping pair #{}: could not read node text: {}",
                        label.index(),
                        e
                    );
                    extraction.unreadable += 1;
                }
            }
        }

        tracing::debug!("Extracted {} location entries", extraction.entries.len());
        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ElementHandle;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Fixed page: selector -> texts in document order.
    struct FixedPage {
        nodes: HashMap<String, Vec<String>>,
        detached: Option<ElementHandle>,
    }

    impl FixedPage {
        fn new(labels: &[&str], counts: &[&str]) -> Self {
            let mut nodes = HashMap::new();
            nodes.insert(
                "label".to_string(),
                labels.iter().map(|s| s.to_string()).collect(),
            );
            nodes.insert(
                "count".to_string(),
                counts.iter().map(|s| s.to_string()).collect(),
            );
            Self {
                nodes,
                detached: None,
            }
        }
    }

    #[async_trait]
    impl PageDriver for FixedPage {
        async fn navigate(&self, _url: &str, _timeout: Duration) -> Result<()> {
            Ok(())
        }

        async fn find_one(&self, selector: &str) -> Result<Option<ElementHandle>> {
            Ok(self.find_all(selector).await?.into_iter().next())
        }

        async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
            let len = self.nodes.get(selector).map(Vec::len).unwrap_or(0);
            Ok((0..len).map(|i| ElementHandle::new(selector, i)).collect())
        }

        async fn click(&self, _handle: &ElementHandle) -> Result<()> {
            Ok(())
        }

        async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<()> {
            Ok(())
        }

        async fn text_content(&self, handle: &ElementHandle) -> Result<String> {
            if self.detached.as_ref() == Some(handle) {
                return Err(ScrapeError::DriverError {
                    message: "node detached".to_string(),
                });
            }
            Ok(self.nodes[handle.selector()][handle.index()].clone())
        }
    }

    #[tokio::test]
    async fn test_pairs_by_position_and_trims() {
        let page = FixedPage::new(&[" France ", "Europe"], &["10 jobs\n", " 500"]);
        let extraction = PageExtractor::new("label", "count")
            .extract(&page)
            .await
            .unwrap();

        assert_eq!(
            extraction.entries,
            vec![
                RawLocationEntry::new("France", "10 jobs"),
                RawLocationEntry::new("Europe", "500"),
            ]
        );
        assert_eq!(extraction.surplus(), 0);
        assert!(!extraction.is_selector_empty());
    }

    #[tokio::test]
    async fn test_length_mismatch_truncates_to_shorter() {
        let page = FixedPage::new(&["France", "Germany", "Spain"], &["10", "7"]);
        let extraction = PageExtractor::new("label", "count")
            .extract(&page)
            .await
            .unwrap();

        assert_eq!(extraction.entries.len(), 2);
        assert_eq!(extraction.entries[1], RawLocationEntry::new("Germany", "7"));
        assert_eq!(extraction.surplus(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_node_skips_only_its_pair() {
        let mut page = FixedPage::new(&["France", "Germany", "Spain"], &["10", "7", "3"]);
        page.detached = Some(ElementHandle::new("count", 1));

        let extraction = PageExtractor::new("label", "count")
            .extract(&page)
            .await
            .unwrap();

        assert_eq!(
            extraction.entries,
            vec![
                RawLocationEntry::new("France", "10"),
                RawLocationEntry::new("Spain", "3"),
            ]
        );
        assert_eq!(extraction.unreadable, 1);
    }

    #[tokio::test]
    async fn test_empty_selector_is_degraded_not_fatal() {
        let page = FixedPage::new(&["France"], &[]);
        let extraction = PageExtractor::new("label", "count")
            .extract(&page)
            .await
            .unwrap();

        assert!(extraction.is_selector_empty());
        assert!(extraction.entries.is_empty());
        assert_eq!(extraction.label_nodes, 1);
        assert_eq!(extraction.count_nodes, 0);
    }
}
