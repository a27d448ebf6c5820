use crate::core::count_parser::parse_count;
use crate::core::registry::CountryRegistry;
use crate::domain::model::{RawLocationEntry, Snapshot};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

/// Entries left out of a snapshot, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub unparsable: usize,
    pub not_a_country: usize,
    pub unpaired: usize,
    pub unreadable: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.unparsable + self.not_a_country + self.unpaired + self.unreadable
    }
}

/// Joins parsed counts with the country allow-list.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    registry: CountryRegistry,
}

impl SnapshotBuilder {
    pub fn new(registry: CountryRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CountryRegistry {
        &self.registry
    }

    /// Builds one snapshot stamped `captured_at`.
    ///
    /// Entries whose count text has no digits are dropped. Labels that are not
    /// registry members (regions, cities, "Remote") are dropped. A country seen
    /// twice keeps its last count.
    pub fn build(
        &self,
        entries: &[RawLocationEntry],
        captured_at: NaiveDateTime,
    ) -> (Snapshot, DropCounts) {
        let mut counts = BTreeMap::new();
        let mut dropped = DropCounts::default();

        for entry in entries {
            let count = match parse_count(&entry.raw_count) {
                Ok(count) => count,
                Err(e) => {
                    tracing::warn!("⚠️ Dropping '{}': {}", entry.label, e);
                    dropped.unparsable += 1;
                    continue;
                }
            };

            if !self.registry.contains(&entry.label) {
                tracing::debug!("Skipping non-country label '{}'", entry.label);
                dropped.not_a_country += 1;
                continue;
            }

            if let Some(previous) = counts.insert(entry.label.clone(), count) {
                tracing::debug!(
                    "Duplicate label '{}': {} replaced by {}",
                    entry.label,
                    previous,
                    count
                );
            }
        }

        (Snapshot::new(captured_at, counts), dropped)
    }
}
