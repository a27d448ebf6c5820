use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type CountryName = String;
pub type JobCount = u32;

/// Format of the persisted `timestamp` column, local capture time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One (label, count text) pair read off the page, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLocationEntry {
    pub label: String,
    pub raw_count: String,
}

impl RawLocationEntry {
    pub fn new(label: impl Into<String>, raw_count: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            raw_count: raw_count.into(),
        }
    }
}

/// Opaque reference to a DOM node: the selector it was found with and its
/// position in document order among that selector's matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    selector: String,
    index: usize,
}

impl ElementHandle {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// A single timestamped capture of country -> job count.
///
/// The capture time is truncated to whole seconds so every row written from
/// one snapshot carries the identical `timestamp` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    captured_at: NaiveDateTime,
    counts: BTreeMap<CountryName, JobCount>,
}

impl Snapshot {
    pub fn new(captured_at: NaiveDateTime, counts: BTreeMap<CountryName, JobCount>) -> Self {
        let captured_at = captured_at.with_nanosecond(0).unwrap_or(captured_at);
        Self {
            captured_at,
            counts,
        }
    }

    pub fn captured_at(&self) -> NaiveDateTime {
        self.captured_at
    }

    pub fn timestamp(&self) -> String {
        self.captured_at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn counts(&self) -> &BTreeMap<CountryName, JobCount> {
        &self.counts
    }

    pub fn get(&self, country: &str) -> Option<JobCount> {
        self.counts.get(country).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// A persisted `job_counts` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: i64,
    pub country: CountryName,
    pub job_count: JobCount,
    pub timestamp: String,
}
