pub mod count_parser;
pub mod extractor;
pub mod orchestrator;
pub mod registry;
pub mod snapshot;

pub use crate::domain::model::{RawLocationEntry, Snapshot, StoredRow};
pub use crate::domain::ports::{PageDriver, SnapshotSink, SnapshotSource};
pub use crate::utils::error::Result;
