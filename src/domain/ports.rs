use crate::domain::model::{ElementHandle, Snapshot, StoredRow};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Browser capability: a loaded page that can be queried and clicked.
///
/// This is the whole vocabulary the scraper uses. Anything richer (script
/// evaluation, request interception) stays inside the adapter.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    async fn find_one(&self, selector: &str) -> Result<Option<ElementHandle>>;

    /// Matches in document order.
    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    async fn click(&self, handle: &ElementHandle) -> Result<()>;

    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()>;

    async fn text_content(&self, handle: &ElementHandle) -> Result<String>;
}

/// Append side of the snapshot store.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Writes every row of `snapshot` or none of them. Returns rows written.
    async fn append(&self, snapshot: &Snapshot) -> Result<usize>;
}

/// Read side consumed by the query layer.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Most recent rows across all countries, newest first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<StoredRow>>;

    async fn latest_for_country(&self, country: &str) -> Result<Option<StoredRow>>;
}
