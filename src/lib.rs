pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ScrapeConfig;

#[cfg(feature = "chrome")]
pub use adapters::chrome::ChromePage;
pub use adapters::{sqlite_store::SqliteSnapshotStore, static_page::StaticHtmlPage};
pub use crate::core::{
    count_parser::parse_count,
    extractor::PageExtractor,
    orchestrator::{RunReport, ScrapeOrchestrator, ScrapeTarget, Stage},
    registry::CountryRegistry,
    snapshot::SnapshotBuilder,
};
pub use utils::error::{Result, ScrapeError};
