// Adapters layer: concrete implementations of the domain ports.

#[cfg(feature = "chrome")]
pub mod chrome;
pub mod sqlite_store;
pub mod static_page;
