pub mod toml_config;

pub use toml_config::ScrapeConfig;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "jobcount-scraper")]
#[command(about = "Scrapes per-country job-opening counts into SQLite")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override store.database_url
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run one scrape and store the snapshot
    Scrape {
        /// Print the snapshot without writing it
        #[arg(long)]
        no_persist: bool,

        /// Override source.url
        #[arg(long)]
        url: Option<String>,

        /// Drive a headless Chrome instead of fetching static HTML
        #[arg(long)]
        chrome: bool,
    },
    /// Show the most recent stored rows
    Recent {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show the latest stored row for one country
    Latest { country: String },
    /// Serve the read-only query API
    Serve {
        /// Override api.bind
        #[arg(long)]
        bind: Option<String>,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn load_config(&self) -> crate::utils::error::Result<ScrapeConfig> {
        let mut config = match &self.config {
            Some(path) => ScrapeConfig::from_file(path)?,
            None => ScrapeConfig::default(),
        };

        if let Some(database_url) = &self.database_url {
            config.store.database_url = database_url.clone();
        }

        match &self.command {
            Command::Scrape {
                no_persist, url, ..
            } => {
                if *no_persist {
                    config.store.persist = false;
                }
                if let Some(url) = url {
                    config.source.url = url.clone();
                }
            }
            Command::Serve { bind: Some(bind) } => config.api.bind = bind.clone(),
            _ => {}
        }

        Ok(config)
    }
}
