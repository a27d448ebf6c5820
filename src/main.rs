use clap::Parser;
use jobcount_scraper::api::{self, JobEntry, JobsResponse};
use jobcount_scraper::config::Command;
use jobcount_scraper::domain::ports::{PageDriver, SnapshotSource};
use jobcount_scraper::utils::error::ErrorSeverity;
use jobcount_scraper::utils::logger::{self, LogFormat};
use jobcount_scraper::utils::validation::Validate;
use jobcount_scraper::{
    CliConfig, Result, ScrapeConfig, ScrapeOrchestrator, SnapshotBuilder, SqliteSnapshotStore,
    StaticHtmlPage,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_logger(LogFormat::from_json_flag(cli.json_logs), cli.verbose);

    tracing::info!("Starting jobcount-scraper");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli.command, &config).await {
        tracing::error!(
            "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(command: &Command, config: &ScrapeConfig) -> Result<()> {
    match command {
        Command::Scrape { chrome: true, .. } => scrape_with_chrome(config).await,
        Command::Scrape { .. } => scrape(StaticHtmlPage::new(), config).await,
        Command::Recent { limit } => {
            let store = SqliteSnapshotStore::open(&config.store.database_url).await?;
            let rows = store
                .list_recent(limit.unwrap_or(config.api.default_limit))
                .await?;
            let response = JobsResponse {
                jobs: rows.into_iter().map(JobEntry::from).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Latest { country } => {
            let store = SqliteSnapshotStore::open(&config.store.database_url).await?;
            match store.latest_for_country(country).await? {
                Some(row) => println!("{}", serde_json::to_string_pretty(&JobEntry::from(row))?),
                None => println!("No data found for {}", country),
            }
            Ok(())
        }
        Command::Serve { .. } => {
            let store = SqliteSnapshotStore::open(&config.store.database_url).await?;
            api::serve(Arc::new(store), &config.api).await
        }
    }
}

async fn scrape<D: PageDriver>(driver: D, config: &ScrapeConfig) -> Result<()> {
    let mut orchestrator = ScrapeOrchestrator::new(
        driver,
        config.target(),
        config.extractor(),
        SnapshotBuilder::new(config.registry()),
    );

    if config.store.persist {
        let store = SqliteSnapshotStore::open(&config.store.database_url).await?;
        orchestrator = orchestrator.with_sink(Box::new(store));
    } else {
        tracing::info!("Persistence disabled; snapshot will only be printed");
    }

    let report = orchestrator.run().await?;

    println!("{}", serde_json::to_string_pretty(report.snapshot.counts())?);
    if let Some(rows) = report.persisted {
        println!(
            "✅ Stored {} rows at {} in {}",
            rows,
            report.snapshot.timestamp(),
            config.store.database_url
        );
    }
    if report.dropped.total() > 0 {
        tracing::info!(
            "Dropped entries: {} unparsable, {} non-country, {} unpaired, {} unreadable",
            report.dropped.unparsable,
            report.dropped.not_a_country,
            report.dropped.unpaired,
            report.dropped.unreadable
        );
    }

    Ok(())
}

#[cfg(feature = "chrome")]
async fn scrape_with_chrome(config: &ScrapeConfig) -> Result<()> {
    let driver = jobcount_scraper::ChromePage::launch(config.source.headless)?
        .with_lookup_timeout(config.lookup_timeout());
    scrape(driver, config).await
}

#[cfg(not(feature = "chrome"))]
async fn scrape_with_chrome(_config: &ScrapeConfig) -> Result<()> {
    Err(jobcount_scraper::ScrapeError::ConfigError {
        message: "--chrome requires building with the `chrome` feature".to_string(),
    })
}
