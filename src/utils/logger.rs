use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output shape of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single lines for interactive runs.
    Compact,
    /// JSON lines for unattended runs driven by an external scheduler.
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

/// Directive used when `RUST_LOG` is unset. Verbose runs see this crate's
/// debug stage transitions; dependencies stay at info.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "jobcount_scraper=debug,info"
    } else {
        "jobcount_scraper=info,warn"
    }
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Installs the global subscriber. A second call keeps the first subscriber.
pub fn init_logger(format: LogFormat, verbose: bool) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);
    let registry = tracing_subscriber::registry().with(filter(verbose));

    let installed = match format {
        LogFormat::Compact => registry.with(fmt_layer.compact()).try_init(),
        LogFormat::Json => registry.with(fmt_layer.json()).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Logger already installed; keeping it");
    }
}
