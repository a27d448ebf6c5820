use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Navigation to {url} failed: {message}")]
    NavigationError { url: String, message: String },

    #[error("Timed out after {timeout_ms}ms while {stage}")]
    TimeoutError { stage: String, timeout_ms: u64 },

    #[error("Page control not found: {selector}")]
    InteractionNotFound { selector: String },

    #[error("No nodes matched selector '{selector}'")]
    SelectorEmpty { selector: String },

    #[error("Invalid selector '{selector}': {reason}")]
    SelectorError { selector: String, reason: String },

    #[error("No job count in '{text}'")]
    CountParseError { text: String },

    #[error("Browser driver error: {message}")]
    DriverError { message: String },

    #[error("Persistence error: {0}")]
    PersistenceError(#[from] sqlx::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Navigation,
    Interaction,
    Extraction,
    Parsing,
    Persistence,
    Configuration,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScrapeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScrapeError::NavigationError { .. }
            | ScrapeError::TimeoutError { .. }
            | ScrapeError::HttpError(_)
            | ScrapeError::DriverError { .. } => ErrorCategory::Navigation,
            ScrapeError::InteractionNotFound { .. } => ErrorCategory::Interaction,
            ScrapeError::SelectorEmpty { .. } | ScrapeError::SelectorError { .. } => {
                ErrorCategory::Extraction
            }
            ScrapeError::CountParseError { .. } => ErrorCategory::Parsing,
            ScrapeError::PersistenceError(_) => ErrorCategory::Persistence,
            ScrapeError::ConfigError { .. } | ScrapeError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            ScrapeError::IoError(_) | ScrapeError::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ScrapeError::InteractionNotFound { .. }
            | ScrapeError::SelectorEmpty { .. }
            | ScrapeError::CountParseError { .. } => ErrorSeverity::Low,
            ScrapeError::NavigationError { .. }
            | ScrapeError::TimeoutError { .. }
            | ScrapeError::HttpError(_) => ErrorSeverity::Medium,
            ScrapeError::SelectorError { .. }
            | ScrapeError::DriverError { .. }
            | ScrapeError::ConfigError { .. }
            | ScrapeError::InvalidConfigValueError { .. }
            | ScrapeError::SerializationError(_) => ErrorSeverity::High,
            ScrapeError::PersistenceError(_) | ScrapeError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Whether this error aborts a scrape run. Interaction, selector and count
    /// failures degrade the run instead.
    pub fn is_fatal(&self) -> bool {
        self.severity() > ErrorSeverity::Low
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Navigation => {
                "Check network access to the careers portal and re-run; increase navigation_timeout_ms if the page is slow"
            }
            ErrorCategory::Interaction => "No action needed; the optional page control was skipped",
            ErrorCategory::Extraction => {
                "Verify the label/count selectors in the [selectors] section still match the page"
            }
            ErrorCategory::Parsing => "Inspect the raw count text on the page; the entry was dropped",
            ErrorCategory::Persistence => {
                "Check that the database file is writable and not locked by another writer"
            }
            ErrorCategory::Configuration => "Fix the configuration file or command line arguments",
            ErrorCategory::Io => "Check file paths and permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Navigation => format!("Could not load the careers page: {}", self),
            ErrorCategory::Persistence => format!("Could not save the snapshot: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
