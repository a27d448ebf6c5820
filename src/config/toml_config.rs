use crate::core::extractor::PageExtractor;
use crate::core::orchestrator::ScrapeTarget;
use crate::core::registry::CountryRegistry;
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_URL: &str = "https://careers.mastercard.com/us/en/search-results";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://mastercard_jobs.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub source: SourceConfig,
    pub selectors: SelectorConfig,
    pub store: StoreConfig,
    pub registry: RegistryConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub navigation_timeout_ms: u64,
    pub idle_timeout_ms: u64,
    pub headless: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            navigation_timeout_ms: 60_000,
            idle_timeout_ms: 15_000,
            headless: true,
        }
    }
}

/// CSS selectors. An empty `consent_button` or `location_filter` disables
/// that interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub consent_button: String,
    pub location_filter: String,
    pub label: String,
    pub count: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            consent_button: "#onetrust-accept-btn-handler".to_string(),
            location_filter: "button#LocationAccordion".to_string(),
            label: "span.result-text".to_string(),
            count: "span.result-jobs-count".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    pub persist: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            persist: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Replaces the built-in country list when set.
    pub countries: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: String,
    pub default_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            default_limit: 50,
        }
    }
}

impl ScrapeConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScrapeError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ScrapeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("source.url", &self.source.url)?;
        validation::validate_positive_number(
            "source.navigation_timeout_ms",
            self.source.navigation_timeout_ms,
            1,
        )?;
        validation::validate_positive_number(
            "source.idle_timeout_ms",
            self.source.idle_timeout_ms,
            1,
        )?;
        validation::validate_non_empty_string("selectors.label", &self.selectors.label)?;
        validation::validate_non_empty_string("selectors.count", &self.selectors.count)?;
        validation::validate_non_empty_string("store.database_url", &self.store.database_url)?;
        validation::validate_socket_addr("api.bind", &self.api.bind)?;
        validation::validate_positive_number(
            "api.default_limit",
            u64::from(self.api.default_limit),
            1,
        )?;

        if let Some(countries) = &self.registry.countries {
            if countries.is_empty() {
                return Err(ScrapeError::InvalidConfigValueError {
                    field: "registry.countries".to_string(),
                    value: "[]".to_string(),
                    reason: "Country list cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn target(&self) -> ScrapeTarget {
        let optional = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        ScrapeTarget {
            url: self.source.url.clone(),
            consent_selector: optional(&self.selectors.consent_button),
            filter_selector: optional(&self.selectors.location_filter),
            navigation_timeout: Duration::from_millis(self.source.navigation_timeout_ms),
            idle_timeout: Duration::from_millis(self.source.idle_timeout_ms),
        }
    }

    /// Bound on a single browser element lookup. Optional controls that are
    /// absent should cost no more than an idle wait.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.source.idle_timeout_ms)
    }

    pub fn extractor(&self) -> PageExtractor {
        PageExtractor::new(&self.selectors.label, &self.selectors.count)
    }

    pub fn registry(&self) -> CountryRegistry {
        match &self.registry.countries {
            Some(countries) => CountryRegistry::new(countries.iter().cloned()),
            None => CountryRegistry::default(),
        }
    }
}

impl Validate for ScrapeConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
