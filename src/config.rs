//! Runtime settings assembled from defaults, a YAML file, and the CLI.
//!
//! Precedence, lowest to highest: built-in defaults, `config.yaml`, command
//! line flags (which themselves may come from environment variables). The
//! result is a validated [`Settings`] value that is passed explicitly to the
//! components that need it; nothing reads global configuration.
//!
//! # Example config.yaml
//!
//! ```yaml
//! base_url: http://127.0.0.1:8000
//! overlap_policy: latest-wins
//! timeout_secs: 10
//! search:
//!   language: en
//!   page_size: 20
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::models::PLACEHOLDER_IMAGE;
use clap::ValueEnum;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// The local news service the front end talks to unless told otherwise.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const SORT_ORDERS: [&str; 3] = ["publishedAt", "popularity", "relevancy"];

/// How a submission made while another request is outstanding is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Abort the superseded request; only the newest submission's result applies.
    #[default]
    LatestWins,
    /// Run submissions one at a time in order; only the newest result applies.
    Queue,
    /// Let requests overlap and apply every result as it arrives.
    Unordered,
}

/// Optional filters forwarded to `/news/search` alongside the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub country: Option<String>,
    pub language: Option<String>,
    pub sort_by: Option<String>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
}

impl SearchOptions {
    /// Query-string pairs for the options that are set, in a stable order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(country) = &self.country {
            pairs.push(("country_code", country.to_lowercase()));
        }
        if let Some(language) = &self.language {
            pairs.push(("language", language.clone()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by", sort_by.clone()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size", page_size.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }

    /// Reject values the news API would refuse anyway.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(country) = &self.country {
            if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::InvalidOption(format!(
                    "country must be a 2-letter code, got '{country}'"
                )));
            }
        }
        if let Some(sort_by) = &self.sort_by {
            if !SORT_ORDERS.contains(&sort_by.as_str()) {
                return Err(ConfigError::InvalidOption(format!(
                    "sort_by must be one of {}, got '{sort_by}'",
                    SORT_ORDERS.join(", ")
                )));
            }
        }
        if let Some(page_size) = self.page_size {
            if !(1..=100).contains(&page_size) {
                return Err(ConfigError::InvalidOption(format!(
                    "page_size must be between 1 and 100, got {page_size}"
                )));
            }
        }
        if self.page == Some(0) {
            return Err(ConfigError::InvalidOption("page must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// The on-disk shape of `config.yaml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub overlap_policy: Option<OverlapPolicy>,
    pub placeholder_image: Option<String>,
    pub timeout_secs: Option<u64>,
    pub animate: Option<bool>,
    pub search: SearchOptions,
}

impl FileConfig {
    /// Parse a YAML document.
    pub fn from_yaml(path: &str, text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Read and parse a YAML file.
    #[instrument(level = "info")]
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let file = Self::from_yaml(path, &text)?;
        info!(path, "Loaded configuration");
        Ok(file)
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub overlap_policy: OverlapPolicy,
    pub placeholder_image: String,
    pub timeout: Option<Duration>,
    pub search: SearchOptions,
    pub animate: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            overlap_policy: OverlapPolicy::default(),
            placeholder_image: PLACEHOLDER_IMAGE.to_string(),
            timeout: None,
            search: SearchOptions::default(),
            animate: true,
        }
    }
}

impl Settings {
    /// Merge the optional config file and CLI flags over the defaults.
    pub fn resolve(file: FileConfig, cli: &Cli) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let base_url = match cli.base_url.as_deref().or(file.base_url.as_deref()) {
            Some(raw) => parse_base_url(raw)?,
            None => defaults.base_url,
        };

        let search = SearchOptions {
            country: cli.country.clone().or(file.search.country),
            language: cli.language.clone().or(file.search.language),
            sort_by: cli.sort_by.clone().or(file.search.sort_by),
            page_size: cli.page_size.or(file.search.page_size),
            page: cli.page.or(file.search.page),
        };
        search.validate()?;

        let settings = Settings {
            base_url,
            overlap_policy: cli
                .overlap_policy
                .or(file.overlap_policy)
                .unwrap_or(defaults.overlap_policy),
            placeholder_image: file
                .placeholder_image
                .unwrap_or(defaults.placeholder_image),
            timeout: cli
                .timeout_secs
                .or(file.timeout_secs)
                .map(Duration::from_secs),
            search,
            animate: !cli.no_animation && file.animate.unwrap_or(defaults.animate),
        };
        debug!(?settings, "Resolved settings");
        Ok(settings)
    }

    /// Load the config file named on the command line (if any) and resolve.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, cli)
    }
}

/// Parse and check a base URL. Only `http` and `https` are accepted.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}
