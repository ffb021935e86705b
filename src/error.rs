//! Error types for query validation, news fetching, and configuration.
//!
//! Each failure class gets its own enum so callers can tell a locally
//! recovered validation problem apart from a transport failure. All types are
//! built with `thiserror`; their `Display` output is exactly what the search
//! view shows to the user.

use thiserror::Error;

/// Message shown when the user submits an empty or whitespace-only query.
pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a country or keyword.";

/// Message shown for any non-2xx response from the news API.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch news.";

/// The submitted query was rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{}", EMPTY_QUERY_MESSAGE)]
    EmptyQuery,
}

/// A search request did not produce a usable response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API answered with a non-2xx status.
    #[error("{}", FETCH_FAILED_MESSAGE)]
    Status(u16),

    /// The request never completed (connection refused, reset, DNS, ...).
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    /// The body was not valid JSON.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// The configured request timeout elapsed.
    #[error("Request timed out.")]
    Timeout,

    /// The request task ended without producing an outcome.
    #[error("{}", FETCH_FAILED_MESSAGE)]
    Interrupted,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e)
        }
    }
}

/// A one-shot search ended in the `Failed` state.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SearchFailed(pub String);

/// Startup configuration could not be assembled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid search option: {0}")]
    InvalidOption(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
