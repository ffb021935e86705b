//! Command-line interface definitions for Kaonewz.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most options can also come from environment variables or a YAML config
//! file; flags win over both.

use crate::config::OverlapPolicy;
use clap::Parser;

/// Command-line arguments for the Kaonewz application.
///
/// # Examples
///
/// ```sh
/// # Interactive: type queries, one per line
/// kaonewz
///
/// # One-shot search, then exit
/// kaonewz --query Japan
///
/// # Against a different backend, newest first, 20 results
/// kaonewz --base-url http://news.local:8000 --sort-by publishedAt --page-size 20
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Run a single search for this query and exit
    #[arg(short, long)]
    pub query: Option<String>,

    /// Optional path to a config.yaml file
    #[arg(short, long, env = "KAONEWZ_CONFIG")]
    pub config: Option<String>,

    /// Base URL of the news API
    #[arg(long, env = "KAONEWZ_BASE_URL")]
    pub base_url: Option<String>,

    /// What to do when a search is submitted while another is in flight
    #[arg(long, value_enum)]
    pub overlap_policy: Option<OverlapPolicy>,

    /// Give up on a request after this many seconds (default: no timeout)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Restrict results to a 2-letter country code
    #[arg(long)]
    pub country: Option<String>,

    /// Language code (e.g. en, es, fr)
    #[arg(long)]
    pub language: Option<String>,

    /// Sort order: publishedAt, popularity or relevancy
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Number of results per page (1-100)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Page number, starting at 1
    #[arg(long)]
    pub page: Option<u32>,

    /// Disable the heading reveal and list entrance animations
    #[arg(long)]
    pub no_animation: bool,

    /// Render width in columns (default: terminal width)
    #[arg(long)]
    pub width: Option<usize>,
}
