//! Data models for news search results.
//!
//! This module defines the wire types returned by the news API and the
//! normalized form the rest of the application works with:
//! - [`RawArticle`]: One article record exactly as the API sends it
//! - [`SearchResponse`]: The response envelope wrapping the `data` field
//! - [`DisplayItem`]: The UI-ready projection of an article
//!
//! Normalization happens once, at the API boundary, in
//! [`SearchResponse::into_display_items`]. The two possible image keys
//! (`urlToImage` and `image`) collapse into a single canonical field there
//! and nothing downstream ever sees the raw shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Image shown for articles that carry no usable image reference.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x200?text=No+Image";

/// The publisher block attached to NewsAPI-style articles.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// A single article record as returned by the news API.
///
/// Field names use camelCase to match the upstream JSON, hence the
/// `#[allow(non_snake_case)]` attribute. Every field is defaulted so that a
/// sparse record still deserializes.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RawArticle {
    /// The article headline. `null` and absent are treated alike.
    pub title: Option<String>,
    /// Link to the full article.
    pub url: Option<String>,
    /// Short teaser text, may contain markup.
    pub description: Option<String>,
    /// Image reference under its NewsAPI name.
    pub urlToImage: Option<String>,
    /// Image reference under its alternative name.
    pub image: Option<String>,
    /// Publisher information.
    pub source: Option<ArticleSource>,
    /// Publication timestamp, RFC 3339.
    pub publishedAt: Option<String>,
}

impl RawArticle {
    /// Resolve the canonical image URL for this record.
    ///
    /// Takes the first non-blank of `urlToImage` and `image`, falling back to
    /// `placeholder` when neither carries a value.
    pub fn resolve_image(&self, placeholder: &str) -> String {
        [self.urlToImage.as_deref(), self.image.as_deref()]
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.trim().is_empty())
            .unwrap_or(placeholder)
            .to_string()
    }

    /// Project the raw record into a [`DisplayItem`].
    pub fn into_display_item(self, placeholder: &str) -> DisplayItem {
        let image = self.resolve_image(placeholder);
        let published_at = self
            .publishedAt
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc));

        DisplayItem {
            title: self.title.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            image,
            description: self.description,
            source_name: self.source.and_then(|s| s.name),
            published_at,
        }
    }
}

/// The normalized, UI-ready projection of an article.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub title: String,
    pub url: String,
    /// Always populated; the placeholder when the source had no image.
    pub image: String,
    pub description: Option<String>,
    pub source_name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// The envelope returned by `GET /news/search`.
///
/// Only `data` matters to the client. It is kept as an untyped JSON value
/// because the API is allowed to omit it or send something other than an
/// array, both of which mean "no results".
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<Value>,
}

impl SearchResponse {
    /// Build a response from an already parsed JSON body.
    ///
    /// Bodies that are not JSON objects carry no `data` field and therefore
    /// yield an empty response.
    pub fn from_value(body: Value) -> Self {
        match body {
            Value::Object(mut map) => SearchResponse {
                data: map.remove("data"),
            },
            _ => SearchResponse::default(),
        }
    }

    /// Normalize the response into display items.
    ///
    /// A missing or non-array `data` field yields an empty list. Array
    /// elements that are not objects are skipped.
    pub fn into_display_items(self, placeholder: &str) -> Vec<DisplayItem> {
        let records = match self.data {
            Some(Value::Array(records)) => records,
            Some(other) => {
                warn!(kind = json_kind(&other), "Response `data` is not an array; treating as empty");
                return Vec::new();
            }
            None => return Vec::new(),
        };

        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                if !record.is_object() {
                    warn!(index, kind = json_kind(&record), "Skipping non-object article record");
                    return None;
                }
                match serde_json::from_value::<RawArticle>(record) {
                    Ok(raw) => Some(raw.into_display_item(placeholder)),
                    Err(e) => {
                        warn!(index, error = %e, "Skipping malformed article record");
                        None
                    }
                }
            })
            .collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
