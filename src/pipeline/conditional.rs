//! Conditional request handling: entity tags and validator checks.

use chrono::{DateTime, Utc};

use crate::timestamp;

/// Request headers that influence the response.
#[derive(Debug, Clone, Default)]
pub struct RequestConditions {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<DateTime<Utc>>,
    pub accept: Option<String>,
}

impl RequestConditions {
    /// Builds conditions from raw header values. An unparseable
    /// `If-Modified-Since` is ignored.
    pub fn from_headers(
        if_none_match: Option<&str>,
        if_modified_since: Option<&str>,
        accept: Option<&str>,
    ) -> Self {
        Self {
            if_none_match: if_none_match.map(str::to_string),
            if_modified_since: if_modified_since.and_then(timestamp::parse_http_date),
            accept: accept.map(str::to_string),
        }
    }
}

/// Headers sent with both full and 304 responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub cache_control: String,
    pub vary_accept: bool,
}

/// Quoted entity tag derived from the item's timestamp and length.
pub fn entity_tag(last_modified: Option<DateTime<Utc>>, length: u64) -> String {
    let seconds = last_modified.map_or(0, |t| t.timestamp());
    format!("\"{:x}\"", md5::compute(format!("{}:{}", seconds, length)))
}

/// True when the client's cached copy is still current.
///
/// `If-None-Match` wins over `If-Modified-Since` when both are present.
pub fn is_not_modified(
    conditions: &RequestConditions,
    etag: &str,
    last_modified: Option<DateTime<Utc>>,
) -> bool {
    if let Some(if_none_match) = &conditions.if_none_match {
        return etag_matches(if_none_match, etag);
    }
    match (conditions.if_modified_since, last_modified) {
        (Some(since), Some(modified)) => since >= modified,
        _ => false,
    }
}

// Weak comparison, as required for If-None-Match
fn etag_matches(header: &str, etag: &str) -> bool {
    let etag = etag.trim_start_matches("W/");
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.trim_start_matches("W/") == etag
    })
}
