//! Request path protocol.
//!
//! Resize requests are encoded in the URL path:
//!
//! ```text
//! /{prefix}/{width}/{height}/{mode}/{format}/{source path...}
//! ```
//!
//! Segment matching is case-insensitive. Everything after the format segment
//! is the source path, rejoined with `/` and always starting with `/`.

use rocket::http::RawStr;

use crate::models::{OutputFormat, ResizeMode, ResizeRequest};

// width, height, mode, format and at least one source segment
const PARAMETER_SEGMENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The path is not under the prefix; another handler should serve it.
    Skip,
    /// The path is under the prefix but malformed.
    Invalid,
    Valid(ResizeRequest),
}

fn prefix_segments(prefix: &str) -> impl Iterator<Item = &str> {
    prefix.split('/').filter(|s| !s.is_empty())
}

fn path_segments(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Returns true when the first path segments equal the prefix segments.
pub fn matches_prefix(prefix: &str, path: &str) -> bool {
    let segments = path_segments(path);
    let mut count = 0;
    for (i, expected) in prefix_segments(prefix).enumerate() {
        match segments.get(i) {
            Some(actual) if actual.eq_ignore_ascii_case(expected) => count += 1,
            _ => return false,
        }
    }
    count > 0
}

pub fn parse(prefix: &str, path: &str) -> ParseOutcome {
    if !matches_prefix(prefix, path) {
        return ParseOutcome::Skip;
    }

    let segments = path_segments(path);
    let skip = prefix_segments(prefix).count();
    if segments.len() < skip + PARAMETER_SEGMENTS {
        return ParseOutcome::Invalid;
    }

    let params = &segments[skip..];
    let width = match parse_dimension(params[0]) {
        Some(width) => width,
        None => return ParseOutcome::Invalid,
    };
    let height = match parse_dimension(params[1]) {
        Some(height) => height,
        None => return ParseOutcome::Invalid,
    };
    let mode = match params[2].parse::<ResizeMode>() {
        Ok(mode) => mode,
        Err(_) => return ParseOutcome::Invalid,
    };
    let format = match params[3].parse::<OutputFormat>() {
        Ok(format) => format,
        Err(_) => return ParseOutcome::Invalid,
    };

    let mut source_path = String::new();
    for segment in &params[4..] {
        let decoded = match RawStr::new(segment).percent_decode() {
            Ok(decoded) => decoded,
            Err(_) => return ParseOutcome::Invalid,
        };
        // Traversal and embedded separators never reach the source provider
        if decoded == "." || decoded == ".." || decoded.contains(['/', '\\', '\0']) {
            return ParseOutcome::Invalid;
        }
        source_path.push('/');
        source_path.push_str(&decoded);
    }

    ParseOutcome::Valid(ResizeRequest {
        source_path,
        width,
        height,
        mode,
        format,
    })
}

fn parse_dimension(segment: &str) -> Option<u32> {
    match segment.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(value) => Some(value),
    }
}

/// Builds the request path for `request` under `prefix`.
pub fn generate(prefix: &str, request: &ResizeRequest) -> String {
    let mut path = String::new();
    for segment in prefix_segments(prefix) {
        path.push('/');
        path.push_str(segment);
    }
    path.push_str(&format!(
        "/{}/{}/{}/{}",
        request.width, request.height, request.mode, request.format
    ));
    for segment in request.source_path.split('/').filter(|s| !s.is_empty()) {
        path.push('/');
        path.push_str(RawStr::new(segment).percent_encode().as_str());
    }
    path
}
