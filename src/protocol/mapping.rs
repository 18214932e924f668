//! Admission control: the mapping whitelist and `Accept`-driven format upgrades.

use crate::models::{AllowedMapping, OutputFormat, ResizeRequest};

// Formats tried, in order of preference, when upgrading a JPEG or PNG request
const UPGRADE_TARGETS: [OutputFormat; 2] = [OutputFormat::Avif, OutputFormat::Webp];

/// Exact match of the request against the whitelist. No tolerance, no wildcards.
pub fn is_allowed(request: &ResizeRequest, mappings: &[AllowedMapping]) -> bool {
    let wanted = request.mapping();
    mappings.iter().any(|mapping| *mapping == wanted)
}

#[derive(Debug, Clone)]
pub struct MappingValidator {
    mappings: Vec<AllowedMapping>,
    enabled: bool,
}

impl MappingValidator {
    pub fn new(mappings: Vec<AllowedMapping>, enabled: bool) -> Self {
        Self { mappings, enabled }
    }

    pub fn is_allowed(&self, request: &ResizeRequest) -> bool {
        !self.enabled || is_allowed(request, &self.mappings)
    }

    pub fn mappings(&self) -> &[AllowedMapping] {
        &self.mappings
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Swaps a JPEG or PNG request for a more efficient format the client accepts.
    ///
    /// The substitute must be encodable by the backend and itself pass the
    /// whitelist; otherwise the request is returned unchanged. Dimensions and
    /// mode are never touched.
    pub fn negotiate_format(
        &self,
        request: &ResizeRequest,
        accept: Option<&str>,
        supports: impl Fn(OutputFormat) -> bool,
    ) -> ResizeRequest {
        if !matches!(request.format, OutputFormat::Jpeg | OutputFormat::Png) {
            return request.clone();
        }
        let accept = match accept {
            Some(accept) => accept,
            None => return request.clone(),
        };

        for target in UPGRADE_TARGETS {
            if !accepts(accept, target.mime_type()) || !supports(target) {
                continue;
            }
            let candidate = request.with_format(target);
            if self.is_allowed(&candidate) {
                return candidate;
            }
            log::debug!(
                "Not upgrading {} to {}: mapping not allowed",
                request.source_path,
                target
            );
        }
        request.clone()
    }
}

// Explicit listing only; wildcards do not prove codec support
fn accepts(accept: &str, mime: &str) -> bool {
    accept.split(',').any(|entry| {
        let mut parts = entry.split(';').map(str::trim);
        let media = parts.next().unwrap_or_default();
        if !media.eq_ignore_ascii_case(mime) {
            return false;
        }
        !parts.any(|param| {
            param
                .strip_prefix("q=")
                .and_then(|q| q.trim().parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        })
    })
}
