// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Native header names and per-carrier casing resolution.
//!
//! Header names are case-insensitive, but a carrier that keeps exact casing would end
//! up with two headers if it already holds `X-INSTANA-T` and the propagator writes
//! `x-instana-t`. [`HeaderKeys::resolve`] picks up any casing already present so it
//! can be reused on write.

use crate::carrier::{strip_prefix_ignore_case, Extractor, Headers};

/// HTTP header key for the trace ID, hex encoded.
///
/// Example: `x-instana-t: 938a406416457535`
pub const TRACE_ID_KEY: &str = "x-instana-t";

/// HTTP header key for the span ID of the caller, hex encoded.
///
/// Example: `x-instana-s: 44349a2d9ec0480`
pub const SPAN_ID_KEY: &str = "x-instana-s";

/// HTTP header key for the trace level and optional EUM correlation.
///
/// Example: `x-instana-l: 1, correlationType=web; correlationId=8a3b2f`
pub const LEVEL_KEY: &str = "x-instana-l";

/// Prefix of baggage headers, one header per baggage entry.
///
/// Example: `x-instana-b-user-id: 12345`
pub const BAGGAGE_PREFIX: &str = "x-instana-b-";

/// HTTP header key marking synthetic calls such as health checks.
///
/// Example: `x-instana-synthetic: 1`
pub const SYNTHETIC_KEY: &str = "x-instana-synthetic";

/// Header names to write to one particular carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderKeys {
    pub trace_id: String,
    pub span_id: String,
    pub level: String,
    pub baggage_prefix: String,
}

impl Default for HeaderKeys {
    fn default() -> Self {
        Self {
            trace_id: TRACE_ID_KEY.to_string(),
            span_id: SPAN_ID_KEY.to_string(),
            level: LEVEL_KEY.to_string(),
            baggage_prefix: BAGGAGE_PREFIX.to_string(),
        }
    }
}

impl HeaderKeys {
    /// Scans the carrier keys once, keeping any existing casing of the native header
    /// names and falling back to the lowercase names.
    #[must_use]
    pub fn resolve(carrier: &dyn Extractor) -> Self {
        let mut keys = Self::default();

        for key in carrier.keys() {
            if key.eq_ignore_ascii_case(TRACE_ID_KEY) {
                keys.trace_id = key.to_string();
            } else if key.eq_ignore_ascii_case(SPAN_ID_KEY) {
                keys.span_id = key.to_string();
            } else if key.eq_ignore_ascii_case(LEVEL_KEY) {
                keys.level = key.to_string();
            } else if strip_prefix_ignore_case(key, BAGGAGE_PREFIX).is_some() {
                keys.baggage_prefix = key[..BAGGAGE_PREFIX.len()].to_string();
            }
        }

        keys
    }

    /// Removes every casing variant of the native headers, baggage included, so that
    /// no stale value survives the next write.
    pub fn purge(&self, headers: &mut dyn Headers) {
        headers.remove_header(&self.trace_id);
        headers.remove_header(&self.span_id);
        headers.remove_header(&self.level);
        headers.remove_prefixed(&self.baggage_prefix);
    }
}
