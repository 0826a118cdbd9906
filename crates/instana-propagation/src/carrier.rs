// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Carrier traits for trace context propagation.
//!
//! Carriers abstract the transport used to move trace context across service
//! boundaries (HTTP headers, message queue metadata, etc.). Each carrier advertises
//! which capabilities it supports through [`Carrier`]:
//!
//! - **[`Extractor`]**: enumerate keys and read values
//! - **[`Injector`]**: write values
//! - **[`Headers`]**: raw multi-valued header access with case-insensitive
//!   replacement and removal
//!
//! Carriers without [`Headers`] still carry the native `x-instana-*` headers, but are
//! skipped for W3C trace context, `Server-Timing` and stale header cleanup.
//!
//! # Case Handling
//!
//! Header names are case-insensitive, but some carriers keep the exact casing they
//! were given. Reads match case-insensitively; writes keep the casing passed in, so
//! the propagator can reuse a casing already present on the carrier rather than add
//! a second, differently cased header.
//!
//! # Inspired By
//!
//! Code inspired and adapted from the OpenTelemetry Rust project:
//! <https://github.com/open-telemetry/opentelemetry-rust/blob/main/opentelemetry/src/propagation/mod.rs>

use std::collections::HashMap;
use std::hash::BuildHasher;

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use serde_json::Value;
use tracing::debug;

/// Trait for writing trace context into a carrier.
pub trait Injector {
    /// Sets a key-value pair in the carrier, replacing the value stored under
    /// exactly this key.
    fn set(&mut self, key: &str, value: String);
}

/// Trait for reading trace context from a carrier.
pub trait Extractor {
    /// Gets a value from the carrier by key.
    ///
    /// An exact match wins; otherwise the first case-insensitive match is returned.
    fn get(&self, key: &str) -> Option<&str>;

    /// Gets all keys present in the carrier, in their original casing.
    fn keys(&self) -> Vec<&str>;
}

/// Raw multi-valued header access.
///
/// All lookups and removals ignore the case of the header name.
pub trait Headers {
    /// Gets all header names, in their original casing.
    fn header_names(&self) -> Vec<&str>;

    /// Gets every value stored under any casing of `name`.
    fn header_values(&self, name: &str) -> Vec<&str>;

    /// Removes every casing variant of `name`, then stores `value` under `name`.
    fn replace_header(&mut self, name: &str, value: String);

    /// Removes every casing variant of `name`.
    fn remove_header(&mut self, name: &str);

    /// Adds `value` as the last entry of the comma-separated list stored under any
    /// casing of `name`. Existing entries are kept in order and the list is written
    /// back as a single header under `name`.
    fn append_list_entry(&mut self, name: &str, value: &str) {
        let mut entries = self
            .header_values(name)
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        entries.push(value.to_string());

        self.replace_header(name, entries.join(", "));
    }

    /// Removes every header whose name starts with `prefix`, ignoring case.
    fn remove_prefixed(&mut self, prefix: &str) {
        let stale = self
            .header_names()
            .into_iter()
            .filter(|name| strip_prefix_ignore_case(name, prefix).is_some())
            .map(str::to_owned)
            .collect::<Vec<_>>();

        for name in stale {
            self.remove_header(&name);
        }
    }
}

/// Capability set of a carrier.
///
/// Every capability defaults to unsupported.
pub trait Carrier {
    /// Read access, required by both `inject` and `extract`.
    fn extractor(&self) -> Option<&dyn Extractor> {
        None
    }

    /// Write access, required by `inject`.
    fn injector(&mut self) -> Option<&mut dyn Injector> {
        None
    }

    /// Raw header access, used to pick up the W3C trace context.
    fn headers(&self) -> Option<&dyn Headers> {
        None
    }

    /// Raw header access, used to purge stale values and write the W3C and
    /// `Server-Timing` headers.
    fn headers_mut(&mut self) -> Option<&mut dyn Headers> {
        None
    }
}

/// Strips `prefix` from `key`, comparing ASCII case-insensitively.
///
/// The remainder keeps its original casing.
#[must_use]
pub fn strip_prefix_ignore_case<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    let head = key.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        key.get(prefix.len()..)
    } else {
        None
    }
}

fn find_ignore_case<'a, V, S: BuildHasher>(
    map: &'a HashMap<String, V, S>,
    key: &str,
) -> Option<&'a V> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

// ============================================================================
// Text map carrier
// ============================================================================

impl<S: BuildHasher> Injector for HashMap<String, String, S> {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

impl<S: BuildHasher> Extractor for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<&str> {
        find_ignore_case(self, key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        HashMap::keys(self).map(String::as_str).collect::<Vec<_>>()
    }
}

impl<S: BuildHasher> Carrier for HashMap<String, String, S> {
    fn extractor(&self) -> Option<&dyn Extractor> {
        Some(self)
    }

    fn injector(&mut self) -> Option<&mut dyn Injector> {
        Some(self)
    }
}

// ============================================================================
// Raw header map carrier
// ============================================================================

impl<S: BuildHasher> Injector for HashMap<String, Vec<String>, S> {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), vec![value]);
    }
}

impl<S: BuildHasher> Extractor for HashMap<String, Vec<String>, S> {
    fn get(&self, key: &str) -> Option<&str> {
        find_ignore_case(self, key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        HashMap::keys(self).map(String::as_str).collect::<Vec<_>>()
    }
}

impl<S: BuildHasher> Headers for HashMap<String, Vec<String>, S> {
    fn header_names(&self) -> Vec<&str> {
        HashMap::keys(self).map(String::as_str).collect::<Vec<_>>()
    }

    fn header_values(&self, name: &str) -> Vec<&str> {
        self.iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter().map(String::as_str))
            .collect::<Vec<_>>()
    }

    fn replace_header(&mut self, name: &str, value: String) {
        self.remove_header(name);
        self.insert(name.to_string(), vec![value]);
    }

    fn remove_header(&mut self, name: &str) {
        self.retain(|k, _| !k.eq_ignore_ascii_case(name));
    }
}

impl<S: BuildHasher> Carrier for HashMap<String, Vec<String>, S> {
    fn extractor(&self) -> Option<&dyn Extractor> {
        Some(self)
    }

    fn injector(&mut self) -> Option<&mut dyn Injector> {
        Some(self)
    }

    fn headers(&self) -> Option<&dyn Headers> {
        Some(self)
    }

    fn headers_mut(&mut self) -> Option<&mut dyn Headers> {
        Some(self)
    }
}

// ============================================================================
// JSON carrier
// ============================================================================

/// Only works with `Value::Object` variants. Non-object values are silently ignored.
impl Injector for Value {
    fn set(&mut self, key: &str, value: String) {
        if let Value::Object(map) = self {
            map.insert(key.to_string(), Value::String(value));
        }
    }
}

/// Only works with `Value::Object` variants. Non-string members are not readable.
impl Extractor for Value {
    fn get(&self, key: &str) -> Option<&str> {
        let Value::Object(map) = self else {
            return None;
        };

        map.get(key)
            .or_else(|| {
                map.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .and_then(Value::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        if let Value::Object(map) = self {
            map.keys().map(String::as_str).collect::<Vec<_>>()
        } else {
            Vec::new()
        }
    }
}

impl Carrier for Value {
    fn extractor(&self) -> Option<&dyn Extractor> {
        Some(self)
    }

    fn injector(&mut self) -> Option<&mut dyn Injector> {
        Some(self)
    }
}

// ============================================================================
// http::HeaderMap carrier
// ============================================================================

// `HeaderMap` stores names lowercased and matches them case-insensitively, so every
// operation is already case-insensitive.

fn header_pair(name: &str, value: String) -> Option<(HeaderName, HeaderValue)> {
    let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
        debug!("Skipping invalid header name {name:?}");
        return None;
    };

    match HeaderValue::try_from(value) {
        Ok(header_value) => Some((header_name, header_value)),
        Err(_) => {
            debug!("Skipping invalid value for header {name:?}");
            None
        }
    }
}

impl Injector for HeaderMap {
    fn set(&mut self, key: &str, value: String) {
        if let Some((name, value)) = header_pair(key, value) {
            self.insert(name, value);
        }
    }
}

impl Extractor for HeaderMap {
    fn get(&self, key: &str) -> Option<&str> {
        HeaderMap::get(self, key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        HeaderMap::keys(self).map(HeaderName::as_str).collect::<Vec<_>>()
    }
}

impl Headers for HeaderMap {
    fn header_names(&self) -> Vec<&str> {
        HeaderMap::keys(self).map(HeaderName::as_str).collect::<Vec<_>>()
    }

    fn header_values(&self, name: &str) -> Vec<&str> {
        HeaderMap::get_all(self, name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
    }

    fn replace_header(&mut self, name: &str, value: String) {
        HeaderMap::remove(self, name);
        if let Some((name, value)) = header_pair(name, value) {
            self.insert(name, value);
        }
    }

    fn remove_header(&mut self, name: &str) {
        HeaderMap::remove(self, name);
    }

    // Values that are not visible ASCII are kept byte for byte.
    fn append_list_entry(&mut self, name: &str, value: &str) {
        let mut joined = Vec::new();
        for existing in HeaderMap::get_all(self, name) {
            joined.extend_from_slice(existing.as_bytes());
            joined.extend_from_slice(b", ");
        }
        joined.extend_from_slice(value.as_bytes());

        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            debug!("Skipping invalid header name {name:?}");
            return;
        };

        match HeaderValue::from_bytes(&joined) {
            Ok(header_value) => {
                self.insert(header_name, header_value);
            }
            Err(_) => debug!("Skipping invalid value for header {name:?}"),
        }
    }
}

impl Carrier for HeaderMap {
    fn extractor(&self) -> Option<&dyn Extractor> {
        Some(self)
    }

    fn injector(&mut self) -> Option<&mut dyn Injector> {
        Some(self)
    }

    fn headers(&self) -> Option<&dyn Headers> {
        Some(self)
    }

    fn headers_mut(&mut self) -> Option<&mut dyn Headers> {
        Some(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;

    #[test]
    fn hash_map_get() {
        let mut carrier: HashMap<String, String> = HashMap::new();
        carrier.set("headerName", "value".to_string());

        assert_eq!(
            Extractor::get(&carrier, "HEADERNAME"),
            Some("value"),
            "case insensitive extraction"
        );
    }

    #[test]
    fn hash_map_get_prefers_exact_match() {
        let carrier = HashMap::from([("X-Key".to_string(), "exact".to_string())]);

        assert_eq!(Extractor::get(&carrier, "X-Key"), Some("exact"));
        assert_eq!(Extractor::get(&carrier, "x-key"), Some("exact"));
        assert_eq!(Extractor::get(&carrier, "x-other"), None);
    }

    #[test]
    fn hash_map_keys_keep_case() {
        let mut carrier: HashMap<String, String> = HashMap::new();
        carrier.set("headerName1", "value1".to_string());
        carrier.set("headerName2", "value2".to_string());

        let got = Extractor::keys(&carrier);
        assert_eq!(got.len(), 2);
        assert!(got.contains(&"headerName1"));
        assert!(got.contains(&"headerName2"));
    }

    #[test]
    fn hash_map_capabilities() {
        let mut carrier: HashMap<String, String> = HashMap::new();

        assert!(carrier.extractor().is_some());
        assert!(carrier.injector().is_some());
        assert!(carrier.headers().is_none());
        assert!(carrier.headers_mut().is_none());
    }

    #[test]
    fn raw_headers_values_ignore_case() {
        let carrier = HashMap::from([
            ("Server-Timing".to_string(), vec!["a".to_string(), "b".to_string()]),
            ("x-other".to_string(), vec!["c".to_string()]),
        ]);

        assert_eq!(carrier.header_values("server-timing"), vec!["a", "b"]);
        assert_eq!(Extractor::get(&carrier, "SERVER-TIMING"), Some("a"));
        assert!(carrier.header_values("missing").is_empty());
    }

    #[test]
    fn raw_headers_replace_removes_variants() {
        let mut carrier = HashMap::from([
            ("TraceParent".to_string(), vec!["old".to_string()]),
            ("TRACEPARENT".to_string(), vec!["older".to_string()]),
        ]);

        carrier.replace_header("traceparent", "new".to_string());

        assert_eq!(carrier.len(), 1);
        assert_eq!(carrier["traceparent"], vec!["new".to_string()]);
    }

    #[test]
    fn raw_headers_remove_prefixed() {
        let mut carrier = HashMap::from([
            ("X-Instana-B-Foo".to_string(), vec!["1".to_string()]),
            ("x-instana-b-bar".to_string(), vec!["2".to_string()]),
            ("x-instana-t".to_string(), vec!["3".to_string()]),
        ]);

        carrier.remove_prefixed("x-instana-b-");

        assert_eq!(carrier.len(), 1);
        assert!(carrier.contains_key("x-instana-t"));
    }

    #[test]
    fn serde_value_get() {
        let mut carrier = Value::Object(serde_json::Map::new());
        carrier.set("headerName", "value".to_string());

        assert_eq!(
            Extractor::get(&carrier, "HEADERNAME"),
            Some("value"),
            "case insensitive extraction"
        );
    }

    #[test]
    fn serde_value_keys() {
        let mut carrier = Value::Object(serde_json::Map::new());
        carrier.set("headerName1", "value1".to_string());
        carrier.set("headerName2", "value2".to_string());

        let got = Extractor::keys(&carrier);
        assert_eq!(got.len(), 2);
        assert!(got.contains(&"headerName1"));
        assert!(got.contains(&"headerName2"));
    }

    #[test]
    fn serde_value_non_object() {
        let mut carrier = Value::String("not an object".to_string());
        carrier.set("key", "value".to_string());

        assert_eq!(Extractor::get(&carrier, "key"), None);
        assert!(Extractor::keys(&carrier).is_empty());
    }

    #[test]
    fn header_map_round_trip() {
        let mut carrier = HeaderMap::new();
        carrier.set("X-Instana-T", "abc".to_string());
        carrier.set("bad header", "value".to_string());

        assert_eq!(Extractor::get(&carrier, "x-instana-t"), Some("abc"));
        assert_eq!(Extractor::keys(&carrier), vec!["x-instana-t"]);
    }

    #[test]
    fn header_map_values_and_removal() {
        let mut carrier = HeaderMap::new();
        carrier.append("server-timing", HeaderValue::from_static("a"));
        carrier.append("server-timing", HeaderValue::from_static("b"));

        assert_eq!(carrier.header_values("Server-Timing"), vec!["a", "b"]);

        carrier.replace_header("Server-Timing", "c".to_string());
        assert_eq!(carrier.header_values("server-timing"), vec!["c"]);

        carrier.remove_header("SERVER-TIMING");
        assert!(carrier.is_empty());
    }

    #[test]
    fn header_map_replace_with_invalid_value_removes_stale() {
        let mut carrier = HeaderMap::new();
        carrier.insert("tracestate", HeaderValue::from_static("stale=1"));

        carrier.replace_header("tracestate", "bad\nvalue".to_string());

        assert!(carrier.get("tracestate").is_none());
    }

    #[test]
    fn header_map_append_list_entry_keeps_opaque_bytes() {
        let mut carrier = HeaderMap::new();
        carrier.append(
            "server-timing",
            HeaderValue::from_bytes(b"cache;desc=\"caf\xe9\"").unwrap(),
        );
        carrier.append("server-timing", HeaderValue::from_static("db;dur=53"));

        carrier.append_list_entry("Server-Timing", "intid;desc=abc");

        let values = carrier
            .get_all("server-timing")
            .iter()
            .map(HeaderValue::as_bytes)
            .collect::<Vec<_>>();
        assert_eq!(
            values,
            vec![&b"cache;desc=\"caf\xe9\", db;dur=53, intid;desc=abc"[..]]
        );
    }

    #[test]
    fn raw_headers_append_list_entry() {
        let mut carrier = HashMap::from([(
            "server-timing".to_string(),
            vec!["cache;dur=1".to_string(), "db;dur=2".to_string()],
        )]);

        carrier.append_list_entry("Server-Timing", "intid;desc=abc");

        assert_eq!(carrier.len(), 1);
        assert_eq!(
            carrier["Server-Timing"],
            vec!["cache;dur=1, db;dur=2, intid;desc=abc".to_string()]
        );
    }

    #[test]
    fn strip_prefix() {
        assert_eq!(
            strip_prefix_ignore_case("X-INSTANA-B-MyKey", "x-instana-b-"),
            Some("MyKey")
        );
        assert_eq!(strip_prefix_ignore_case("x-instana-t", "x-instana-b-"), None);
        assert_eq!(strip_prefix_ignore_case("x-in", "x-instana-b-"), None);
        assert_eq!(strip_prefix_ignore_case("x-instana-b-é", "x-instana-b-"), Some("é"));
    }
}
