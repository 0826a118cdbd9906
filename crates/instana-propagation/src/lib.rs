// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Instana trace context propagation.
//!
//! Encodes a span's identity into the headers of an outbound request and decodes it
//! back on the receiving side, so that spans recorded in different services join the
//! same trace.
//!
//! # Wire Format
//!
//! Native headers:
//! - `x-instana-t`: trace ID, hex encoded
//! - `x-instana-s`: span ID of the caller, hex encoded
//! - `x-instana-l`: trace level (`1` traced, `0` suppressed), optionally followed by
//!   end-user monitoring correlation
//! - `x-instana-b-<key>`: one baggage entry per header
//! - `x-instana-synthetic`: `1` for synthetic calls (read only)
//!
//! Carriers with raw header access additionally get the W3C `traceparent` and
//! `tracestate` headers and the `Server-Timing` correlation entry.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use instana_propagation::{PropagationConfig, Propagator, SpanContext, SpanContextCodec};
//!
//! let codec = SpanContextCodec::new(Arc::new(PropagationConfig::default()));
//!
//! let outbound = SpanContext {
//!     trace_id: 0x1234,
//!     span_id: 0x5678,
//!     ..Default::default()
//! };
//! let mut headers: HashMap<String, Vec<String>> = HashMap::new();
//! codec.inject(&outbound, &mut headers).unwrap();
//!
//! let inbound = codec.extract(&headers).unwrap();
//! assert_eq!(inbound.trace_id, 0x1234);
//! assert_eq!(inbound.span_id, 0x5678);
//! assert!(inbound.w3c_context.is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

pub mod carrier;
pub mod config;
pub mod context;
pub mod error;
pub mod eum;
pub mod header_keys;
pub mod id;
pub mod level;
pub mod tracecontext;
pub mod w3c;

pub use carrier::{Carrier, Extractor, Headers, Injector};
pub use config::PropagationConfig;
pub use context::{EumCorrelation, SpanContext};
pub use error::Error;

use carrier::strip_prefix_ignore_case;
use header_keys::{
    HeaderKeys, BAGGAGE_PREFIX, LEVEL_KEY, SPAN_ID_KEY, SYNTHETIC_KEY, TRACE_ID_KEY,
};
use id::{format_id, parse_id};
use level::{format_level, parse_level, Level};

/// Trait for extracting and injecting distributed trace context.
pub trait Propagator {
    /// Extracts trace context from an inbound carrier.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCarrier`] when the carrier cannot be read
    /// - [`Error::ContextNotFound`] when the carrier holds no trace context
    /// - [`Error::ContextCorrupted`] when the trace or span ID cannot be decoded
    fn extract(&self, carrier: &dyn Carrier) -> Result<SpanContext, Error>;

    /// Injects trace context into an outbound carrier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCarrier`] when the carrier cannot be both read and
    /// written. The carrier is left untouched in that case.
    fn inject(&self, context: &SpanContext, carrier: &mut dyn Carrier) -> Result<(), Error>;
}

/// Propagator for the Instana native headers, bridged with W3C trace context.
#[derive(Debug, Clone)]
pub struct SpanContextCodec {
    config: Arc<PropagationConfig>,
}

impl SpanContextCodec {
    /// Creates a codec sharing the given configuration.
    #[must_use]
    pub fn new(config: Arc<PropagationConfig>) -> Self {
        Self { config }
    }
}

impl Propagator for SpanContextCodec {
    fn inject(&self, context: &SpanContext, carrier: &mut dyn Carrier) -> Result<(), Error> {
        let keys = HeaderKeys::resolve(carrier.extractor().ok_or(Error::InvalidCarrier)?);
        if carrier.injector().is_none() {
            return Err(Error::InvalidCarrier);
        }

        if let Some(headers) = carrier.headers_mut() {
            keys.purge(headers);

            if self.config.w3c_trace_correlation {
                tracecontext::inject(context, headers);
            }
            eum::inject(context, headers);
        }

        let injector = carrier.injector().ok_or(Error::InvalidCarrier)?;
        injector.set(&keys.trace_id, format_id(context.trace_id));
        injector.set(&keys.span_id, format_id(context.span_id));
        injector.set(&keys.level, format_level(context.suppressed).to_string());

        for (key, value) in &context.baggage {
            injector.set(&format!("{}{key}", keys.baggage_prefix), value.clone());
        }

        Ok(())
    }

    fn extract(&self, carrier: &dyn Carrier) -> Result<SpanContext, Error> {
        let extractor = carrier.extractor().ok_or(Error::InvalidCarrier)?;

        let mut context = SpanContext::default();

        if self.config.w3c_trace_correlation {
            if let Some(headers) = carrier.headers() {
                context.w3c_context = tracecontext::pickup(headers);
            }
        }

        let mut trace_id = "";
        let mut span_id = "";
        let mut baggage = HashMap::new();

        for key in extractor.keys() {
            let value = extractor.get(key).unwrap_or_default();

            if key.eq_ignore_ascii_case(TRACE_ID_KEY) {
                trace_id = value;
            } else if key.eq_ignore_ascii_case(SPAN_ID_KEY) {
                span_id = value;
            } else if key.eq_ignore_ascii_case(LEVEL_KEY) {
                let level = parse_level(value).unwrap_or_else(|e| {
                    info!("failed to parse {key}: {e} {value:?}");
                    Level::default()
                });

                context.suppressed = level.suppressed;
                // correlation only applies to traced calls
                if !level.suppressed {
                    context.correlation = level.correlation;
                }
            } else if key.eq_ignore_ascii_case(SYNTHETIC_KEY) {
                context.synthetic = value == "1";
            } else if let Some(baggage_key) = strip_prefix_ignore_case(key, BAGGAGE_PREFIX) {
                baggage.insert(baggage_key.to_string(), value.to_string());
            }
        }

        context.baggage = baggage;

        if context.is_eum_correlated() {
            return Ok(context);
        }

        if trace_id.is_empty() && span_id.is_empty() {
            return match context.w3c_context() {
                Some(_) => Ok(context),
                None => Err(Error::ContextNotFound),
            };
        }

        context.trace_id = parse_id(trace_id)?;
        context.span_id = parse_id(span_id)?;

        Ok(context)
    }
}
