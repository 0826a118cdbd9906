// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace context carried across service boundaries.
//!
//! A [`SpanContext`] is built fresh by `extract` for every inbound request, or derived
//! from the active span by the tracer before `inject`. The propagator never keeps one
//! between calls.
//!
//! ```text
//! Incoming Request
//!   ↓
//! Extract SpanContext (from headers)
//!   ↓
//! Process Request (create child span)
//!   ↓
//! Inject SpanContext (into outgoing request headers)
//!   ↓
//! Outgoing Request
//! ```

use std::collections::HashMap;

use crate::w3c;

/// End-user monitoring correlation data.
///
/// Sent by the browser agent in the `x-instana-l` header when the trace was started
/// by a monitored page load or XHR call, e.g.
/// `1, correlationType=web; correlationId=8a3b2f`.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct EumCorrelation {
    /// Kind of end-user monitoring session, e.g. `web` or `mobile`.
    pub correlation_type: String,
    /// ID of the browser-side span that initiated the call.
    pub id: String,
}

/// Propagated identity of a span.
///
/// # Example
///
/// ```
/// use instana_propagation::context::SpanContext;
/// use std::collections::HashMap;
///
/// let context = SpanContext {
///     trace_id: -7_815_363_404_733_516_491,
///     span_id: 1_234,
///     baggage: HashMap::from([("user".to_string(), "42".to_string())]),
///     ..Default::default()
/// };
///
/// assert!(!context.suppressed);
/// ```
#[derive(Clone, Default, Debug, PartialEq)]
pub struct SpanContext {
    /// ID shared by all spans of the trace.
    pub trace_id: i64,
    /// ID of this span.
    pub span_id: i64,
    /// When set, the trace must not be sampled or reported downstream.
    pub suppressed: bool,
    /// Marks a synthetic call such as a health check. Extracted from
    /// `x-instana-synthetic`, never injected.
    pub synthetic: bool,
    /// Caller-defined key/value pairs, keys kept as received.
    pub baggage: HashMap<String, String>,
    /// Present when the trace was started by an end-user monitoring agent.
    pub correlation: Option<EumCorrelation>,
    /// W3C trace context picked up from an inbound request.
    pub w3c_context: Option<w3c::Context>,
}

impl SpanContext {
    /// Whether the context was sourced from an end-user monitoring agent.
    ///
    /// Native trace and span IDs are optional for such contexts.
    #[must_use]
    pub fn is_eum_correlated(&self) -> bool {
        self.correlation
            .as_ref()
            .is_some_and(|correlation| !correlation.id.is_empty())
    }

    /// Returns the W3C context, unless it is missing or zero.
    #[must_use]
    pub fn w3c_context(&self) -> Option<&w3c::Context> {
        self.w3c_context.as_ref().filter(|context| !context.is_zero())
    }
}
