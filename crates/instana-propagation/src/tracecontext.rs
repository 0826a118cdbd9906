// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Bridges the native trace context and the W3C trace context.
//!
//! On inject, the W3C context picked up from the inbound request is continued: the
//! current span becomes the parent and the Instana `tracestate` member is refreshed.
//! Without an inbound W3C context, one is synthesized from the native IDs so that
//! W3C-only services downstream stay in the same trace.

use tracing::debug;

use crate::carrier::Headers;
use crate::context::SpanContext;
use crate::error::TraceContextError;
use crate::id::format_id;
use crate::w3c::{self, Parent, State, VENDOR_INSTANA};

/// Writes the W3C headers for an outbound call made within `context`.
pub fn inject(context: &SpanContext, headers: &mut dyn Headers) {
    let trace_hex = format_id(context.trace_id);
    let span_hex = format_id(context.span_id);

    let (parent, state) = match context.w3c_context() {
        Some(w3c_context) => {
            let parent = w3c_context.parent().unwrap_or_else(|e| {
                debug!(
                    "Replacing stored traceparent {:?}: {e}",
                    w3c_context.raw_parent
                );
                Parent::new(trace_hex.clone(), span_hex.clone(), !context.suppressed)
            });
            (parent, w3c_context.state())
        }
        // zero native IDs yield an all-zero traceparent, which receivers reject
        None => (
            Parent::new(trace_hex.clone(), span_hex.clone(), !context.suppressed),
            State::default(),
        ),
    };

    let (parent, state) = continue_trace(parent, state, context, &trace_hex, &span_hex);

    w3c::inject(&w3c::Context::new(&parent, &state), headers);
}

fn continue_trace(
    mut parent: Parent,
    mut state: State,
    context: &SpanContext,
    trace_hex: &str,
    span_hex: &str,
) -> (Parent, State) {
    // a suppressed call keeps the upstream parent unless upstream already sampled
    if !context.suppressed || parent.flags.sampled {
        parent.parent_id = span_hex.to_string();
    }
    parent.flags.sampled = !context.suppressed;

    if !context.suppressed {
        state = state.add(VENDOR_INSTANA, &format!("{trace_hex};{span_hex}"));
    }

    (parent, state)
}

/// Reads the W3C context of an inbound request, if any.
#[must_use]
pub fn pickup(headers: &dyn Headers) -> Option<w3c::Context> {
    match w3c::extract(headers) {
        Ok(context) => Some(context),
        Err(TraceContextError::ContextNotFound) => None,
        Err(e) => {
            debug!("Failed to extract W3C trace context: {e}");
            None
        }
    }
}
