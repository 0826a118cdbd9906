// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! W3C trace context codec.
//!
//! Reads and writes the `traceparent`/`tracestate` header pair defined by
//! <https://www.w3.org/TR/trace-context/>:
//!
//! ```text
//! traceparent: 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01
//! tracestate: in=938a406416457535;44349a2d9ec0480,congo=t61rcWkgMzE
//! ```
//!
//! The codec only deals with the raw header values. Merging them with the native
//! trace context is done by [`crate::tracecontext`].

use tracing::debug;

use crate::carrier::Headers;
use crate::error::TraceContextError;

pub mod parent;
pub mod state;

pub use parent::{Flags, Parent, Version};
pub use state::{State, MAX_STATE_ENTRIES, VENDOR_INSTANA};

/// HTTP header key for W3C traceparent (version-traceId-parentId-flags).
pub const TRACEPARENT_KEY: &str = "traceparent";

/// HTTP header key for W3C tracestate (vendor-specific state).
pub const TRACESTATE_KEY: &str = "tracestate";

/// Raw W3C trace context header values.
///
/// A context with both values empty is "zero" and means no W3C context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub raw_parent: String,
    pub raw_state: String,
}

impl Context {
    #[must_use]
    pub fn new(parent: &Parent, state: &State) -> Self {
        Self {
            raw_parent: parent.to_string(),
            raw_state: state.to_string(),
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.raw_parent.is_empty() && self.raw_state.is_empty()
    }

    /// Parses the raw `traceparent` value.
    ///
    /// # Errors
    ///
    /// See [`Parent`]'s `FromStr` implementation.
    pub fn parent(&self) -> Result<Parent, TraceContextError> {
        self.raw_parent.parse()
    }

    /// Parses the raw `tracestate` value, discarding it when malformed.
    #[must_use]
    pub fn state(&self) -> State {
        self.raw_state.parse().unwrap_or_else(|e| {
            debug!("Discarding tracestate {:?}: {e}", self.raw_state);
            State::default()
        })
    }
}

/// Reads the W3C trace context from raw headers.
///
/// Multiple `tracestate` headers are combined into one list, in order.
///
/// # Errors
///
/// Returns [`TraceContextError::ContextNotFound`] without a `traceparent` header,
/// and the parse error of an invalid `traceparent` value.
pub fn extract(headers: &dyn Headers) -> Result<Context, TraceContextError> {
    let raw_parent = headers
        .header_values(TRACEPARENT_KEY)
        .into_iter()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .ok_or(TraceContextError::ContextNotFound)?;

    raw_parent.parse::<Parent>()?;

    let raw_state = headers
        .header_values(TRACESTATE_KEY)
        .into_iter()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(",");

    Ok(Context {
        raw_parent: raw_parent.to_string(),
        raw_state,
    })
}

/// Writes the W3C trace context, replacing previous values of any casing.
///
/// An empty `tracestate` is not written.
pub fn inject(context: &Context, headers: &mut dyn Headers) {
    headers.replace_header(TRACEPARENT_KEY, context.raw_parent.clone());

    if context.raw_state.is_empty() {
        headers.remove_header(TRACESTATE_KEY);
    } else {
        headers.replace_header(TRACESTATE_KEY, context.raw_state.clone());
    }
}
