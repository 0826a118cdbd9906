// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for trace context propagation operations.
//!
//! Only [`Error`] ever reaches callers of the propagator. The remaining error types
//! belong to the individual header codecs and are recovered from inside the
//! propagator:
//!
//! - [`IdError`] is turned into [`Error::ContextCorrupted`]
//! - [`LevelError`] is logged and replaced by the default level
//! - [`TraceContextError`] is logged and the W3C context is treated as absent

use thiserror::Error;

/// Error returned from `inject` or `extract`.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// The carrier is missing a capability the operation requires.
    #[error("invalid carrier")]
    InvalidCarrier,

    /// No trace context headers were found. Callers start a new trace.
    #[error("span context not found")]
    ContextNotFound,

    /// Trace context headers were found but could not be decoded.
    #[error("span context corrupted")]
    ContextCorrupted,
}

/// Error decoding a hex trace or span ID.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid id format")]
    InvalidIdFormat,
}

/// Error decoding the `x-instana-l` header value.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("malformed header value")]
    MalformedHeader,
}

/// Error decoding the W3C `traceparent`/`tracestate` pair.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TraceContextError {
    #[error("no w3c context")]
    ContextNotFound,

    #[error("corrupted w3c context")]
    ContextCorrupted,

    #[error("unsupported w3c context version")]
    UnsupportedVersion,
}

impl From<IdError> for Error {
    fn from(_: IdError) -> Self {
        Error::ContextCorrupted
    }
}
