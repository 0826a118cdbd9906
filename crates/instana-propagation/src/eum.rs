// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! `Server-Timing` correlation for end-user monitoring.
//!
//! The browser agent reads the trace ID back from the response's `Server-Timing`
//! header to link the page load with the backend trace:
//!
//! ```text
//! Server-Timing: cache;dur=23.2, intid;desc=938a406416457535
//! ```

use crate::carrier::Headers;
use crate::context::SpanContext;
use crate::id::format_id;

pub const SERVER_TIMING_KEY: &str = "Server-Timing";

/// Appends the trace ID entry to `Server-Timing`, keeping existing entries.
pub fn inject(context: &SpanContext, headers: &mut dyn Headers) {
    headers.append_list_entry(
        SERVER_TIMING_KEY,
        &format!("intid;desc={}", format_id(context.trace_id)),
    );
}
