// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;

use tracing::debug;

/// Environment variable that turns off W3C trace context pickup and injection.
pub const DISABLE_W3C_TRACE_CORRELATION_ENV: &str = "INSTANA_DISABLE_W3C_TRACE_CORRELATION";

/// Configuration for trace context propagation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationConfig {
    /// Whether to read and write the W3C `traceparent`/`tracestate` headers
    pub w3c_trace_correlation: bool,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            w3c_trace_correlation: true,
        }
    }
}

impl PropagationConfig {
    /// Create configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let w3c_trace_correlation = env::var(DISABLE_W3C_TRACE_CORRELATION_ENV)
            .map(|val| !is_disabling(&val))
            .unwrap_or(true);

        if !w3c_trace_correlation {
            debug!("W3C trace correlation disabled by {DISABLE_W3C_TRACE_CORRELATION_ENV}");
        }

        Self {
            w3c_trace_correlation,
        }
    }
}

fn is_disabling(val: &str) -> bool {
    let val = val.trim().to_lowercase();
    !val.is_empty() && val != "false" && val != "0"
}
