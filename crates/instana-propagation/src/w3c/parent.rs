// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The `traceparent` header.
//!
//! Format: `version-traceId-parentId-flags`
//!
//! Header: `00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01`
//! - Version: `00`
//! - Trace ID: `4bf92f3577b34da6a3ce929d0e0e4736` (128-bit)
//! - Parent ID: `00f067aa0ba902b7` (64-bit)
//! - Flags: `01` (sampled)

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::TraceContextError;

const SAMPLED_FLAG: u8 = 0x01;

lazy_static! {
    static ref VERSION_REGEX: Regex = Regex::new(r"^[a-f0-9]{2}$").expect("failed creating regex");

    static ref TRACEPARENT_V0_REGEX: Regex =
        Regex::new(r"^00-([a-f0-9]{32})-([a-f0-9]{16})-([a-f0-9]{2})$")
            .expect("failed creating regex");

    /// Detects the all-zero trace and parent IDs, which are invalid.
    static ref INVALID_SEGMENT_REGEX: Regex = Regex::new(r"^0+$").expect("failed creating regex");
}

/// Supported `traceparent` versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Version {
    #[default]
    V0,
}

impl Version {
    /// Latest version this crate can write.
    pub const MAX: Version = Version::V0;

    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Version::V0 => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub sampled: bool,
}

impl Flags {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        if self.sampled {
            SAMPLED_FLAG
        } else {
            0
        }
    }
}

/// Parsed `traceparent` value.
///
/// IDs are kept as lowercase hex strings. They may be shorter than their wire width,
/// for instance when built from a 64-bit native ID, and are zero-padded on display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parent {
    pub version: Version,
    pub trace_id: String,
    pub parent_id: String,
    pub flags: Flags,
}

impl Parent {
    #[must_use]
    pub fn new(trace_id: String, parent_id: String, sampled: bool) -> Self {
        Self {
            version: Version::MAX,
            trace_id,
            parent_id,
            flags: Flags { sampled },
        }
    }
}

impl FromStr for Parent {
    type Err = TraceContextError;

    fn from_str(traceparent: &str) -> Result<Self, Self::Err> {
        let traceparent = traceparent.trim();
        let version = traceparent
            .get(..2)
            .ok_or(TraceContextError::ContextCorrupted)?;

        match version {
            "00" => {}
            "ff" => return Err(TraceContextError::ContextCorrupted),
            _ if VERSION_REGEX.is_match(version) => {
                return Err(TraceContextError::UnsupportedVersion);
            }
            _ => return Err(TraceContextError::ContextCorrupted),
        }

        let captures = TRACEPARENT_V0_REGEX
            .captures(traceparent)
            .ok_or(TraceContextError::ContextCorrupted)?;

        let trace_id = &captures[1];
        let parent_id = &captures[2];
        if INVALID_SEGMENT_REGEX.is_match(trace_id) || INVALID_SEGMENT_REGEX.is_match(parent_id) {
            return Err(TraceContextError::ContextCorrupted);
        }

        let flags = u8::from_str_radix(&captures[3], 16)
            .map_err(|_| TraceContextError::ContextCorrupted)?;

        Ok(Parent {
            version: Version::V0,
            trace_id: trace_id.to_string(),
            parent_id: parent_id.to_string(),
            flags: Flags {
                sampled: flags & SAMPLED_FLAG != 0,
            },
        })
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}-{:0>32}-{:0>16}-{:02x}",
            self.version.as_u8(),
            self.trace_id,
            self.parent_id,
            self.flags.as_u8()
        )
    }
}
