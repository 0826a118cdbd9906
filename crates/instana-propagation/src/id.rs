// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hex encoding of trace and span IDs.
//!
//! IDs are signed 64-bit integers, shared with other language tracers that use a
//! signed long. On the wire they are the hex form of the same bit pattern read as
//! unsigned, so `-7815363404733516491` travels as `938a406416457535`.

use crate::error::IdError;

/// Longest hex representation of a 64-bit ID.
const MAX_ID_LENGTH: usize = 16;

/// Formats an ID as lowercase hex without leading zeros.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn format_id(id: i64) -> String {
    format!("{:x}", id as u64)
}

/// Parses a 1 to 16 character hex string, leading zeros allowed.
///
/// # Errors
///
/// Returns [`IdError::InvalidIdFormat`] for empty or too long input, or input with
/// anything other than hex digits.
#[allow(clippy::cast_possible_wrap)]
pub fn parse_id(header: &str) -> Result<i64, IdError> {
    if header.is_empty()
        || header.len() > MAX_ID_LENGTH
        || !header.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(IdError::InvalidIdFormat);
    }

    u64::from_str_radix(header, 16)
        .map(|id| id as i64)
        .map_err(|_| IdError::InvalidIdFormat)
}
