// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The `tracestate` header.
//!
//! A comma-separated list of `vendor=value` members, most recently updated first:
//!
//! ```text
//! tracestate: in=938a406416457535;44349a2d9ec0480,congo=t61rcWkgMzE
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::TraceContextError;

/// Maximum number of list members in `tracestate`.
///
/// <https://www.w3.org/TR/trace-context/#tracestate-header-field-values>
pub const MAX_STATE_ENTRIES: usize = 32;

/// Vendor key of the Instana list member.
pub const VENDOR_INSTANA: &str = "in";

const LIST_MEMBER_SEPARATOR: char = ',';
const KEY_VALUE_SEPARATOR: char = '=';

/// Parsed `tracestate` value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    members: Vec<String>,
}

impl State {
    /// Puts `vendor=data` at the front of the list, replacing any member previously
    /// written by the same vendor. Members beyond [`MAX_STATE_ENTRIES`] are dropped
    /// from the right.
    #[must_use]
    pub fn add(self, vendor: &str, data: &str) -> Self {
        let mut members = Vec::with_capacity(self.members.len() + 1);
        members.push(format!("{vendor}{KEY_VALUE_SEPARATOR}{data}"));
        members.extend(
            self.members
                .into_iter()
                .filter(|member| member_key(member) != vendor),
        );
        members.truncate(MAX_STATE_ENTRIES);

        Self { members }
    }

    /// Returns the value of the member written by `vendor`.
    #[must_use]
    pub fn fetch(&self, vendor: &str) -> Option<&str> {
        self.members.iter().find_map(|member| {
            member
                .split_once(KEY_VALUE_SEPARATOR)
                .filter(|(key, _)| *key == vendor)
                .map(|(_, value)| value)
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }
}

fn member_key(member: &str) -> &str {
    member
        .split_once(KEY_VALUE_SEPARATOR)
        .map_or(member, |(key, _)| key)
}

impl FromStr for State {
    type Err = TraceContextError;

    fn from_str(tracestate: &str) -> Result<Self, Self::Err> {
        let mut members = Vec::new();

        for member in tracestate
            .split(LIST_MEMBER_SEPARATOR)
            .map(|member| member.trim_matches(|c| c == ' ' || c == '\t'))
            .filter(|member| !member.is_empty())
        {
            match member.split_once(KEY_VALUE_SEPARATOR) {
                Some((key, _)) if !key.is_empty() && !key.contains([' ', '\t']) => {
                    members.push(member.to_string());
                }
                _ => return Err(TraceContextError::ContextCorrupted),
            }
        }

        members.truncate(MAX_STATE_ENTRIES);

        Ok(Self { members })
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.members.join(","))
    }
}
