// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Parser for the `x-instana-l` header value.
//!
//! The value holds the trace level, optionally followed by the end-user monitoring
//! correlation that started the trace:
//!
//! ```text
//! x-instana-l: 1
//! x-instana-l: 0
//! x-instana-l: 1, correlationType=web; correlationId=8a3b2f
//! ```
//!
//! Grammar, where OWS is any run of spaces and tabs:
//!
//! ```text
//! level = ( "0" / "1" ) [ OWS "," OWS "correlationType=" type OWS ";" OWS "correlationId=" id ]
//! ```
//!
//! The correlation ID runs to the end of the value.

use crate::context::EumCorrelation;
use crate::error::LevelError;

const CORRELATION_TYPE_PREFIX: &[u8] = b"correlationType=";
const CORRELATION_ID_PREFIX: &[u8] = b"correlationId=";

/// Decoded `x-instana-l` value.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Level {
    pub suppressed: bool,
    pub correlation: Option<EumCorrelation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Byte(u8),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Expecting `0` or `1`.
    Level,
    /// Skipping OWS while looking for `,`. `padded` is set once whitespace was seen,
    /// since only a bare digit may end the value.
    PartSeparator { padded: bool },
    /// Skipping OWS, then matching `correlationType=`.
    CorrelationPart { matched: usize },
    /// Reading the correlation type up to `;`.
    CorrelationType,
    /// Skipping OWS, then matching `correlationId=`.
    CorrelationId { matched: usize },
    Final,
}

const fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

impl State {
    /// Returns the next state, or `None` when the input leaves the grammar.
    fn next(self, symbol: Symbol) -> Option<State> {
        match (self, symbol) {
            (State::Level, Symbol::Byte(b'0' | b'1')) => {
                Some(State::PartSeparator { padded: false })
            }

            (State::PartSeparator { padded: false }, Symbol::End) => Some(State::Final),
            (State::PartSeparator { .. }, Symbol::Byte(b)) if is_ows(b) => {
                Some(State::PartSeparator { padded: true })
            }
            (State::PartSeparator { .. }, Symbol::Byte(b',')) => {
                Some(State::CorrelationPart { matched: 0 })
            }

            (State::CorrelationPart { matched: 0 }, Symbol::Byte(b)) if is_ows(b) => Some(self),
            (State::CorrelationPart { matched }, Symbol::Byte(b))
                if CORRELATION_TYPE_PREFIX[matched] == b =>
            {
                if matched + 1 == CORRELATION_TYPE_PREFIX.len() {
                    Some(State::CorrelationType)
                } else {
                    Some(State::CorrelationPart {
                        matched: matched + 1,
                    })
                }
            }

            (State::CorrelationType, Symbol::Byte(b';')) => {
                Some(State::CorrelationId { matched: 0 })
            }
            (State::CorrelationType, Symbol::Byte(_)) => Some(State::CorrelationType),

            (State::CorrelationId { matched: 0 }, Symbol::Byte(b)) if is_ows(b) => Some(self),
            (State::CorrelationId { matched }, Symbol::Byte(b))
                if CORRELATION_ID_PREFIX[matched] == b =>
            {
                if matched + 1 == CORRELATION_ID_PREFIX.len() {
                    Some(State::Final)
                } else {
                    Some(State::CorrelationId {
                        matched: matched + 1,
                    })
                }
            }

            _ => None,
        }
    }
}

/// Parses an `x-instana-l` value.
///
/// An empty value is the default level: not suppressed, no correlation.
///
/// # Errors
///
/// Returns [`LevelError::MalformedHeader`] when the value does not match the grammar.
///
/// # Example
///
/// ```
/// use instana_propagation::level::parse_level;
///
/// let level = parse_level("0, correlationType=web;correlationId=abc").unwrap();
///
/// assert!(level.suppressed);
/// assert_eq!(level.correlation.unwrap().id, "abc");
/// ```
pub fn parse_level(value: &str) -> Result<Level, LevelError> {
    if value.is_empty() {
        return Ok(Level::default());
    }

    let bytes = value.as_bytes();
    let mut state = State::Level;
    let mut suppressed = false;
    let (mut type_start, mut type_end) = (0, 0);
    let mut correlation_id = None;

    let mut pos = 0;
    while state != State::Final {
        let symbol = bytes.get(pos).map_or(Symbol::End, |&b| Symbol::Byte(b));
        let next = state.next(symbol).ok_or(LevelError::MalformedHeader)?;

        match (state, next, symbol) {
            (State::Level, _, Symbol::Byte(b)) => suppressed = b == b'0',
            (State::CorrelationPart { .. }, State::CorrelationType, _) => {
                type_start = pos + 1;
                type_end = type_start;
            }
            // trailing OWS is not part of the type
            (State::CorrelationType, State::CorrelationType, Symbol::Byte(b)) if !is_ows(b) => {
                type_end = pos + 1;
            }
            (State::CorrelationId { .. }, State::Final, _) => {
                correlation_id = Some(value.get(pos + 1..).ok_or(LevelError::MalformedHeader)?);
            }
            _ => {}
        }

        state = next;
        pos += 1;
    }

    let correlation = match correlation_id {
        Some(id) => Some(EumCorrelation {
            correlation_type: value
                .get(type_start..type_end)
                .ok_or(LevelError::MalformedHeader)?
                .to_string(),
            id: id.to_string(),
        }),
        None => None,
    };

    Ok(Level {
        suppressed,
        correlation,
    })
}

/// Formats the `x-instana-l` value written on inject.
#[must_use]
pub fn format_level(suppressed: bool) -> &'static str {
    if suppressed {
        "0"
    } else {
        "1"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn correlation(correlation_type: &str, id: &str) -> Option<EumCorrelation> {
        Some(EumCorrelation {
            correlation_type: correlation_type.to_string(),
            id: id.to_string(),
        })
    }

    macro_rules! test_parse_level {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (input, expected) = $value;
                    assert_eq!(parse_level(input), expected, "input: {input:?}");
                }
            )*
        }
    }

    test_parse_level! {
        empty: ("", Ok(Level::default())),
        not_suppressed: ("1", Ok(Level { suppressed: false, correlation: None })),
        suppressed: ("0", Ok(Level { suppressed: true, correlation: None })),
        suppressed_with_correlation: (
            "0, correlationType=web;correlationId=abc",
            Ok(Level { suppressed: true, correlation: correlation("web", "abc") }),
        ),
        correlation_without_whitespace: (
            "1,correlationType=web;correlationId=1234567890abcdef",
            Ok(Level { suppressed: false, correlation: correlation("web", "1234567890abcdef") }),
        ),
        correlation_with_whitespace: (
            "1 \t,  correlationType=mobile \t;\t correlationId=abc",
            Ok(Level { suppressed: false, correlation: correlation("mobile", "abc") }),
        ),
        correlation_id_keeps_remainder: (
            "1, correlationType=web; correlationId=abc; def ",
            Ok(Level { suppressed: false, correlation: correlation("web", "abc; def ") }),
        ),
        correlation_type_keeps_inner_spaces: (
            "1, correlationType=web page ;correlationId=abc",
            Ok(Level { suppressed: false, correlation: correlation("web page", "abc") }),
        ),
        empty_correlation_values: (
            "1, correlationType=;correlationId=",
            Ok(Level { suppressed: false, correlation: correlation("", "") }),
        ),
        invalid_level: ("2", Err(LevelError::MalformedHeader)),
        invalid_level_with_correlation: (
            "x, correlationType=web;correlationId=abc",
            Err(LevelError::MalformedHeader),
        ),
        trailing_whitespace: ("1 ", Err(LevelError::MalformedHeader)),
        trailing_separator: ("1,", Err(LevelError::MalformedHeader)),
        wrong_separator: ("1;correlationType=web;correlationId=abc", Err(LevelError::MalformedHeader)),
        wrong_type_literal: (
            "1, correlationtype=web;correlationId=abc",
            Err(LevelError::MalformedHeader),
        ),
        missing_id_separator: ("1, correlationType=web", Err(LevelError::MalformedHeader)),
        wrong_id_literal: (
            "1, correlationType=web;correlationID=abc",
            Err(LevelError::MalformedHeader),
        ),
        truncated_id_literal: (
            "1, correlationType=web;correlation",
            Err(LevelError::MalformedHeader),
        ),
    }

    #[test]
    fn test_parse_level_non_ascii() {
        let level = parse_level("1, correlationType=wéb;correlationId=ü").unwrap();

        assert_eq!(level.correlation, correlation("wéb", "ü"));
        assert!(parse_level("é").is_err());
    }

    #[test]
    fn test_format_level() {
        assert_eq!(format_level(true), "0");
        assert_eq!(format_level(false), "1");
        assert!(parse_level(format_level(true)).unwrap().suppressed);
        assert!(!parse_level(format_level(false)).unwrap().suppressed);
    }
}
