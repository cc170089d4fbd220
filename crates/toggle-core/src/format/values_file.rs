//! Codec for the values file.
//!
//! Two record forms exist and both are accepted on read, even mixed in one
//! file:
//!
//! | Form      | Example          | Written by                 |
//! |-----------|------------------|----------------------------|
//! | `on_off`  | `buzzer=ON`      | [`ValuesFormat::OnOff`]    |
//! | `numeric` | `buzzer,1`       | [`ValuesFormat::Numeric`]  |
//!
//! Keys never contain `,` or `=`, so the first of either character ends the
//! key.  The value side accepts every spelling [`parse_bool`] understands.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::definition::parse_bool;
use crate::domain::values::ValueSet;
use crate::format::{numbered_lines, ParseError};

/// Which record form the values writer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuesFormat {
    /// `key=ON` / `key=OFF`
    #[default]
    OnOff,
    /// `key,1` / `key,0`
    Numeric,
}

impl fmt::Display for ValuesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnOff => f.write_str("on_off"),
            Self::Numeric => f.write_str("numeric"),
        }
    }
}

/// Error for an unrecognised [`ValuesFormat`] name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown values format {0:?} (expected \"on_off\" or \"numeric\")")]
pub struct UnknownValuesFormat(pub String);

impl FromStr for ValuesFormat {
    type Err = UnknownValuesFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_off" | "on-off" | "onoff" => Ok(Self::OnOff),
            "numeric" => Ok(Self::Numeric),
            other => Err(UnknownValuesFormat(other.to_string())),
        }
    }
}

/// Result of decoding a values file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodedValues {
    /// Saved value per key.  A key repeated in the file keeps its last value.
    pub overrides: HashMap<String, bool>,
    /// Lines that were skipped.
    pub skipped: Vec<ParseError>,
}

/// Decodes the text of a values file.
///
/// Blank lines are ignored; every other line that fails [`decode_line`] is
/// skipped and reported without affecting its neighbours.
pub fn decode_values(content: &str) -> DecodedValues {
    decode_values_bytes(content.as_bytes())
}

/// Decodes a values file as read from disk.
///
/// A line that is not valid UTF-8 is skipped as
/// [`ParseError::InvalidEncoding`]; the lines around it still decode.
pub fn decode_values_bytes(content: &[u8]) -> DecodedValues {
    let mut decoded = DecodedValues::default();
    for (line, text) in numbered_lines(content) {
        match text.and_then(|raw| decode_line(raw, line)) {
            Ok(Some((key, value))) => {
                decoded.overrides.insert(key, value);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("skipping values record: {e}");
                decoded.skipped.push(e);
            }
        }
    }
    decoded
}

/// Decodes one values record.
///
/// Returns `Ok(None)` for a blank line.
///
/// # Errors
///
/// - [`ParseError::MissingSeparator`] when the line has no `,` or `=`.
/// - [`ParseError::MissingKey`] when nothing precedes the separator.
/// - [`ParseError::InvalidValue`] when the value is not boolean.
pub fn decode_line(raw: &str, line: u64) -> Result<Option<(String, bool)>, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let split = trimmed
        .find([',', '='])
        .ok_or(ParseError::MissingSeparator { line })?;
    let key = trimmed[..split].trim();
    let value = trimmed[split + 1..].trim();

    if key.is_empty() {
        return Err(ParseError::MissingKey { line });
    }
    let value = parse_bool(value).ok_or_else(|| ParseError::InvalidValue {
        line,
        value: value.to_string(),
    })?;

    Ok(Some((key.to_string(), value)))
}

/// Encodes one record per key of `values`, in schema order.
pub fn encode_values(values: &ValueSet, format: ValuesFormat) -> String {
    let mut out = String::new();
    for (key, value) in values.iter() {
        let suffix = match (format, value) {
            (ValuesFormat::OnOff, true) => "=ON",
            (ValuesFormat::OnOff, false) => "=OFF",
            (ValuesFormat::Numeric, true) => ",1",
            (ValuesFormat::Numeric, false) => ",0",
        };
        out.push_str(key);
        out.push_str(suffix);
        out.push('\n');
    }
    out
}
