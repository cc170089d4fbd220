//! Text formats for the two persisted files.
//!
//! Both files are UTF-8 text with one record per line and no header:
//!
//! ```text
//! schema file                       values file (on_off)   values file (numeric)
//! 再開時のカウントダウン,count_down,1  count_down=ON        count_down,1
//! カウント時のブザー音,buzzer,0        buzzer=OFF           buzzer,0
//! "Volume, master",volume,1           volume=ON            volume,1
//! ```
//!
//! Decoding never fails as a whole.  The input is split into lines before
//! anything else looks at it, so a broken line (bad bytes, an unclosed
//! quote) cannot reach into its neighbours.  A line that cannot be
//! understood is reported as a [`ParseError`] alongside the records that
//! did decode, and the caller decides whether to log it.
//!
//! # Sub-modules
//!
//! - **`schema_file`** – `display_name,key,default` records, quoted like CSV
//!   so that display names may contain commas.
//! - **`values_file`** – `key=ON`/`key=OFF` or `key,1`/`key,0` records.

pub mod schema_file;
pub mod values_file;

use thiserror::Error;

use crate::domain::schema::ValidationError;

/// A single line that could not be decoded.  Line numbers are 1-based.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A schema record did not have exactly three fields.
    #[error("line {line}: expected {expected} fields, found {found}")]
    WrongFieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A values record had neither `,` nor `=`.
    #[error("line {line}: missing `,` or `=` separator")]
    MissingSeparator { line: u64 },

    /// A values record had nothing before the separator.
    #[error("line {line}: missing key")]
    MissingKey { line: u64 },

    /// A values record carried something other than a boolean.
    #[error("line {line}: {value:?} is not ON/OFF or 0/1")]
    InvalidValue { line: u64, value: String },

    /// A schema record had fields that fail definition validation.
    #[error("line {line}: {source}")]
    InvalidDefinition {
        line: u64,
        #[source]
        source: ValidationError,
    },

    /// A schema record reused a key from an earlier line.
    #[error("line {line}: key {key:?} repeats an earlier definition")]
    DuplicateKey { line: u64, key: String },

    /// The record could not be tokenised at all.
    #[error("line {line}: unreadable record: {message}")]
    Malformed { line: u64, message: String },

    /// The line is not valid UTF-8.
    #[error("line {line}: not valid UTF-8 text")]
    InvalidEncoding { line: u64 },
}

impl ParseError {
    /// The 1-based line the error refers to.
    pub fn line(&self) -> u64 {
        match self {
            Self::WrongFieldCount { line, .. }
            | Self::MissingSeparator { line }
            | Self::MissingKey { line }
            | Self::InvalidEncoding { line }
            | Self::InvalidValue { line, .. }
            | Self::InvalidDefinition { line, .. }
            | Self::DuplicateKey { line, .. }
            | Self::Malformed { line, .. } => *line,
        }
    }
}

/// Splits raw file bytes into numbered lines.
///
/// Lines end at `\n`; a trailing `\r` is dropped so CRLF files read the same.
/// Each line is checked for UTF-8 on its own.
pub(crate) fn numbered_lines(
    bytes: &[u8],
) -> impl Iterator<Item = (u64, Result<&str, ParseError>)> {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes
        .split(|&b| b == b'\n')
        .enumerate()
        .filter(move |_| !bytes.is_empty())
        .map(|(index, raw)| {
            let line = index as u64 + 1;
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let text =
                std::str::from_utf8(raw).map_err(|_| ParseError::InvalidEncoding { line });
            (line, text)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    type Numbered<'a> = Vec<(u64, Result<&'a str, ParseError>)>;

    #[test]
    fn test_numbered_lines_strips_crlf_and_counts_from_one() {
        let lines: Numbered = numbered_lines(b"a\r\nb\n\nc").collect();
        let expected: Numbered = vec![(1, Ok("a")), (2, Ok("b")), (3, Ok("")), (4, Ok("c"))];
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_numbered_lines_isolates_invalid_bytes() {
        let lines: Numbered = numbered_lines(b"ok\n\xff\xfe\nfine\n").collect();
        let expected: Numbered = vec![
            (1, Ok("ok")),
            (2, Err(ParseError::InvalidEncoding { line: 2 })),
            (3, Ok("fine")),
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_numbered_lines_of_empty_input_is_empty() {
        assert_eq!(numbered_lines(b"").count(), 0);
        assert_eq!(numbered_lines(b"\n").count(), 0);
        assert_eq!(numbered_lines(b"\n\n").count(), 2);
    }
}
