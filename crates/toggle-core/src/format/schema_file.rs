//! Codec for the schema file.
//!
//! Each line holds one definition as `display_name,key,default`, where the
//! default is `0` or `1`.  Fields are quoted CSV-style when needed, so a
//! display name such as `Volume, master` is written as `"Volume, master"`
//! and reads back intact.  Plain unquoted files written by hand decode the
//! same way as long as no field contains a comma.
//!
//! A quoted field never spans lines: each line is handed to the CSV reader
//! on its own, so one hand-edited line with a stray `"` costs only that line.

use std::collections::HashSet;

use thiserror::Error;
use tracing::warn;

use crate::domain::definition::SettingDefinition;
use crate::domain::schema::Schema;
use crate::format::{numbered_lines, ParseError};

/// Fields per schema record.
const FIELD_COUNT: usize = 3;

/// The schema could not be serialised.
#[derive(Debug, Error)]
#[error("failed to encode schema records: {0}")]
pub struct EncodeError(#[from] csv::Error);

/// Result of decoding a schema file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodedSchema {
    /// Definitions that decoded cleanly, in file order.
    pub definitions: Vec<SettingDefinition>,
    /// Lines that were skipped.
    pub skipped: Vec<ParseError>,
}

/// Decodes the text of a schema file.
///
/// Blank lines are ignored.  Lines with the wrong number of fields, invalid
/// fields, or a key that repeats an earlier line are skipped and reported in
/// [`DecodedSchema::skipped`]; the first occurrence of a key wins.
pub fn decode_schema(content: &str) -> DecodedSchema {
    decode_schema_bytes(content.as_bytes())
}

/// Decodes a schema file as read from disk.
///
/// Same rules as [`decode_schema`], plus a line that is not valid UTF-8 is
/// skipped as [`ParseError::InvalidEncoding`].
pub fn decode_schema_bytes(content: &[u8]) -> DecodedSchema {
    let mut decoded = DecodedSchema::default();
    let mut seen = HashSet::new();

    for (line, text) in numbered_lines(content) {
        match text.and_then(|raw| decode_record(raw, line)) {
            Ok(Some(definition)) => {
                if seen.insert(definition.key().to_string()) {
                    decoded.definitions.push(definition);
                } else {
                    decoded.skipped.push(ParseError::DuplicateKey {
                        line,
                        key: definition.key().to_string(),
                    });
                }
            }
            Ok(None) => {}
            Err(e) => decoded.skipped.push(e),
        }
    }

    for skipped in &decoded.skipped {
        warn!("skipping schema record: {skipped}");
    }
    decoded
}

/// Decodes one schema record.
///
/// The CSV reader only ever sees this one line, so an unclosed quote ends
/// with the line.  Returns `Ok(None)` for a blank line.
///
/// # Errors
///
/// - [`ParseError::Malformed`] when the CSV reader rejects the line.
/// - [`ParseError::WrongFieldCount`] when there are not exactly three fields.
/// - [`ParseError::InvalidDefinition`] when a field fails validation.
pub fn decode_record(raw: &str, line: u64) -> Result<Option<SettingDefinition>, ParseError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_reader(raw.as_bytes());

    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => {}
        Ok(false) => return Ok(None),
        Err(e) => {
            return Err(ParseError::Malformed {
                line,
                message: e.to_string(),
            })
        }
    }

    if record.iter().all(str::is_empty) {
        return Ok(None);
    }
    if record.len() != FIELD_COUNT {
        return Err(ParseError::WrongFieldCount {
            line,
            expected: FIELD_COUNT,
            found: record.len(),
        });
    }

    SettingDefinition::parse(&record[0], &record[1], &record[2])
        .map(Some)
        .map_err(|source| ParseError::InvalidDefinition { line, source })
}

/// Encodes every definition of `schema`, one record per line.
///
/// # Errors
///
/// Returns [`EncodeError`] if the CSV writer fails.
pub fn encode_schema(schema: &Schema) -> Result<Vec<u8>, EncodeError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for def in schema.definitions() {
        writer.write_record([def.display_name(), def.key(), def.default_flag()])?;
    }

    writer
        .into_inner()
        .map_err(|e| EncodeError(csv::Error::from(e.into_error())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::ValidationError;

    fn encode_to_string(schema: &Schema) -> String {
        String::from_utf8(encode_schema(schema).expect("encode")).expect("utf-8")
    }

    #[test]
    fn test_encode_base_schema_matches_plain_format() {
        let text = encode_to_string(&Schema::base());
        assert_eq!(
            text,
            "再開時のカウントダウン,count_down,1\n\
             カウント時のブザー音,buzzer,0\n\
             途中のアナウンス,announce,0\n"
        );
    }

    #[test]
    fn test_decode_plain_lines() {
        // Arrange
        let text = "Countdown,count_down,1\nBuzzer,buzzer,0\nAnnounce,announce,0\n";

        // Act
        let decoded = decode_schema(text);

        // Assert
        assert!(decoded.skipped.is_empty());
        assert_eq!(decoded.definitions.len(), 3);
        assert_eq!(decoded.definitions[0].display_name(), "Countdown");
        assert!(decoded.definitions[0].default_value());
    }

    #[test]
    fn test_display_name_with_comma_survives_round_trip() {
        let schema = Schema::base()
            .add_definition("Volume, master", "volume", "1")
            .unwrap();

        let text = encode_to_string(&schema);
        let decoded = decode_schema(&text);

        assert!(text.contains("\"Volume, master\",volume,1"));
        assert_eq!(decoded.definitions, schema.definitions());
    }

    #[test]
    fn test_decode_skips_wrong_field_count() {
        let text = "A,a,1\nbroken line\nB,b,0,extra\nC,c,0\n";

        let decoded = decode_schema(text);

        let keys: Vec<&str> = decoded.definitions.iter().map(|d| d.key()).collect();
        assert_eq!(keys, ["a", "c"]);
        assert_eq!(
            decoded.skipped,
            vec![
                ParseError::WrongFieldCount {
                    line: 2,
                    expected: 3,
                    found: 1
                },
                ParseError::WrongFieldCount {
                    line: 3,
                    expected: 3,
                    found: 4
                },
            ]
        );
    }

    #[test]
    fn test_decode_skips_invalid_default() {
        let decoded = decode_schema("A,a,1\nB,b,7\n");
        assert_eq!(decoded.definitions.len(), 1);
        assert_eq!(
            decoded.skipped,
            vec![ParseError::InvalidDefinition {
                line: 2,
                source: ValidationError::InvalidDefault("7".to_string()),
            }]
        );
    }

    #[test]
    fn test_decode_keeps_first_of_duplicate_keys() {
        let decoded = decode_schema("A,a,1\nAgain,a,0\n");
        assert_eq!(decoded.definitions.len(), 1);
        assert_eq!(decoded.definitions[0].display_name(), "A");
        assert_eq!(decoded.skipped[0].line(), 2);
    }

    #[test]
    fn test_decode_ignores_blank_lines_and_trims_fields() {
        let decoded = decode_schema("\n  A , a , 1 \n\n   \nB,b,0\n");
        assert!(decoded.skipped.is_empty(), "{:?}", decoded.skipped);
        let keys: Vec<&str> = decoded.definitions.iter().map(|d| d.key()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_decode_empty_content_yields_nothing() {
        let decoded = decode_schema("");
        assert!(decoded.definitions.is_empty());
        assert!(decoded.skipped.is_empty());
    }

    #[test]
    fn test_unclosed_quote_costs_only_its_own_line() {
        // Arrange: line 4 opens a quote and never closes it
        let text = "A,count_down,1\n\
                    B,buzzer,0\n\
                    C,announce,0\n\
                    \"Loud buzzer,loud,1\n\
                    Volume,volume,1\n\
                    Vibration,vibrate,0\n";

        // Act
        let decoded = decode_schema(text);

        // Assert
        let keys: Vec<&str> = decoded.definitions.iter().map(|d| d.key()).collect();
        assert_eq!(keys, ["count_down", "buzzer", "announce", "volume", "vibrate"]);
        assert_eq!(decoded.skipped.len(), 1);
        assert_eq!(decoded.skipped[0].line(), 4);
    }

    #[test]
    fn test_unclosed_quote_on_first_line_keeps_the_rest() {
        let text = "\"A,count_down,1\nB,buzzer,0\nC,announce,0\nVolume,volume,1\n";

        let decoded = decode_schema(text);

        let keys: Vec<&str> = decoded.definitions.iter().map(|d| d.key()).collect();
        assert_eq!(keys, ["buzzer", "announce", "volume"]);
        assert_eq!(decoded.skipped.len(), 1);
        assert_eq!(decoded.skipped[0].line(), 1);
    }

    #[test]
    fn test_decode_bytes_skips_invalid_utf8_line() {
        let decoded = decode_schema_bytes(b"A,a,1\n\xff\xfe,b,0\nC,c,0\n");

        let keys: Vec<&str> = decoded.definitions.iter().map(|d| d.key()).collect();
        assert_eq!(keys, ["a", "c"]);
        assert_eq!(decoded.skipped, vec![ParseError::InvalidEncoding { line: 2 }]);
    }

    #[test]
    fn test_decode_record_blank_and_bad_lines() {
        assert_eq!(decode_record("   ", 3), Ok(None));
        assert_eq!(decode_record(",,", 3), Ok(None));
        assert!(matches!(
            decode_record("only,two", 7),
            Err(ParseError::WrongFieldCount { line: 7, found: 2, .. })
        ));
    }
}
