//! Setting definition entity.
//!
//! A [`SettingDefinition`] is one row of the schema: the label shown next to
//! the control, the internal key the value is stored under, and the value the
//! setting takes when nothing has been saved for it yet.
//!
//! Definitions are immutable once built.  The only way to obtain one is
//! through [`SettingDefinition::new`] or [`SettingDefinition::parse`], both of
//! which validate every field, so any definition held by a
//! [`crate::Schema`] is known to be well formed.

use serde::Serialize;

use crate::domain::schema::ValidationError;

/// Characters that may never appear in a setting key.
///
/// `,` and `=` separate the key from the value in the values file, and `"`
/// is the quoting character of the schema file.
pub const FORBIDDEN_KEY_CHARS: [char; 3] = [',', '=', '"'];

/// A named boolean setting: display label, internal key and default value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SettingDefinition {
    display_name: String,
    key: String,
    default_value: bool,
}

impl SettingDefinition {
    /// Builds a definition from already-typed parts.
    ///
    /// Both text fields are trimmed before validation.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyDisplayName`] / [`ValidationError::MultiLineDisplayName`]
    ///   for a blank or multi-line label.
    /// - [`ValidationError::EmptyKey`] / [`ValidationError::InvalidKey`] for a blank
    ///   key or one containing whitespace or a [`FORBIDDEN_KEY_CHARS`] character.
    pub fn new(
        display_name: impl AsRef<str>,
        key: impl AsRef<str>,
        default_value: bool,
    ) -> Result<Self, ValidationError> {
        let display_name = validate_display_name(display_name.as_ref())?;
        let key = validate_key(key.as_ref())?;
        Ok(Self {
            display_name,
            key,
            default_value,
        })
    }

    /// Builds a definition from raw user input, coercing the default value.
    ///
    /// The default accepts `0`/`1`, `off`/`on` and `false`/`true` in any
    /// letter case (see [`parse_bool`]).
    ///
    /// # Errors
    ///
    /// Everything [`SettingDefinition::new`] rejects, plus
    /// [`ValidationError::InvalidDefault`] when the default is not
    /// boolean-coercible.
    pub fn parse(display_name: &str, key: &str, default_value: &str) -> Result<Self, ValidationError> {
        let default_value = parse_bool(default_value)
            .ok_or_else(|| ValidationError::InvalidDefault(default_value.trim().to_string()))?;
        Self::new(display_name, key, default_value)
    }

    /// Human-readable label shown next to the control.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Internal identifier, unique within a schema.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value used when no override has been saved.
    pub fn default_value(&self) -> bool {
        self.default_value
    }

    /// The canonical `0`/`1` form of the default, as written to the schema file.
    pub fn default_flag(&self) -> &'static str {
        if self.default_value {
            "1"
        } else {
            "0"
        }
    }
}

/// Coerces a textual boolean.
///
/// Accepts `1`/`0`, `on`/`off` and `true`/`false`, ignoring surrounding
/// whitespace and letter case.  Anything else yields `None`.
///
/// ```rust
/// use toggle_core::parse_bool;
///
/// assert_eq!(parse_bool("ON"), Some(true));
/// assert_eq!(parse_bool(" 0 "), Some(false));
/// assert_eq!(parse_bool("2"), None);
/// ```
pub fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw == "1" || raw.eq_ignore_ascii_case("on") || raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw == "0" || raw.eq_ignore_ascii_case("off") || raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn validate_display_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyDisplayName);
    }
    if name.contains(['\n', '\r']) {
        return Err(ValidationError::MultiLineDisplayName);
    }
    Ok(name.to_string())
}

fn validate_key(raw: &str) -> Result<String, ValidationError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    if let Some(found) = key
        .chars()
        .find(|c| c.is_whitespace() || FORBIDDEN_KEY_CHARS.contains(c))
    {
        return Err(ValidationError::InvalidKey {
            key: key.to_string(),
            found,
        });
    }
    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_fields() {
        let def = SettingDefinition::new("  Buzzer  ", " buzzer ", false).unwrap();
        assert_eq!(def.display_name(), "Buzzer");
        assert_eq!(def.key(), "buzzer");
        assert!(!def.default_value());
    }

    #[test]
    fn test_new_rejects_empty_display_name() {
        let result = SettingDefinition::new("   ", "buzzer", false);
        assert_eq!(result, Err(ValidationError::EmptyDisplayName));
    }

    #[test]
    fn test_new_rejects_multi_line_display_name() {
        let result = SettingDefinition::new("first\nsecond", "buzzer", false);
        assert_eq!(result, Err(ValidationError::MultiLineDisplayName));
    }

    #[test]
    fn test_new_rejects_empty_key() {
        let result = SettingDefinition::new("Buzzer", "", true);
        assert_eq!(result, Err(ValidationError::EmptyKey));
    }

    #[test]
    fn test_new_rejects_key_with_separator() {
        for bad in ["a,b", "a=b", "a\"b", "a b"] {
            let result = SettingDefinition::new("Label", bad, true);
            assert!(
                matches!(result, Err(ValidationError::InvalidKey { .. })),
                "key {bad:?} must be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_display_name_may_contain_comma() {
        let def = SettingDefinition::new("Volume, master", "volume", true).unwrap();
        assert_eq!(def.display_name(), "Volume, master");
    }

    #[test]
    fn test_parse_coerces_default_value() {
        let on = SettingDefinition::parse("Volume", "volume", "1").unwrap();
        let off = SettingDefinition::parse("Volume", "volume", "Off").unwrap();
        assert!(on.default_value());
        assert!(!off.default_value());
    }

    #[test]
    fn test_parse_rejects_non_boolean_default() {
        let result = SettingDefinition::parse("Volume", "volume", "maybe");
        assert_eq!(
            result,
            Err(ValidationError::InvalidDefault("maybe".to_string()))
        );
    }

    #[test]
    fn test_default_flag_is_canonical() {
        let on = SettingDefinition::new("A", "a", true).unwrap();
        let off = SettingDefinition::new("B", "b", false).unwrap();
        assert_eq!(on.default_flag(), "1");
        assert_eq!(off.default_flag(), "0");
    }

    #[test]
    fn test_parse_bool_accepts_all_spellings() {
        for raw in ["1", "on", "ON", "true", "True"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["0", "off", "OFF", "false", "FALSE"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        for raw in ["", "2", "-1", "yes", "o n"] {
            assert_eq!(parse_bool(raw), None, "{raw}");
        }
    }
}
