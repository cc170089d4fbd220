//! The settings schema: an ordered list of setting definitions.
//!
//! A [`Schema`] always starts with the **base set**, the fixed minimum group
//! of definitions that every installation has.  Base entries occupy the
//! leading positions of the schema and can never be removed; user edits may
//! only append definitions after them or remove definitions they appended.
//!
//! # Edits return new schemas
//!
//! [`Schema::add_definition`] and [`Schema::remove_definition`] take `&self`
//! and return a fresh `Schema` on success.  On failure the original is
//! untouched, so a rejected edit can never leave a half-modified schema
//! behind.
//!
//! ```rust
//! use toggle_core::Schema;
//!
//! let schema = Schema::base();
//! let edited = schema.add_definition("Volume", "volume", "1").unwrap();
//! assert_eq!(schema.len(), 3);
//! assert_eq!(edited.len(), 4);
//! assert!(edited.remove_definition(0).is_err()); // base entry
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::domain::definition::SettingDefinition;

/// The built-in definitions every schema starts with:
/// `(display_name, key, default_value)`.
///
/// The labels are the ones existing schema files already carry, so a file
/// bootstrapped here matches one written by the timer application.
pub const BASE_DEFINITIONS: [(&str, &str, bool); 3] = [
    ("再開時のカウントダウン", "count_down", true),
    ("カウント時のブザー音", "buzzer", false),
    ("途中のアナウンス", "announce", false),
];

/// Errors raised by schema edits and definition validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The display name was blank after trimming.
    #[error("display name must not be empty")]
    EmptyDisplayName,

    /// The display name spans more than one line.
    #[error("display name must fit on a single line")]
    MultiLineDisplayName,

    /// The key was blank after trimming.
    #[error("key must not be empty")]
    EmptyKey,

    /// The key contains whitespace or a record separator.
    #[error("key {key:?} contains forbidden character {found:?}")]
    InvalidKey { key: String, found: char },

    /// The default value could not be coerced to a boolean.
    #[error("default value {0:?} must be 0/1, off/on or false/true")]
    InvalidDefault(String),

    /// Another definition already uses this key.
    #[error("key {0:?} is already defined")]
    DuplicateKey(String),

    /// The index points at a base-set entry.
    #[error("entry {index} belongs to the base set and cannot be removed")]
    ProtectedEntry { index: usize },

    /// The edit would leave fewer definitions than the base set holds.
    #[error("the schema cannot hold fewer than {base} definitions")]
    BelowBaseCardinality { base: usize },

    /// The index is past the end of the schema.
    #[error("no definition at index {index} (schema has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Ordered, validated list of setting definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    definitions: Vec<SettingDefinition>,
}

impl Schema {
    /// Returns a schema holding exactly the base set.
    pub fn base() -> Self {
        Self {
            definitions: base_definitions(),
        }
    }

    /// Number of leading, protected definitions.
    pub const fn base_len() -> usize {
        BASE_DEFINITIONS.len()
    }

    /// Builds a schema from a list of definitions, such as the ones decoded
    /// from the schema file.
    ///
    /// The first [`Schema::base_len`] entries become the protected base
    /// positions.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::BelowBaseCardinality`] if fewer definitions than
    ///   the base set are supplied.
    /// - [`ValidationError::DuplicateKey`] if two definitions share a key.
    pub fn from_definitions(definitions: Vec<SettingDefinition>) -> Result<Self, ValidationError> {
        if definitions.len() < Self::base_len() {
            return Err(ValidationError::BelowBaseCardinality {
                base: Self::base_len(),
            });
        }
        let mut seen = HashSet::with_capacity(definitions.len());
        for def in &definitions {
            if !seen.insert(def.key()) {
                return Err(ValidationError::DuplicateKey(def.key().to_string()));
            }
        }
        Ok(Self { definitions })
    }

    /// All definitions in display order.
    pub fn definitions(&self) -> &[SettingDefinition] {
        &self.definitions
    }

    /// Iterates over the keys in display order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(SettingDefinition::key)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Always `false`: a schema holds at least the base set.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns `true` if `index` is one of the protected base positions.
    pub fn is_base_index(&self, index: usize) -> bool {
        index < Self::base_len()
    }

    /// Looks up a definition by key.
    pub fn get(&self, key: &str) -> Option<&SettingDefinition> {
        self.definitions.iter().find(|d| d.key() == key)
    }

    /// Returns the position of `key`, if defined.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.definitions.iter().position(|d| d.key() == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Validates raw input and appends the resulting definition.
    ///
    /// # Errors
    ///
    /// Any field error from [`SettingDefinition::parse`], or
    /// [`ValidationError::DuplicateKey`] if the key is already in use.
    pub fn add_definition(
        &self,
        display_name: &str,
        key: &str,
        default_value: &str,
    ) -> Result<Self, ValidationError> {
        let definition = SettingDefinition::parse(display_name, key, default_value)?;
        self.with_definition(definition)
    }

    /// Appends an already-validated definition.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateKey`] if the key is already in use.
    pub fn with_definition(&self, definition: SettingDefinition) -> Result<Self, ValidationError> {
        if self.contains_key(definition.key()) {
            return Err(ValidationError::DuplicateKey(definition.key().to_string()));
        }
        let mut definitions = self.definitions.clone();
        definitions.push(definition);
        Ok(Self { definitions })
    }

    /// Removes the definition at `index`.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::IndexOutOfRange`] if `index >= len()`.
    /// - [`ValidationError::ProtectedEntry`] if `index` is a base position.
    /// - [`ValidationError::BelowBaseCardinality`] if the schema would end up
    ///   smaller than the base set.
    pub fn remove_definition(&self, index: usize) -> Result<Self, ValidationError> {
        if index >= self.len() {
            return Err(ValidationError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        if self.is_base_index(index) {
            return Err(ValidationError::ProtectedEntry { index });
        }
        if self.len() <= Self::base_len() {
            return Err(ValidationError::BelowBaseCardinality {
                base: Self::base_len(),
            });
        }
        let mut definitions = self.definitions.clone();
        definitions.remove(index);
        Ok(Self { definitions })
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::base()
    }
}

fn base_definitions() -> Vec<SettingDefinition> {
    BASE_DEFINITIONS
        .iter()
        .filter_map(|(name, key, default)| SettingDefinition::new(name, key, *default).ok())
        .collect()
}
