//! Live setting values, keyed by the schema's keys.
//!
//! A [`ValueSet`] is derived from a [`Schema`] and always holds exactly one
//! value per schema key, in schema order.  It is joined to the schema only by
//! key lookup: the definition stays immutable while the value changes.
//!
//! ```text
//! Schema  (count_down:1, buzzer:0, announce:0)
//!    +    overrides from the values file (buzzer → 1, legacy_key → 0)
//!    =    ValueSet (count_down:1, buzzer:1, announce:0)
//! ```
//!
//! Overrides for keys the schema does not define (`legacy_key` above) are
//! ignored, and keys without an override take the schema default.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::schema::Schema;

/// Returned when a key is not part of the schema the value set was derived from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown setting key {0:?}")]
pub struct UnknownKey(pub String);

/// The current value of every setting in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSet {
    entries: Vec<(String, bool)>,
}

impl ValueSet {
    /// Derives values from the schema defaults only.
    pub fn defaults(schema: &Schema) -> Self {
        Self::derive(schema, &HashMap::new())
    }

    /// Derives values from the schema, preferring entries in `overrides`.
    pub fn derive(schema: &Schema, overrides: &HashMap<String, bool>) -> Self {
        let entries = schema
            .definitions()
            .iter()
            .map(|def| {
                let value = overrides
                    .get(def.key())
                    .copied()
                    .unwrap_or(def.default_value());
                (def.key().to_string(), value)
            })
            .collect();
        Self { entries }
    }

    /// Current value of `key`, or `None` if the key is unknown.
    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| *value)
    }

    /// Updates `key` in place and returns its previous value.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownKey`] if `key` is not part of the schema.
    pub fn set(&mut self, key: &str, value: bool) -> Result<bool, UnknownKey> {
        let slot = self
            .entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .ok_or_else(|| UnknownKey(key.to_string()))?;
        Ok(std::mem::replace(&mut slot.1, value))
    }

    /// Iterates `(key, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if this set covers exactly the keys of `schema`, in order.
    pub fn matches_schema(&self, schema: &Schema) -> bool {
        self.len() == schema.len() && self.iter().map(|(k, _)| k).eq(schema.keys())
    }
}
