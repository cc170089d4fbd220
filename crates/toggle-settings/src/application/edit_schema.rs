//! EditSchemaUseCase: staged, validated edits to the settings schema.
//!
//! A [`SchemaDraft`] is a working copy of the schema.  The operator can add
//! and remove several definitions against it; each edit is validated on the
//! spot and a rejected edit leaves the draft as it was.  Nothing reaches the
//! disk until the draft is handed to
//! [`SettingsEngine::commit_draft`](crate::application::settings_engine::SettingsEngine::commit_draft).
//! Dropping the draft discards every staged edit.
//!
//! A draft remembers the schema it was started from.  The engine only
//! commits a draft whose starting point is its own schema, so edits staged
//! against some other schema cannot overwrite the file.
//!
//! ```text
//!  engine.schema() ──clone──► SchemaDraft ──add/remove…──► commit_draft ──► ReloadRequired
//!                                   │
//!                                   └── drop ──► nothing changes
//! ```

use toggle_core::{Schema, ValidationError};

/// A single schema edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaMutation {
    /// Append a new definition built from raw user input.
    Add {
        display_name: String,
        key: String,
        default_value: String,
    },
    /// Remove the definition at a 0-based position.
    Remove { index: usize },
}

impl SchemaMutation {
    /// Convenience constructor for [`SchemaMutation::Add`].
    pub fn add(
        display_name: impl Into<String>,
        key: impl Into<String>,
        default_value: impl Into<String>,
    ) -> Self {
        Self::Add {
            display_name: display_name.into(),
            key: key.into(),
            default_value: default_value.into(),
        }
    }

    /// Applies the edit to `schema`, returning the edited copy.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] raised by the underlying schema edit.
    pub fn apply(&self, schema: &Schema) -> Result<Schema, ValidationError> {
        match self {
            Self::Add {
                display_name,
                key,
                default_value,
            } => schema.add_definition(display_name, key, default_value),
            Self::Remove { index } => schema.remove_definition(*index),
        }
    }
}

/// Working copy of a schema that accumulates validated edits.
#[derive(Debug, Clone)]
pub struct SchemaDraft {
    base: Schema,
    schema: Schema,
    edits: usize,
}

impl SchemaDraft {
    /// Starts a draft from the current schema.
    pub fn new(schema: &Schema) -> Self {
        Self {
            base: schema.clone(),
            schema: schema.clone(),
            edits: 0,
        }
    }

    /// The schema the draft was started from.
    pub fn base(&self) -> &Schema {
        &self.base
    }

    /// Whether the draft was started from `schema`.
    pub fn is_based_on(&self, schema: &Schema) -> bool {
        &self.base == schema
    }

    /// Applies one edit to the draft.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] and leaves the draft unchanged if the edit
    /// is rejected.
    pub fn apply(&mut self, mutation: &SchemaMutation) -> Result<(), ValidationError> {
        self.schema = mutation.apply(&self.schema)?;
        self.edits += 1;
        Ok(())
    }

    /// Stages an addition.  See [`Schema::add_definition`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the definition is invalid or its key is taken.
    pub fn add(
        &mut self,
        display_name: &str,
        key: &str,
        default_value: &str,
    ) -> Result<(), ValidationError> {
        self.apply(&SchemaMutation::add(display_name, key, default_value))
    }

    /// Stages a removal.  See [`Schema::remove_definition`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for base entries and out-of-range indices.
    pub fn remove(&mut self, index: usize) -> Result<(), ValidationError> {
        self.apply(&SchemaMutation::Remove { index })
    }

    /// The schema as it would be saved.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of edits accepted so far.
    pub fn edit_count(&self) -> usize {
        self.edits
    }

    pub fn is_modified(&self) -> bool {
        self.edits > 0
    }

    pub fn into_schema(self) -> Schema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_starts_unmodified() {
        let draft = SchemaDraft::new(&Schema::base());
        assert!(!draft.is_modified());
        assert_eq!(draft.schema(), &Schema::base());
    }

    #[test]
    fn test_draft_accumulates_edits() {
        // Arrange
        let mut draft = SchemaDraft::new(&Schema::base());

        // Act
        draft.add("Volume", "volume", "1").unwrap();
        draft.add("Vibration", "vibrate", "0").unwrap();
        draft.remove(3).unwrap();

        // Assert
        let keys: Vec<&str> = draft.schema().keys().collect();
        assert_eq!(keys, ["count_down", "buzzer", "announce", "vibrate"]);
        assert_eq!(draft.edit_count(), 3);
    }

    #[test]
    fn test_rejected_edit_leaves_draft_unchanged() {
        let mut draft = SchemaDraft::new(&Schema::base());
        draft.add("Volume", "volume", "1").unwrap();
        let before = draft.schema().clone();

        let dup = draft.add("Volume again", "volume", "0");
        let base = draft.remove(1);

        assert_eq!(dup, Err(ValidationError::DuplicateKey("volume".to_string())));
        assert_eq!(base, Err(ValidationError::ProtectedEntry { index: 1 }));
        assert_eq!(draft.schema(), &before);
        assert_eq!(draft.edit_count(), 1);
    }

    #[test]
    fn test_draft_does_not_touch_source_schema() {
        let source = Schema::base();
        let mut draft = SchemaDraft::new(&source);
        draft.add("Volume", "volume", "1").unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(draft.into_schema().len(), 4);
    }

    #[test]
    fn test_draft_remembers_its_starting_schema() {
        // Arrange
        let source = Schema::base();
        let other = source.add_definition("Volume", "volume", "1").unwrap();

        // Act
        let mut draft = SchemaDraft::new(&source);
        draft.add("Vibration", "vibrate", "0").unwrap();

        // Assert
        assert_eq!(draft.base(), &source);
        assert!(draft.is_based_on(&source));
        assert!(!draft.is_based_on(&other));
    }

    #[test]
    fn test_mutation_apply_add_and_remove() {
        let added = SchemaMutation::add("Volume", "volume", "1")
            .apply(&Schema::base())
            .unwrap();
        let removed = SchemaMutation::Remove { index: 3 }.apply(&added).unwrap();
        assert_eq!(added.len(), 4);
        assert_eq!(removed, Schema::base());
    }
}
