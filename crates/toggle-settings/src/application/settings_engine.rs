//! SettingsEngineUseCase: live setting values bridged to the schema.
//!
//! The [`SettingsEngine`] owns one [`Schema`] and the [`ValueSet`] derived
//! from it.  It answers "what is every setting currently set to", accepts
//! toggles, writes values back on commit, and turns schema edits into a
//! [`ReloadRequired`] signal.
//!
//! # Engine lifecycle (for beginners)
//!
//! ```text
//!             initialize               commit_draft / request_schema_change
//!  (nothing) ───────────►  Ready  ─────────────────────────────────────────►  Stale
//!                          │  ▲
//!                          └──┘ set_value, commit_values
//! ```
//!
//! - There is no engine before `initialize`: the *uninitialized* state is
//!   simply the absence of a value of this type.
//! - `Ready`: values match the schema; toggles and commits are accepted.
//! - `Stale`: a new schema has been saved, so the in-memory values describe
//!   a schema that no longer exists.  Every further operation is refused with
//!   [`EngineError::Stale`].  The caller must discard this engine, reload the
//!   schema, and call [`SettingsEngine::initialize`] again.
//!
//! The engine never patches a running value set to fit a new schema.  A
//! fresh `initialize` handles new keys (they take their default) and removed
//! keys (their saved overrides are ignored) in one place.

use thiserror::Error;
use toggle_core::{ParseError, Schema, UnknownKey, ValidationError, ValueSet};
use tracing::{debug, info};

use crate::application::edit_schema::{SchemaDraft, SchemaMutation};
use crate::application::ports::{SchemaRepository, StorageError, ValuesRepository};

/// Error type for settings engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The key is not part of the engine's schema.
    #[error(transparent)]
    UnknownKey(#[from] UnknownKey),

    /// The schema changed after this engine was initialized.
    #[error("the schema has changed; settings must be re-initialized")]
    Stale,

    /// A schema edit was rejected.
    #[error("schema change rejected: {0}")]
    Validation(#[from] ValidationError),

    /// The draft was started from a schema other than the engine's.
    #[error("the draft was not started from this engine's schema")]
    DraftMismatch,

    /// A store could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Where an engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Values match the schema.
    Ready,
    /// A new schema has been saved; this engine must be replaced.
    Stale,
}

/// Signal that a new schema has been persisted and the current values are
/// stale.
///
/// The receiver is responsible for discarding the engine and running
/// [`SettingsEngine::initialize`] against the new schema, whether by
/// restarting the process or by rebuilding the engine in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the engine is stale until it is re-initialized"]
pub struct ReloadRequired;

/// Owns the schema and the live values derived from it.
#[derive(Debug)]
pub struct SettingsEngine {
    schema: Schema,
    values: ValueSet,
    state: EngineState,
    skipped: Vec<ParseError>,
}

impl SettingsEngine {
    /// Derives the initial values for `schema`.
    ///
    /// Each key takes its saved value if `store` has one, otherwise its
    /// schema default.  Saved keys the schema does not define are ignored,
    /// and malformed lines are skipped (see [`SettingsEngine::skipped_lines`]).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if the values file exists but cannot
    /// be read.  [`SettingsEngine::with_defaults`] is the fallback for that case.
    pub fn initialize(schema: Schema, store: &dyn ValuesRepository) -> Result<Self, EngineError> {
        let (values, skipped) = match store.load()? {
            Some(decoded) => {
                debug!(
                    "loaded {} saved values ({} lines skipped)",
                    decoded.overrides.len(),
                    decoded.skipped.len()
                );
                (ValueSet::derive(&schema, &decoded.overrides), decoded.skipped)
            }
            None => {
                debug!("no saved values; using schema defaults");
                (ValueSet::defaults(&schema), Vec::new())
            }
        };
        info!("settings initialized for {} definitions", schema.len());
        Ok(Self {
            schema,
            values,
            state: EngineState::Ready,
            skipped,
        })
    }

    /// Builds an engine from the schema defaults without reading any store.
    pub fn with_defaults(schema: Schema) -> Self {
        let values = ValueSet::defaults(&schema);
        Self {
            schema,
            values,
            state: EngineState::Ready,
            skipped: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn values(&self) -> &ValueSet {
        &self.values
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_stale(&self) -> bool {
        self.state == EngineState::Stale
    }

    /// Values-file lines that were skipped during [`SettingsEngine::initialize`].
    pub fn skipped_lines(&self) -> &[ParseError] {
        &self.skipped
    }

    /// Current value of `key`, or `None` if the key is unknown.
    pub fn value(&self, key: &str) -> Option<bool> {
        self.values.get(key)
    }

    /// Updates one value in memory.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Stale`] after a schema change.
    /// - [`EngineError::UnknownKey`] if `key` is not in the schema.
    pub fn set_value(&mut self, key: &str, value: bool) -> Result<(), EngineError> {
        self.ensure_ready()?;
        let previous = self.values.set(key, value)?;
        if previous != value {
            debug!("setting {key} changed to {value}");
        }
        Ok(())
    }

    /// Writes every current value to `store`, replacing what was there.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Stale`] after a schema change.
    /// - [`EngineError::Storage`] if the write fails.
    pub fn commit_values(&self, store: &dyn ValuesRepository) -> Result<(), EngineError> {
        self.ensure_ready()?;
        store.store(&self.values)?;
        info!("committed {} setting values", self.values.len());
        Ok(())
    }

    /// Applies one schema edit, saves the result, and marks the engine stale.
    ///
    /// # Errors
    ///
    /// See [`SettingsEngine::commit_draft`].
    pub fn request_schema_change(
        &mut self,
        store: &dyn SchemaRepository,
        mutation: SchemaMutation,
    ) -> Result<ReloadRequired, EngineError> {
        self.ensure_ready()?;
        let mut draft = SchemaDraft::new(&self.schema);
        draft.apply(&mutation)?;
        self.commit_draft(store, draft)
    }

    /// Applies several schema edits as one batch.
    ///
    /// Either every edit is accepted and the result is saved once, or nothing
    /// is saved and the engine stays `Ready`.
    ///
    /// # Errors
    ///
    /// Returns the first [`EngineError::Validation`] raised by an edit, or
    /// any error from [`SettingsEngine::commit_draft`].
    pub fn request_schema_changes(
        &mut self,
        store: &dyn SchemaRepository,
        mutations: &[SchemaMutation],
    ) -> Result<ReloadRequired, EngineError> {
        self.ensure_ready()?;
        let mut draft = SchemaDraft::new(&self.schema);
        for mutation in mutations {
            draft.apply(mutation)?;
        }
        self.commit_draft(store, draft)
    }

    /// Starts a draft of the engine's current schema.
    pub fn draft(&self) -> SchemaDraft {
        SchemaDraft::new(&self.schema)
    }

    /// Saves a drafted schema and marks the engine stale.
    ///
    /// The draft is saved as a whole.  If saving fails the engine stays
    /// `Ready` and its schema and values are untouched.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Stale`] if a schema change was already committed.
    /// - [`EngineError::DraftMismatch`] if the draft was not started from
    ///   this engine's schema; nothing is saved.
    /// - [`EngineError::Storage`] if the schema could not be saved.
    pub fn commit_draft(
        &mut self,
        store: &dyn SchemaRepository,
        draft: SchemaDraft,
    ) -> Result<ReloadRequired, EngineError> {
        self.ensure_ready()?;
        if !draft.is_based_on(&self.schema) {
            return Err(EngineError::DraftMismatch);
        }
        let edits = draft.edit_count();
        let schema = draft.into_schema();
        store.save(&schema)?;
        self.state = EngineState::Stale;
        info!(
            "schema saved with {} definitions after {edits} edit(s); reload required",
            schema.len()
        );
        Ok(ReloadRequired)
    }

    fn ensure_ready(&self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Ready => Ok(()),
            EngineState::Stale => Err(EngineError::Stale),
        }
    }
}
