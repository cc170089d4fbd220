//! Command bridge: exposes application-layer operations to a front end.
//!
//! Every user-facing action (list the settings, toggle some of them, add or
//! remove a definition) is a plain function here that takes the shared
//! [`SettingsSession`] and returns a [`CommandResult`].  The `togglekit`
//! binary is the front end in this repository; an editor window would call
//! the same functions.  This module must NOT be imported by the application
//! or domain layers.
//!
//! # Data Transfer Objects (DTOs)
//!
//! The engine works with internal types (`Schema`, `ValueSet`,
//! `SettingDefinition`) that mix the definitions and the live values.  DTOs
//! are flat structs that:
//!
//! - Contain only JSON-serialisable fields (`String`, `bool`, `usize`).
//! - Join each definition with its current value, numbered from 1 the way
//!   the edit list shows them.
//! - Are defined using `#[derive(Serialize, Deserialize)]` so `show --json`
//!   can print them directly.
//!
//! # `CommandResult<T>` wrapper
//!
//! All commands return `CommandResult<T>` rather than `Result<T, E>`.
//! This ensures every command response has the same shape:
//! `{ success: bool, data: T | null, error: string | null }`.
//!
//! # Schema changes (for beginners)
//!
//! A schema change makes the running engine stale.  The commands that edit
//! the schema receive the engine's `ReloadRequired` signal and pass it
//! straight to [`SettingsSession::reload`], which reloads the schema file and
//! builds a fresh engine.  The caller therefore always sees settings that
//! match the saved schema.
//!
//! A session opened on the in-memory fallback (`SchemaOrigin::Fallback`)
//! refuses schema edits.  Saving would replace a file the session could
//! not read with the base set plus the edit.  Value changes still work.

use serde::{Deserialize, Serialize};
use toggle_core::{parse_bool, ValuesFormat};
use tracing::{info, warn};

use crate::application::edit_schema::SchemaMutation;
use crate::application::settings_engine::{EngineError, ReloadRequired, SettingsEngine};
use crate::infrastructure::storage::config::StorageConfig;
use crate::infrastructure::storage::{SchemaOrigin, SchemaStore, ValuesStore};

// ── Shared session state ──────────────────────────────────────────────────────

/// The two stores plus the engine built from them.
///
/// A session always holds a usable engine.  Problems found while opening it
/// (skipped lines, an unreadable file) are kept in
/// [`SettingsSession::warnings`] instead of aborting.
#[derive(Debug)]
pub struct SettingsSession {
    schema_store: SchemaStore,
    values_store: ValuesStore,
    engine: SettingsEngine,
    origin: SchemaOrigin,
    warnings: Vec<String>,
}

impl SettingsSession {
    /// Opens the files named by `storage`.
    pub fn open(storage: &StorageConfig) -> Self {
        Self::from_stores(
            SchemaStore::new(storage.schema_path()),
            ValuesStore::new(storage.values_path(), storage.values_format),
        )
    }

    /// Loads (or bootstraps) the schema and initializes the engine.
    pub fn from_stores(schema_store: SchemaStore, values_store: ValuesStore) -> Self {
        let (engine, origin, warnings) = Self::build(&schema_store, &values_store);
        Self {
            schema_store,
            values_store,
            engine,
            origin,
            warnings,
        }
    }

    fn build(
        schema_store: &SchemaStore,
        values_store: &ValuesStore,
    ) -> (SettingsEngine, SchemaOrigin, Vec<String>) {
        let load = schema_store.load_or_bootstrap();
        let mut warnings: Vec<String> = load
            .skipped
            .iter()
            .map(|e| format!("{}: {e}", schema_store.path().display()))
            .collect();
        if let Some(e) = &load.error {
            warnings.push(e.to_string());
        }

        let engine = match SettingsEngine::initialize(load.schema.clone(), values_store) {
            Ok(engine) => {
                warnings.extend(
                    engine
                        .skipped_lines()
                        .iter()
                        .map(|e| format!("{}: {e}", values_store.path().display())),
                );
                engine
            }
            Err(e) => {
                warn!("saved values unavailable, using defaults: {e}");
                warnings.push(e.to_string());
                SettingsEngine::with_defaults(load.schema)
            }
        };
        (engine, load.origin, warnings)
    }

    /// Discards the stale engine and rebuilds it from the saved schema.
    pub fn reload(&mut self, _signal: ReloadRequired) {
        info!("reloading settings after a schema change");
        let (engine, origin, warnings) = Self::build(&self.schema_store, &self.values_store);
        self.engine = engine;
        self.origin = origin;
        self.warnings = warnings;
    }

    pub fn engine(&self) -> &SettingsEngine {
        &self.engine
    }

    pub fn origin(&self) -> SchemaOrigin {
        self.origin
    }

    /// Human-readable problems found while opening the session.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn schema_store(&self) -> &SchemaStore {
        &self.schema_store
    }

    pub fn values_store(&self) -> &ValuesStore {
        &self.values_store
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// One setting as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingDto {
    /// 1-based position in the schema.
    pub number: usize,
    pub display_name: String,
    pub key: String,
    pub default_value: bool,
    pub value: bool,
    /// Base entries cannot be removed.
    pub protected: bool,
}

/// A requested value change, as typed by the user (`buzzer=on`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChangeDto {
    pub key: String,
    pub value: String,
}

/// A definition to add, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSettingDto {
    pub display_name: String,
    pub key: String,
    pub default_value: String,
}

/// Where the session's files are and how it was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatusDto {
    pub schema_path: String,
    pub values_path: String,
    pub values_format: ValuesFormat,
    /// `"loaded"`, `"bootstrapped"` or `"fallback"`.
    pub schema_origin: String,
    pub warnings: Vec<String>,
}

/// Unified response wrapper used by all commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn settings_of(engine: &SettingsEngine) -> Vec<SettingDto> {
    let schema = engine.schema();
    schema
        .definitions()
        .iter()
        .enumerate()
        .map(|(index, def)| SettingDto {
            number: index + 1,
            display_name: def.display_name().to_string(),
            key: def.key().to_string(),
            default_value: def.default_value(),
            value: engine.value(def.key()).unwrap_or(def.default_value()),
            protected: schema.is_base_index(index),
        })
        .collect()
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns every setting with its current value, in schema order.
pub fn get_settings(session: &SettingsSession) -> CommandResult<Vec<SettingDto>> {
    CommandResult::ok(settings_of(session.engine()))
}

/// Returns file locations and any problems found while opening the session.
pub fn get_status(session: &SettingsSession) -> CommandResult<SessionStatusDto> {
    let origin = match session.origin() {
        SchemaOrigin::Loaded => "loaded",
        SchemaOrigin::Bootstrapped => "bootstrapped",
        SchemaOrigin::Fallback => "fallback",
    };
    CommandResult::ok(SessionStatusDto {
        schema_path: session.schema_store().path().display().to_string(),
        values_path: session.values_store().path().display().to_string(),
        values_format: session.values_store().format(),
        schema_origin: origin.to_string(),
        warnings: session.warnings().to_vec(),
    })
}

/// Applies value changes and saves every value.
///
/// All changes are checked before any is applied, so a bad key or value
/// leaves both the session and the values file untouched.
pub fn set_values(
    session: &mut SettingsSession,
    changes: Vec<ValueChangeDto>,
) -> CommandResult<Vec<SettingDto>> {
    let mut parsed = Vec::with_capacity(changes.len());
    for change in &changes {
        let Some(value) = parse_bool(&change.value) else {
            return CommandResult::err(format!(
                "invalid value {:?} for {} (expected on/off, 1/0 or true/false)",
                change.value, change.key
            ));
        };
        if session.engine.value(&change.key).is_none() {
            return CommandResult::err(format!("unknown setting key: {}", change.key));
        }
        parsed.push((change.key.as_str(), value));
    }

    for (key, value) in parsed {
        if let Err(e) = session.engine.set_value(key, value) {
            return CommandResult::err(e.to_string());
        }
    }
    if let Err(e) = session.engine.commit_values(&session.values_store) {
        return CommandResult::err(format!("failed to save values: {e}"));
    }
    CommandResult::ok(settings_of(session.engine()))
}

/// Adds a definition, saves the schema, and reloads the session.
pub fn add_setting(
    session: &mut SettingsSession,
    setting: NewSettingDto,
) -> CommandResult<Vec<SettingDto>> {
    let mutation = SchemaMutation::add(setting.display_name, setting.key, setting.default_value);
    apply_schema_change(session, mutation)
}

/// Removes a definition by 1-based number or by key, saves the schema, and
/// reloads the session.
pub fn remove_setting(session: &mut SettingsSession, target: &str) -> CommandResult<Vec<SettingDto>> {
    let target = target.trim();
    let schema = session.engine.schema();
    let index = match target.parse::<usize>() {
        Ok(number) if number >= 1 => number - 1,
        Ok(_) => return CommandResult::err("setting numbers start at 1"),
        Err(_) => match schema.position(target) {
            Some(index) => index,
            None => return CommandResult::err(format!("unknown setting key: {target}")),
        },
    };
    apply_schema_change(session, SchemaMutation::Remove { index })
}

fn apply_schema_change(
    session: &mut SettingsSession,
    mutation: SchemaMutation,
) -> CommandResult<Vec<SettingDto>> {
    if session.origin() == SchemaOrigin::Fallback {
        warn!(
            "refusing schema edit: {} was not loaded",
            session.schema_store.path().display()
        );
        return CommandResult::err(format!(
            "the schema file {} could not be used; fix or remove it before editing the schema",
            session.schema_store.path().display()
        ));
    }

    let result = session
        .engine
        .request_schema_change(&session.schema_store, mutation);
    match result {
        Ok(signal) => {
            session.reload(signal);
            CommandResult::ok(settings_of(session.engine()))
        }
        Err(EngineError::Validation(e)) => CommandResult::err(e.to_string()),
        Err(e) => CommandResult::err(format!("failed to change the schema: {e}")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    /// Creates a session whose files live in a fresh temporary directory so
    /// that tests never touch the working directory.
    fn make_session(dir: &tempfile::TempDir) -> SettingsSession {
        let storage = StorageConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..StorageConfig::default()
        };
        SettingsSession::open(&storage)
    }

    fn change(key: &str, value: &str) -> ValueChangeDto {
        ValueChangeDto {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_get_settings_on_first_run_lists_base_set() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let session = make_session(&dir);

        // Act
        let result = get_settings(&session);

        // Assert
        assert!(result.success);
        let settings = result.data.unwrap();
        let keys: Vec<&str> = settings.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["count_down", "buzzer", "announce"]);
        assert_eq!(settings[0].number, 1);
        assert!(settings.iter().all(|s| s.protected));
        assert_eq!(session.origin(), SchemaOrigin::Bootstrapped);
    }

    #[test]
    fn test_set_values_persists_and_updates_session() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let mut session = make_session(&dir);

        // Act
        let result = set_values(&mut session, vec![change("buzzer", "on")]);

        // Assert
        assert!(result.success, "{:?}", result.error);
        assert_eq!(session.engine().value("buzzer"), Some(true));
        let saved = fs::read_to_string(session.values_store().path()).unwrap();
        assert!(saved.contains("buzzer=ON"));
    }

    #[test]
    fn test_set_values_with_one_bad_entry_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = make_session(&dir);

        let result = set_values(
            &mut session,
            vec![change("buzzer", "on"), change("volume", "on")],
        );

        assert!(!result.success);
        assert_eq!(session.engine().value("buzzer"), Some(false));
        assert!(!session.values_store().path().exists());
    }

    #[test]
    fn test_set_values_rejects_non_boolean() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = make_session(&dir);

        let result = set_values(&mut session, vec![change("buzzer", "maybe")]);

        assert!(!result.success);
        assert!(result.error.unwrap().contains("maybe"));
    }

    #[test]
    fn test_add_setting_reloads_session_with_new_entry() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let mut session = make_session(&dir);

        // Act
        let result = add_setting(
            &mut session,
            NewSettingDto {
                display_name: "Volume".to_string(),
                key: "volume".to_string(),
                default_value: "1".to_string(),
            },
        );

        // Assert
        assert!(result.success, "{:?}", result.error);
        let settings = result.data.unwrap();
        assert_eq!(settings.len(), 4);
        assert_eq!(settings[3].number, 4);
        assert!(settings[3].value);
        assert!(!settings[3].protected);
        assert!(!session.engine().is_stale());
        assert_eq!(session.origin(), SchemaOrigin::Loaded);
    }

    #[test]
    fn test_add_setting_with_duplicate_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = make_session(&dir);

        let result = add_setting(
            &mut session,
            NewSettingDto {
                display_name: "Another buzzer".to_string(),
                key: "buzzer".to_string(),
                default_value: "0".to_string(),
            },
        );

        assert!(!result.success);
        assert_eq!(session.engine().schema().len(), 3);
    }

    #[test]
    fn test_remove_setting_by_number_and_by_key() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let mut session = make_session(&dir);
        for (name, key) in [("Volume", "volume"), ("Vibration", "vibrate")] {
            let added = add_setting(
                &mut session,
                NewSettingDto {
                    display_name: name.to_string(),
                    key: key.to_string(),
                    default_value: "0".to_string(),
                },
            );
            assert!(added.success);
        }

        // Act
        let by_number = remove_setting(&mut session, "4");
        let by_key = remove_setting(&mut session, "vibrate");

        // Assert
        assert!(by_number.success, "{:?}", by_number.error);
        assert!(by_key.success, "{:?}", by_key.error);
        assert_eq!(session.engine().schema().len(), 3);
    }

    #[test]
    fn test_remove_protected_or_unknown_setting_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = make_session(&dir);

        assert!(!remove_setting(&mut session, "1").success);
        assert!(!remove_setting(&mut session, "count_down").success);
        assert!(!remove_setting(&mut session, "0").success);
        assert!(!remove_setting(&mut session, "volume").success);
        assert_eq!(session.engine().schema().len(), 3);
    }

    #[test]
    fn test_schema_edits_are_refused_on_fallback() {
        // Arrange: two valid lines are not enough for a schema
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("item_config_memory.txt");
        let content = "A,count_down,1\nVolume,volume,1\n";
        fs::write(&schema_path, content).unwrap();
        let mut session = make_session(&dir);

        // Act
        let added = add_setting(
            &mut session,
            NewSettingDto {
                display_name: "Vibration".to_string(),
                key: "vibrate".to_string(),
                default_value: "0".to_string(),
            },
        );

        // Assert
        assert_eq!(session.origin(), SchemaOrigin::Fallback);
        assert!(!added.success);
        assert!(added.error.unwrap().contains("could not be used"));
        assert!(!session.engine().is_stale());
        assert_eq!(fs::read_to_string(&schema_path).unwrap(), content);
    }

    #[test]
    fn test_values_can_still_be_set_on_fallback() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("item_config_memory.txt")).unwrap();
        let mut session = make_session(&dir);

        let result = set_values(&mut session, vec![change("buzzer", "on")]);

        assert_eq!(session.origin(), SchemaOrigin::Fallback);
        assert!(result.success, "{:?}", result.error);
        assert_eq!(session.engine().value("buzzer"), Some(true));
    }

    #[test]
    fn test_get_status_reports_paths_and_warnings() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("count_down_settei.txt"), "buzzer,1\ngarbage\n").unwrap();

        // Act
        let session = make_session(&dir);
        let status = get_status(&session).data.unwrap();

        // Assert
        assert!(status.values_path.ends_with("count_down_settei.txt"));
        assert_eq!(status.values_format, ValuesFormat::OnOff);
        assert_eq!(status.schema_origin, "bootstrapped");
        assert_eq!(status.warnings.len(), 1);
        assert_eq!(session.engine().value("buzzer"), Some(true));
    }

    #[test]
    fn test_command_result_ok_sets_success_true() {
        let r: CommandResult<i32> = CommandResult::ok(42);
        assert!(r.success);
        assert_eq!(r.data.unwrap(), 42);
        assert!(r.error.is_none());
    }

    #[test]
    fn test_command_result_err_sets_success_false() {
        let r: CommandResult<i32> = CommandResult::err("something went wrong");
        assert!(!r.success);
        assert!(r.data.is_none());
        assert_eq!(r.error.unwrap(), "something went wrong");
    }
}
