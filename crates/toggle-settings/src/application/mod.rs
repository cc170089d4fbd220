//! Application layer use cases for togglekit.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules in `toggle_core`) and the infrastructure (files, terminal).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "turn the
//!   buzzer on and save it").
//! - **Depend on abstractions** (the traits in [`ports`]) rather than concrete
//!   stores, so tests can swap in mocks.
//! - **Contain no file system access**.
//!
//! # Sub-modules
//!
//! - **`settings_engine`** – Owns the schema and the live values, accepts
//!   toggles and commits, and emits `ReloadRequired` after a schema change.
//!
//! - **`edit_schema`** – Schema mutations and the `SchemaDraft` used to stage
//!   several of them before one save.
//!
//! - **`ports`** – The `SchemaRepository` / `ValuesRepository` traits and the
//!   `StorageError` they report.

pub mod edit_schema;
pub mod ports;
pub mod settings_engine;

pub use ports::StorageError;
pub use settings_engine::{EngineError, EngineState, ReloadRequired, SettingsEngine};
