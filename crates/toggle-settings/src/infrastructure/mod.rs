//! Infrastructure layer for togglekit.
//!
//! Contains the file-system adapters (the schema and values stores, the TOML
//! configuration) and the command bridge used by the front end.
//!
//! **Dependency rule**: this layer may depend on `application` and `toggle_core`,
//! but MUST NOT be imported by the `application` or domain layers.

pub mod storage;
pub mod ui_bridge;
