//! # toggle-core
//!
//! Shared library for togglekit containing the settings domain model and the
//! text codecs for its two persisted files.
//!
//! It performs no file or process I/O; the `toggle-settings` crate owns the
//! storage adapters, the settings engine, and the command-line front end.
//!
//! # Architecture overview (for beginners)
//!
//! Togglekit manages a list of named on/off settings.  The *list itself* can
//! be edited (settings added or removed), so the model is split in two:
//!
//! - **`domain`** – The rules.  A [`Schema`] is the ordered list of
//!   [`SettingDefinition`]s (label, key, default) and always begins with a
//!   protected base set.  A [`ValueSet`] holds the current value of every
//!   key in one schema.
//!
//! - **`format`** – How both halves look on disk.  The schema file stores
//!   `display_name,key,default` records; the values file stores `key=ON` or
//!   `key,1` records.  Decoding is line-tolerant: a broken line is reported
//!   and skipped, never fatal.

pub mod domain;
pub mod format;

// Re-export the most-used types at the crate root so callers can write
// `toggle_core::Schema` instead of `toggle_core::domain::schema::Schema`.
pub use domain::definition::{parse_bool, SettingDefinition, FORBIDDEN_KEY_CHARS};
pub use domain::schema::{Schema, ValidationError, BASE_DEFINITIONS};
pub use domain::values::{UnknownKey, ValueSet};
pub use format::schema_file::{
    decode_schema, decode_schema_bytes, encode_schema, DecodedSchema, EncodeError,
};
pub use format::values_file::{
    decode_values, decode_values_bytes, encode_values, DecodedValues, UnknownValuesFormat,
    ValuesFormat,
};
pub use format::ParseError;
