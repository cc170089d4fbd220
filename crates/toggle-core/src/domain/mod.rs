//! Domain entities for togglekit.
//!
//! This module holds the pure rules of the settings model and performs no
//! I/O.  Reading and writing files is the job of the `toggle-settings`
//! storage layer; the text formats themselves live in [`crate::format`].
//!
//! - **`definition`** – a single named boolean setting and its field
//!   validation.
//! - **`schema`** – the ordered list of definitions, the protected base set,
//!   and the validated add/remove edits.
//! - **`values`** – the live value of each setting, derived from a schema
//!   and optional saved overrides.

pub mod definition;
pub mod schema;
pub mod values;
