//! Storage ports the use cases depend on.
//!
//! The settings engine never touches the file system directly.  It talks to
//! the two stores through these traits, and the infrastructure layer supplies
//! the file-backed implementations (`SchemaStore`, `ValuesStore`).  Unit tests
//! substitute `mockall` mocks.

use std::path::PathBuf;

use thiserror::Error;
use toggle_core::{DecodedValues, Schema, ValidationError, ValueSet};

/// A store could not be read or written.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file (or its directory) could not be written.
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory data could not be serialised.
    #[error("cannot encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: toggle_core::EncodeError,
    },

    /// The file was read but its valid records do not form a usable schema.
    /// The file is left as it is.
    #[error("cannot use {path}: {source}")]
    Unusable {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

impl StorageError {
    /// Path of the file the failure refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. }
            | Self::Write { path, .. }
            | Self::Encode { path, .. }
            | Self::Unusable { path, .. } => path,
        }
    }
}

/// Durable home of the schema.
#[cfg_attr(test, mockall::automock)]
pub trait SchemaRepository {
    /// Replaces the stored schema with `schema` in full.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails; the previous schema must
    /// then still be intact.
    fn save(&self, schema: &Schema) -> Result<(), StorageError>;
}

/// Durable home of the saved setting values.
#[cfg_attr(test, mockall::automock)]
pub trait ValuesRepository {
    /// Reads the saved overrides.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the file exists but cannot be read.
    fn load(&self) -> Result<Option<DecodedValues>, StorageError>;

    /// Replaces the saved values with one record per key of `values`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the write fails.
    fn store(&self, values: &ValueSet) -> Result<(), StorageError>;
}
