//! File-backed values store.
//!
//! Reads accept both record forms; writes use the [`ValuesFormat`] the store
//! was built with.  A missing file simply means nothing has been saved yet.
//!
//! The file is read as raw bytes and checked for UTF-8 one line at a time,
//! so a single corrupted line never hides the values around it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use toggle_core::{decode_values_bytes, encode_values, DecodedValues, ValueSet, ValuesFormat};
use tracing::{debug, info};

use crate::application::ports::{StorageError, ValuesRepository};
use crate::infrastructure::storage::write_atomic;

/// Reads and writes the values file at a fixed path.
#[derive(Debug, Clone)]
pub struct ValuesStore {
    path: PathBuf,
    format: ValuesFormat,
}

impl ValuesStore {
    pub fn new(path: impl Into<PathBuf>, format: ValuesFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ValuesFormat {
        self.format
    }
}

impl ValuesRepository for ValuesStore {
    fn load(&self) -> Result<Option<DecodedValues>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(content) => Ok(Some(decode_values_bytes(&content))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no values file at {}", self.path.display());
                Ok(None)
            }
            Err(source) => Err(StorageError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn store(&self, values: &ValueSet) -> Result<(), StorageError> {
        let text = encode_values(values, self.format);
        write_atomic(&self.path, text.as_bytes()).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(
            "wrote {} values to {} ({})",
            values.len(),
            self.path.display(),
            self.format
        );
        Ok(())
    }
}
