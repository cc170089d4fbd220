//! File-backed schema store.
//!
//! The schema file lists one definition per line (see
//! [`toggle_core::decode_schema`]).  On first run the file does not exist
//! yet, so [`SchemaStore::load_or_bootstrap`] writes the base set and returns
//! it.
//!
//! # Load outcomes
//!
//! | File state                            | Result                           |
//! |---------------------------------------|----------------------------------|
//! | missing                               | base set written, `Bootstrapped` |
//! | no valid definitions                  | base set written, `Bootstrapped` |
//! | some, but fewer than the base set     | in-memory base set, `Fallback`   |
//! | readable with enough valid lines      | parsed schema, `Loaded`          |
//! | unreadable, or bootstrap unwritable   | in-memory base set, `Fallback`   |
//!
//! Loading never fails outright: the caller always gets a usable schema,
//! and a storage failure travels alongside it in [`SchemaLoad::error`].
//! A file that still holds any valid definition is never overwritten by a
//! load.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use toggle_core::{decode_schema_bytes, encode_schema, ParseError, Schema};
use tracing::{debug, error, info, warn};

use crate::application::ports::{SchemaRepository, StorageError};
use crate::infrastructure::storage::write_atomic;

/// How the schema returned by [`SchemaStore::load_or_bootstrap`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOrigin {
    /// Parsed from the schema file.
    Loaded,
    /// The base set, freshly written to the schema file.
    Bootstrapped,
    /// The base set, held in memory only because the file could not be used.
    Fallback,
}

/// Outcome of [`SchemaStore::load_or_bootstrap`].
#[derive(Debug)]
pub struct SchemaLoad {
    pub schema: Schema,
    pub origin: SchemaOrigin,
    /// Schema-file lines that were skipped while parsing.
    pub skipped: Vec<ParseError>,
    /// The storage failure behind a [`SchemaOrigin::Fallback`].
    pub error: Option<StorageError>,
}

impl SchemaLoad {
    fn fallback(error: StorageError, skipped: Vec<ParseError>) -> Self {
        error!("using the built-in settings for this session: {error}");
        Self {
            schema: Schema::base(),
            origin: SchemaOrigin::Fallback,
            skipped,
            error: Some(error),
        }
    }
}

/// Reads and writes the schema file at a fixed path.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    path: PathBuf,
}

impl SchemaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the schema, creating the file with the base set when needed.
    pub fn load_or_bootstrap(&self) -> SchemaLoad {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no schema file at {}; creating the base set", self.path.display());
                return self.bootstrap(Vec::new());
            }
            Err(source) => {
                return SchemaLoad::fallback(
                    StorageError::Read {
                        path: self.path.clone(),
                        source,
                    },
                    Vec::new(),
                );
            }
        };

        let decoded = decode_schema_bytes(&content);
        if decoded.definitions.is_empty() {
            warn!(
                "schema file {} holds no valid definitions; recreating the base set",
                self.path.display()
            );
            return self.bootstrap(decoded.skipped);
        }

        match Schema::from_definitions(decoded.definitions) {
            Ok(schema) => {
                debug!(
                    "loaded {} definitions from {}",
                    schema.len(),
                    self.path.display()
                );
                SchemaLoad {
                    schema,
                    origin: SchemaOrigin::Loaded,
                    skipped: decoded.skipped,
                    error: None,
                }
            }
            Err(source) => SchemaLoad::fallback(
                StorageError::Unusable {
                    path: self.path.clone(),
                    source,
                },
                decoded.skipped,
            ),
        }
    }

    fn bootstrap(&self, skipped: Vec<ParseError>) -> SchemaLoad {
        let schema = Schema::base();
        match self.write(&schema) {
            Ok(()) => SchemaLoad {
                schema,
                origin: SchemaOrigin::Bootstrapped,
                skipped,
                error: None,
            },
            Err(e) => SchemaLoad::fallback(e, skipped),
        }
    }

    fn write(&self, schema: &Schema) -> Result<(), StorageError> {
        let bytes = encode_schema(schema).map_err(|source| StorageError::Encode {
            path: self.path.clone(),
            source,
        })?;
        write_atomic(&self.path, &bytes).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(
            "wrote {} definitions to {}",
            schema.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl SchemaRepository for SchemaStore {
    fn save(&self, schema: &Schema) -> Result<(), StorageError> {
        self.write(schema)
    }
}
