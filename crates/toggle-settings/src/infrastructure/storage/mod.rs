//! Storage infrastructure: the schema file, the values file, and the TOML
//! configuration.
//!
//! - `schema_store` – [`SchemaStore`], the file-backed `SchemaRepository`.
//!   Creates the base set on first run.
//! - `values_store` – [`ValuesStore`], the file-backed `ValuesRepository`.
//! - `config`       – Reads the optional `config.toml` that says where the
//!   two files live and which values format to write.
//!
//! Both data files are replaced atomically through [`write_atomic`]: the new
//! content goes to a sibling `*.tmp` file which is then renamed over the
//! target, so a failed write never leaves a half-written file behind.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod config;
pub mod schema_store;
pub mod values_store;

pub use schema_store::{SchemaLoad, SchemaOrigin, SchemaStore};
pub use values_store::ValuesStore;

/// Sibling temporary path used while `path` is being replaced.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("togglekit"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replaces `path` with `bytes` (write to temp, then rename).
///
/// The parent directory is created if missing.
///
/// # Errors
///
/// Returns the underlying I/O error.  The temporary file is removed on a
/// failed rename and the previous content of `path` is left in place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(path);
    {
        let mut file = fs::File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&temp, path) {
        fs::remove_file(&temp).ok();
        return Err(e);
    }
    Ok(())
}
