//! Model persistence.
//!
//! Artifacts use the native `.mrec` format: a fixed header (magic, version, model type,
//! payload size, CRC32, shape) followed by a Postcard payload that carries the model, its
//! training metadata and the input schema it expects.
//!
//! - [`save`] / [`load`]: file-level entry points
//! - [`to_bytes`] / [`from_bytes`]: in-memory equivalents
//!
//! Loading validates every table length against the frozen encoders before any model is
//! constructed, so a loaded model is always safe to predict with.

mod convert;
pub mod native;
pub mod payload;

use std::path::Path;

use tempfile::NamedTempFile;

pub use convert::{from_bytes, load, save, to_bytes};
pub use native::{
    DeserializeError, FormatHeader, HEADER_SIZE, MAGIC, ModelType, NativeCodec, SerializeError,
};
pub use payload::Payload;

/// Write `dest`'s future content into a temporary file next to it.
///
/// Nothing is visible at `dest` until [`commit`] renames the file into place.
pub(crate) fn stage<F, E>(dest: &Path, write: F) -> crate::Result<NamedTempFile>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), E>,
    crate::Error: From<E>,
{
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    write(&mut file)?;
    file.as_file().sync_all()?;
    Ok(file)
}

/// Atomically replace `dest` with a staged file.
pub(crate) fn commit(file: NamedTempFile, dest: &Path) -> crate::Result<()> {
    file.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
