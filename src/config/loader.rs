// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{Manifest, RawManifest};
use crate::errors::Result;

/// Read and deserialize a manifest without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawManifest> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let manifest: RawManifest = toml::from_str(&contents)?;

    Ok(manifest)
}

/// Read a manifest and validate it.
///
/// This is the entry point the rest of the crate uses:
///
/// - Reads TOML.
/// - Applies `[runner]` defaults.
/// - Resolves parameter type tags and checks flags, indices and values.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Manifest> {
    let raw = load_from_path(&path)?;
    let manifest = Manifest::try_from(raw)?;
    Ok(manifest)
}
