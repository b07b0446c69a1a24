// src/config/mod.rs

//! Module manifest: which executable to run, its parameter schema, the
//! current values and runner settings, read from TOML.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{Manifest, ModuleSection, RawManifest, RawParameter, RunnerSection};
