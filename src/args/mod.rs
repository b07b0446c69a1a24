// src/args/mod.rs

//! Turning a parameter schema plus current values into a command line.
//!
//! - [`descriptor`] holds [`ParameterDescriptor`], one entry of a module's
//!   parameter schema.
//! - [`builder`] renders descriptors + values into ordered argv tokens.
//! - [`invocation`] bundles the executable and its argv into an immutable
//!   [`TaskDescriptor`].

pub mod builder;
pub mod descriptor;
pub mod invocation;

pub use builder::{ParameterValues, build_arguments};
pub use descriptor::ParameterDescriptor;
pub use invocation::TaskDescriptor;
