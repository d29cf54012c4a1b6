//! Native specialization backend.
//!
//! On a registry miss, [`NativeSpecializer`] generates a Rust source file
//! instantiating the requested operation for the requested types, builds it
//! into a dynamic library with `rustc`, and loads it; the library's
//! registration entry point then fills the registries.
//!
//! Everything lives under the plugin directory (`$VCSN_PLUGINDIR`, default
//! `$VCSN_HOME/plugins`):
//!
//! ```text
//! algos/<operation>/<signature>.rs    generated source
//! algos/<operation>/<signature>.so    built module
//! contexts/<context>.rs
//! contexts/<context>.so
//! ```

pub mod config;
pub mod diagnostics;
mod error;
pub mod loader;
pub mod paths;
mod specializer;
pub mod toolchain;
pub mod translate;

pub use config::{ConfigError, JitConfig};
pub use error::{JitError, Result};
pub use loader::{DylibLoader, LoadError, LoadReport, ModuleLoader};
pub use specializer::NativeSpecializer;
pub use toolchain::{BuildJob, Rustc, Toolchain};
pub use translate::GeneratedUnit;
