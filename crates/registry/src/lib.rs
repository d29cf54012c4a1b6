//! Signature-indexed registries of operation implementations.
//!
//! Each operation (`determinize`, `focus`, ...) owns a [`Registry`] mapping
//! [`Signature`]s to entry points. Missing entries are produced on demand by
//! the [`Specializer`] installed in the [`Registries`] catalogue.

mod entry;
mod error;
mod registries;
mod registry;
mod signature;
mod specializer;
mod value;

#[cfg(test)]
mod tests;

pub use entry::{EntryPoint, Invoke, Operation, RawEntry};
pub use error::DispatchError;
pub use registries::{Registries, registries};
pub use registry::{Registry, debug_enabled, set_debug};
pub use signature::Signature;
pub use specializer::{Request, SpecializeError, Specializer};
pub use value::{AlgoError, Arguments, IntegralConstant, Named, Value};
