//! Context descriptors for the dyn runtime.
//!
//! * [`parser`] reads textual context and type descriptions
//!   (`lal_char(abc), zmin`, `mutable_automaton<context<...>>`, ...).
//! * [`names`] turns a [`Descriptor`] into its canonical short and full names.
//! * [`printer`] emits the Rust type syntax that instantiates a descriptor,
//!   together with the imports and link arguments it needs.

pub mod ast;
mod error;
mod identities;
pub mod names;
pub mod parser;
pub mod printer;

pub use ast::{Descriptor, Node, Visitor};
pub use error::{ContextError, PrintError};
pub use identities::{Identities, UnknownIdentities};
pub use names::{Normalized, full_name, normalize_context, normalize_type, short_name};
pub use printer::Printer;
