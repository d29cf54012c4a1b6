//! Backend boundary producing implementations on demand.

use std::path::PathBuf;

use vcsn_context::{ContextError, PrintError};

use crate::registries::Registries;
use crate::signature::Signature;

/// One missing `(operation, signature)` pair.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
	pub operation: &'a str,
	pub signature: &'a Signature,
}

/// Produces and registers an implementation for a [`Request`].
///
/// On success the implementation must be present in `registries`; the
/// registry re-checks and reports a registration invariant violation
/// otherwise. The native backend compiles and loads a module and never
/// unloads it; other backends are free to do otherwise.
pub trait Specializer: Send + Sync {
	fn specialize(&self, request: &Request<'_>, registries: &Registries) -> Result<(), SpecializeError>;
}

/// Why a specialization could not be produced.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpecializeError {
	#[error("no specializer installed")]
	NoSpecializer,
	/// The toolchain rejected the generated code. Non-empty `assertions`
	/// mean the combination has no possible implementation.
	#[error("{}", compile_summary(assertions))]
	Compile {
		assertions: Vec<String>,
		command: String,
		diagnostics: String,
	},
	#[error(transparent)]
	Malformed(#[from] ContextError),
	#[error(transparent)]
	Unsupported(#[from] PrintError),
	#[error("failed to load {}: {message}", path.display())]
	Load { path: PathBuf, message: String },
	/// The build environment is unusable (missing toolchain, I/O failure).
	#[error("build environment: {0}")]
	Environment(String),
}

impl SpecializeError {
	/// Whether the failure is an engine bug rather than a user error.
	pub fn is_internal(&self) -> bool {
		matches!(self, SpecializeError::Load { .. })
	}

	pub fn assertions(&self) -> &[String] {
		match self {
			SpecializeError::Compile { assertions, .. } => assertions,
			_ => &[],
		}
	}

	/// Raw toolchain output, when there is any.
	pub fn diagnostics(&self) -> Option<&str> {
		match self {
			SpecializeError::Compile { diagnostics, .. } if !diagnostics.is_empty() => Some(diagnostics),
			_ => None,
		}
	}
}

fn compile_summary(assertions: &[String]) -> String {
	match assertions {
		[] => "compilation failed".to_string(),
		[one] => format!("compilation failed: {one}"),
		many => format!("compilation failed:\n  {}", many.join("\n  ")),
	}
}
