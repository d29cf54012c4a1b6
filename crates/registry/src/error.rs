use std::fmt;

use crate::signature::Signature;
use crate::specializer::SpecializeError;

/// Errors returned by registry lookups and calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
	/// No implementation exists and none could be produced.
	#[error("{}", Unavailable::new(.operation, .signature, .available, .source))]
	Unavailable {
		operation: String,
		signature: Signature,
		/// Known signatures of `operation`, sorted.
		available: Vec<Signature>,
		source: SpecializeError,
	},
	/// Specialization reported success but registered nothing.
	#[error("{operation}: internal error: specialization succeeded but no implementation was registered for {signature}")]
	RegistrationInvariant { operation: String, signature: Signature },
	/// The registry under this name holds entries of another type.
	#[error("{operation}: registry holds entries of type {registered}, requested {requested}")]
	EntryTypeMismatch {
		operation: String,
		registered: &'static str,
		requested: &'static str,
	},
}

impl DispatchError {
	/// Whether the failure is an engine bug rather than a user error.
	pub fn is_internal(&self) -> bool {
		match self {
			DispatchError::Unavailable { source, .. } => source.is_internal(),
			DispatchError::RegistrationInvariant { .. } | DispatchError::EntryTypeMismatch { .. } => true,
		}
	}
}

struct Unavailable<'a> {
	operation: &'a str,
	signature: &'a Signature,
	available: &'a [Signature],
	source: &'a SpecializeError,
}

impl<'a> Unavailable<'a> {
	fn new(
		operation: &'a str,
		signature: &'a Signature,
		available: &'a [Signature],
		source: &'a SpecializeError,
	) -> Self {
		Self {
			operation,
			signature,
			available,
			source,
		}
	}
}

impl fmt::Display for Unavailable<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{}: no implementation available for {}", self.operation, self.signature)?;
		writeln!(f, "  available versions:")?;
		for sig in self.available {
			writeln!(f, "    {sig}")?;
		}
		writeln!(f, "  failed signature:")?;
		writeln!(f, "    {}", self.signature)?;
		write!(f, "  {}", self.source)?;
		if let Some(diagnostics) = self.source.diagnostics() {
			write!(f, "\n  diagnostics:")?;
			for line in diagnostics.lines() {
				write!(f, "\n    {line}")?;
			}
		}
		Ok(())
	}
}
