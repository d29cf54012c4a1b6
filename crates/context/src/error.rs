/// Errors produced while reading a context or type description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
	/// The text is not a valid description.
	#[error("{message}: {input:?}")]
	Malformed { input: String, message: String },
	/// A tupleset or tuple was built without components.
	#[error("empty {0}")]
	EmptyTuple(&'static str),
}

impl ContextError {
	pub(crate) fn malformed(input: &str, message: impl Into<String>) -> Self {
		ContextError::Malformed {
			input: input.to_string(),
			message: message.into(),
		}
	}
}

/// Errors produced by the code generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrintError {
	/// A weightset, automaton kind or letter type with no known implementation.
	#[error("unsupported {kind}: {name}")]
	Unsupported { kind: &'static str, name: String },
}
