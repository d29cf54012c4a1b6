use std::fmt;

use vcsn_context::{ContextError, normalize_type};

/// Ordered canonical type names identifying one instantiation of an operation.
///
/// Signatures compare element-wise and order lexicographically, so sorted
/// listings are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature(Vec<String>);

impl Signature {
	/// Wraps names that are already canonical.
	pub fn new<I, S>(parts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(parts.into_iter().map(Into::into).collect())
	}

	/// Normalizes every part to its canonical short name.
	pub fn normalized<I, S>(parts: I) -> Result<Self, ContextError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		parts
			.into_iter()
			.map(|part| normalize_type(part.as_ref()).map(|n| n.short))
			.collect::<Result<Vec<_>, _>>()
			.map(Self)
	}

	pub fn parts(&self) -> &[String] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("(")?;
		for (i, part) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			f.write_str(part)?;
		}
		f.write_str(")")
	}
}

impl<S: Into<String>> FromIterator<S> for Signature {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::new(iter)
	}
}

impl From<Vec<String>> for Signature {
	fn from(parts: Vec<String>) -> Self {
		Self(parts)
	}
}
