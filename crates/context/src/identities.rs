use std::fmt;
use std::str::FromStr;

/// Rewriting identities an expressionset applies when building expressions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Identities {
	None,
	Trivial,
	#[default]
	Associative,
	Linear,
	Distributive,
}

impl Identities {
	pub fn as_str(self) -> &'static str {
		match self {
			Identities::None => "none",
			Identities::Trivial => "trivial",
			Identities::Associative => "associative",
			Identities::Linear => "linear",
			Identities::Distributive => "distributive",
		}
	}

	/// Whether names omit the `(identities)` suffix.
	pub fn is_default(self) -> bool {
		self == Identities::default()
	}
}

impl fmt::Display for Identities {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identities: {0}")]
pub struct UnknownIdentities(pub String);

impl FromStr for Identities {
	type Err = UnknownIdentities;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"none" => Ok(Identities::None),
			"trivial" => Ok(Identities::Trivial),
			"associative" => Ok(Identities::Associative),
			"linear" => Ok(Identities::Linear),
			"distributive" | "series" => Ok(Identities::Distributive),
			other => Err(UnknownIdentities(other.to_string())),
		}
	}
}
