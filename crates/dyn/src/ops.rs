//! Declared operations and the entry-point type each one is bound to.
//!
//! Generated modules register `vcsn::algos::<module>::dyn_::<operation>`
//! instances, whose signatures must match these types exactly.

use std::borrow::Cow;

use vcsn_registry::{AlgoError, IntegralConstant, Named, Value};

/// Closure direction of [`proper`](crate::proper).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
	Forward,
	#[default]
	Backward,
}

impl Named for Direction {
	fn sname(&self) -> Cow<'_, str> {
		Cow::Borrowed("vcsn::direction")
	}
}

/// Automaton to automaton.
pub type Unary = fn(Value) -> Result<Value, AlgoError>;
/// Automaton predicate.
pub type Predicate = fn(Value) -> Result<bool, AlgoError>;

vcsn_registry::operation! {
	pub Accessible = "accessible": Unary;
	pub Coaccessible = "coaccessible": Unary;
	pub Trim = "trim": Unary;
	pub Transpose = "transpose": Unary;
	pub Complete = "complete": Unary;
	pub IsDeterministic = "is_deterministic": Predicate;
	pub IsTrim = "is_trim": Predicate;
	pub IsProper = "is_proper": Predicate;
	/// Automaton and algorithm name.
	pub Determinize = "determinize": fn(Value, String) -> Result<Value, AlgoError>;
	pub Codeterminize = "codeterminize": fn(Value, String) -> Result<Value, AlgoError>;
	pub Minimize = "minimize": fn(Value, String) -> Result<Value, AlgoError>;
	pub Proper = "proper": fn(Value, Direction, bool) -> Result<Value, AlgoError>;
	/// Automaton and tape number.
	pub Focus = "focus": fn(Value, IntegralConstant) -> Result<Value, AlgoError>;
	pub Product = "product": fn(Value, Value) -> Result<Value, AlgoError>;
	/// Automaton and maximum number of words.
	pub Shortest = "shortest": fn(Value, u32) -> Result<Value, AlgoError>;
	/// Expression, label and whether to break the result.
	pub Derivation = "derivation": fn(Value, Value, bool) -> Result<Value, AlgoError>;
	/// Full context name; registered under the short name.
	pub MakeContext = "make_context": fn(String) -> Result<Value, AlgoError>;
}

/// Names of every declared operation, sorted.
pub const OPERATIONS: &[&str] = &[
	"accessible",
	"coaccessible",
	"codeterminize",
	"complete",
	"derivation",
	"determinize",
	"focus",
	"is_deterministic",
	"is_proper",
	"is_trim",
	"make_context",
	"minimize",
	"product",
	"proper",
	"shortest",
	"transpose",
	"trim",
];
