//! Type descriptors.
//!
//! A [`Descriptor`] is the parsed form of a context description such as
//! `lal_char(abc), zmin`. Nodes are immutable and shared through [`Node`]
//! handles; they are built bottom-up by the parser and never validate their
//! children (that is the parser's job).
//!
//! Consumers walk descriptors through [`Descriptor::accept`], which dispatches
//! on the variant with an exhaustive `match`: adding a variant is a compile
//! error in every [`Visitor`] until it is handled.

use std::sync::Arc;

use crate::error::ContextError;
use crate::identities::Identities;

/// Shared handle to a descriptor node.
pub type Node = Arc<Descriptor>;

/// A labelset/weightset pair.
#[derive(Debug, Clone)]
pub struct ContextNode {
	pub labelset: Node,
	pub weightset: Node,
}

/// A generator set ("alphabet"), e.g. `char_letters(abc)`.
#[derive(Debug, Clone)]
pub struct GensetNode {
	/// `char_letters` or `string_letters`.
	pub letter_type: String,
	/// Generators between the parentheses, with escapes decoded.
	/// `None` when no alphabet was given at all.
	pub generators: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExpressionSetNode {
	/// Always a [`Descriptor::Context`] when built by the parser.
	pub context: Node,
	pub identities: Identities,
}

#[derive(Debug, Clone)]
pub struct AutomatonNode {
	/// `mutable_automaton`, `focus_automaton`, ...
	pub type_name: String,
	pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub enum Descriptor {
	Context(ContextNode),
	Tupleset(Vec<Node>),
	Tuple(Vec<Node>),
	Oneset,
	Genset(GensetNode),
	Letterset(Node),
	Wordset(Node),
	Nullableset(Node),
	ExpressionSet(ExpressionSetNode),
	ExpansionSet(Node),
	WeightSet(String),
	AutomatonType(AutomatonNode),
	PolynomialSet(Node),
	Other(String),
}

/// Match-based visitor over [`Descriptor`] variants.
pub trait Visitor {
	type Output;

	fn visit_context(&mut self, node: &ContextNode) -> Self::Output;
	fn visit_tupleset(&mut self, sets: &[Node]) -> Self::Output;
	fn visit_tuple(&mut self, sets: &[Node]) -> Self::Output;
	fn visit_oneset(&mut self) -> Self::Output;
	fn visit_genset(&mut self, node: &GensetNode) -> Self::Output;
	fn visit_letterset(&mut self, genset: &Node) -> Self::Output;
	fn visit_wordset(&mut self, genset: &Node) -> Self::Output;
	fn visit_nullableset(&mut self, labelset: &Node) -> Self::Output;
	fn visit_expressionset(&mut self, node: &ExpressionSetNode) -> Self::Output;
	fn visit_expansionset(&mut self, expressionset: &Node) -> Self::Output;
	fn visit_weightset(&mut self, type_name: &str) -> Self::Output;
	fn visit_automaton(&mut self, node: &AutomatonNode) -> Self::Output;
	fn visit_polynomialset(&mut self, child: &Node) -> Self::Output;
	fn visit_other(&mut self, type_name: &str) -> Self::Output;
}

impl Descriptor {
	pub fn context(labelset: Node, weightset: Node) -> Node {
		Arc::new(Descriptor::Context(ContextNode { labelset, weightset }))
	}

	pub fn tupleset(sets: Vec<Node>) -> Result<Node, ContextError> {
		if sets.is_empty() {
			return Err(ContextError::EmptyTuple("tupleset"));
		}
		Ok(Arc::new(Descriptor::Tupleset(sets)))
	}

	pub fn tuple(sets: Vec<Node>) -> Result<Node, ContextError> {
		if sets.is_empty() {
			return Err(ContextError::EmptyTuple("tuple"));
		}
		Ok(Arc::new(Descriptor::Tuple(sets)))
	}

	pub fn oneset() -> Node {
		Arc::new(Descriptor::Oneset)
	}

	pub fn genset(letter_type: impl Into<String>, generators: Option<String>) -> Node {
		Arc::new(Descriptor::Genset(GensetNode {
			letter_type: letter_type.into(),
			generators,
		}))
	}

	pub fn letterset(genset: Node) -> Node {
		Arc::new(Descriptor::Letterset(genset))
	}

	pub fn wordset(genset: Node) -> Node {
		Arc::new(Descriptor::Wordset(genset))
	}

	pub fn nullableset(labelset: Node) -> Node {
		Arc::new(Descriptor::Nullableset(labelset))
	}

	pub fn expressionset(context: Node, identities: Identities) -> Node {
		Arc::new(Descriptor::ExpressionSet(ExpressionSetNode { context, identities }))
	}

	pub fn expansionset(expressionset: Node) -> Node {
		Arc::new(Descriptor::ExpansionSet(expressionset))
	}

	pub fn weightset(type_name: impl Into<String>) -> Node {
		Arc::new(Descriptor::WeightSet(type_name.into()))
	}

	pub fn automaton(type_name: impl Into<String>, children: Vec<Node>) -> Node {
		Arc::new(Descriptor::AutomatonType(AutomatonNode {
			type_name: type_name.into(),
			children,
		}))
	}

	pub fn polynomialset(child: Node) -> Node {
		Arc::new(Descriptor::PolynomialSet(child))
	}

	pub fn other(type_name: impl Into<String>) -> Node {
		Arc::new(Descriptor::Other(type_name.into()))
	}

	/// Double dispatch into `visitor`.
	pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
		match self {
			Descriptor::Context(node) => visitor.visit_context(node),
			Descriptor::Tupleset(sets) => visitor.visit_tupleset(sets),
			Descriptor::Tuple(sets) => visitor.visit_tuple(sets),
			Descriptor::Oneset => visitor.visit_oneset(),
			Descriptor::Genset(node) => visitor.visit_genset(node),
			Descriptor::Letterset(genset) => visitor.visit_letterset(genset),
			Descriptor::Wordset(genset) => visitor.visit_wordset(genset),
			Descriptor::Nullableset(labelset) => visitor.visit_nullableset(labelset),
			Descriptor::ExpressionSet(node) => visitor.visit_expressionset(node),
			Descriptor::ExpansionSet(rs) => visitor.visit_expansionset(rs),
			Descriptor::WeightSet(name) => visitor.visit_weightset(name),
			Descriptor::AutomatonType(node) => visitor.visit_automaton(node),
			Descriptor::PolynomialSet(child) => visitor.visit_polynomialset(child),
			Descriptor::Other(name) => visitor.visit_other(name),
		}
	}

	/// Whether the valueset admits the empty word.
	pub fn has_one(&self) -> bool {
		match self {
			Descriptor::Oneset
			| Descriptor::Wordset(_)
			| Descriptor::Nullableset(_)
			| Descriptor::ExpressionSet(_)
			| Descriptor::ExpansionSet(_) => true,
			Descriptor::Tupleset(sets) | Descriptor::Tuple(sets) => sets.iter().all(|s| s.has_one()),
			Descriptor::Context(_)
			| Descriptor::Genset(_)
			| Descriptor::Letterset(_)
			| Descriptor::WeightSet(_)
			| Descriptor::AutomatonType(_)
			| Descriptor::PolynomialSet(_)
			| Descriptor::Other(_) => false,
		}
	}

	/// Short human name of the variant, used in diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Descriptor::Context(_) => "context",
			Descriptor::Tupleset(_) => "tupleset",
			Descriptor::Tuple(_) => "tuple",
			Descriptor::Oneset => "oneset",
			Descriptor::Genset(_) => "genset",
			Descriptor::Letterset(_) => "letterset",
			Descriptor::Wordset(_) => "wordset",
			Descriptor::Nullableset(_) => "nullableset",
			Descriptor::ExpressionSet(_) => "expressionset",
			Descriptor::ExpansionSet(_) => "expansionset",
			Descriptor::WeightSet(_) => "weightset",
			Descriptor::AutomatonType(_) => "automaton",
			Descriptor::PolynomialSet(_) => "polynomialset",
			Descriptor::Other(_) => "other",
		}
	}

	/// The context node, when this descriptor is one.
	pub fn as_context(&self) -> Option<&ContextNode> {
		match self {
			Descriptor::Context(node) => Some(node),
			_ => None,
		}
	}
}
