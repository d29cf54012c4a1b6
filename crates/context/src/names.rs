//! Canonical names of descriptors.
//!
//! The *short* name leaves out alphabets and keys the registries; the *full*
//! name keeps them and drives code generation. Both read back through the
//! parser to the same name, so normalization is idempotent.

use std::fmt::Write as _;

use crate::ast::{AutomatonNode, ContextNode, Descriptor, ExpressionSetNode, GensetNode, Node, Visitor};
use crate::error::ContextError;
use crate::parser;

/// Result of normalizing a description.
#[derive(Debug, Clone)]
pub struct Normalized {
	pub short: String,
	pub full: String,
	pub descriptor: Node,
}

impl Normalized {
	fn new(descriptor: Node) -> Self {
		Self {
			short: short_name(&descriptor),
			full: full_name(&descriptor),
			descriptor,
		}
	}
}

/// Normalizes a context description (`lal_char(ab), b`, `context<...>`).
pub fn normalize_context(text: &str) -> Result<Normalized, ContextError> {
	parser::parse_context(text).map(Normalized::new)
}

/// Normalizes any type name (automata, expressionsets, primitives, ...).
pub fn normalize_type(text: &str) -> Result<Normalized, ContextError> {
	parser::parse_type(text).map(Normalized::new)
}

pub fn short_name(node: &Descriptor) -> String {
	let mut namer = Namer { out: String::new(), full: false };
	node.accept(&mut namer);
	namer.out
}

pub fn full_name(node: &Descriptor) -> String {
	let mut namer = Namer { out: String::new(), full: true };
	node.accept(&mut namer);
	namer.out
}

struct Namer {
	out: String,
	full: bool,
}

impl Namer {
	fn list(&mut self, open: &str, nodes: &[Node]) {
		self.out.push_str(open);
		self.out.push('<');
		for (i, node) in nodes.iter().enumerate() {
			if i > 0 {
				self.out.push_str(", ");
			}
			node.accept(self);
		}
		self.out.push('>');
	}

	fn wrap(&mut self, open: &str, node: &Node) {
		self.out.push_str(open);
		self.out.push('<');
		node.accept(self);
		self.out.push('>');
	}
}

impl Visitor for Namer {
	type Output = ();

	fn visit_context(&mut self, node: &ContextNode) {
		self.out.push_str("context<");
		node.labelset.accept(self);
		self.out.push_str(", ");
		node.weightset.accept(self);
		self.out.push('>');
	}

	fn visit_tupleset(&mut self, sets: &[Node]) {
		self.list("lat", sets);
	}

	fn visit_tuple(&mut self, sets: &[Node]) {
		self.list("std::tuple", sets);
	}

	fn visit_oneset(&mut self) {
		self.out.push_str("lao");
	}

	fn visit_genset(&mut self, node: &GensetNode) {
		self.out.push_str(&node.letter_type);
		if self.full
			&& let Some(gens) = &node.generators
		{
			self.out.push('(');
			for c in gens.chars() {
				if matches!(c, ')' | '\\') {
					self.out.push('\\');
				}
				self.out.push(c);
			}
			self.out.push(')');
		}
	}

	fn visit_letterset(&mut self, genset: &Node) {
		self.wrap("letterset", genset);
	}

	fn visit_wordset(&mut self, genset: &Node) {
		self.wrap("wordset", genset);
	}

	fn visit_nullableset(&mut self, labelset: &Node) {
		self.wrap("lan", labelset);
	}

	fn visit_expressionset(&mut self, node: &ExpressionSetNode) {
		self.wrap("expressionset", &node.context);
		if !node.identities.is_default() {
			let _ = write!(self.out, "({})", node.identities);
		}
	}

	fn visit_expansionset(&mut self, expressionset: &Node) {
		self.wrap("expansionset", expressionset);
	}

	fn visit_weightset(&mut self, type_name: &str) {
		self.out.push_str(type_name);
	}

	fn visit_automaton(&mut self, node: &AutomatonNode) {
		self.list(&node.type_name, &node.children);
	}

	fn visit_polynomialset(&mut self, child: &Node) {
		self.wrap("polynomialset", child);
	}

	fn visit_other(&mut self, type_name: &str) {
		self.out.push_str(type_name);
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	use super::*;

	#[test]
	fn equivalent_spellings_share_a_short_name() {
		let expected = "context<letterset<char_letters>, b>";
		for text in [
			"lal_char, b",
			"lal_char,b",
			"  lal_char ,  b ",
			"'lal_char, b'",
			"\"lal_char, b\"",
			"vcsn_lal_char, b",
			"ctx::lal_char, b",
			"lal_char_b",
			"lal_char -> b",
			"lal<char>, b",
			"lal_char(abc), b",
			"[abc] -> b",
			"context<letterset<char_letters(abc)>, b>",
			"context<letterset<set_alphabet<char_letters>>, b>",
		] {
			assert_eq!(normalize_context(text).unwrap().short, expected, "{text}");
		}
	}

	#[test]
	fn full_names_keep_alphabets() {
		let n = normalize_context("law_char(abc), zmin").unwrap();
		assert_eq!(n.short, "context<wordset<char_letters>, zmin>");
		assert_eq!(n.full, "context<wordset<char_letters(abc)>, zmin>");

		let none = normalize_context("lal_char, b").unwrap();
		let empty = normalize_context("lal_char(), b").unwrap();
		assert_eq!(none.short, empty.short);
		assert_ne!(none.full, empty.full);
	}

	#[test]
	fn associative_identities_are_implicit() {
		let a = normalize_context("lal_char, expressionset<lal_char, q>(associative)").unwrap();
		let b = normalize_context("lal_char, expressionset<lal_char, q>").unwrap();
		assert_eq!(a.short, b.short);
		assert!(!a.short.contains("associative"));
	}

	#[test]
	fn snames_round_trip() {
		for text in [
			"mutable_automaton<lal_char(ab), zmin>",
			"focus_automaton<mutable_automaton<lat<lal_char, lal_char>, b>, 1>",
			"expansionset<seriesset<lan_char, q>>",
			"std::tuple<unsigned, const std::string, std::integral_constant<unsigned,2>>",
			"polynomialset<law_char, z>",
		] {
			let once = normalize_type(text).unwrap();
			let twice = normalize_type(&once.short).unwrap();
			assert_eq!(twice.short, once.short, "{text}");
			let again = normalize_type(&once.full).unwrap();
			assert_eq!(again.full, once.full, "{text}");
		}
	}

	fn genset_text() -> impl Strategy<Value = String> {
		prop_oneof![
			Just(String::new()),
			"[a-z]{0,4}".prop_map(|g| format!("({g})")),
		]
	}

	fn labelset_text() -> impl Strategy<Value = String> {
		let leaf = prop_oneof![
			genset_text().prop_map(|g| format!("lal_char{g}")),
			genset_text().prop_map(|g| format!("law_char{g}")),
			genset_text().prop_map(|g| format!("lan_char{g}")),
			genset_text().prop_map(|g| format!("letterset<char_letters{g}>")),
			Just("lal<string>".to_string()),
			Just("lao".to_string()),
		];
		leaf.prop_recursive(2, 6, 3, |inner| {
			prop::collection::vec(inner, 1..3).prop_map(|sets| format!("lat<{}>", sets.join(",")))
		})
	}

	fn weightset_text() -> impl Strategy<Value = String> {
		let leaf = prop::sample::select(crate::parser::WEIGHTSETS).prop_map(str::to_string);
		leaf.prop_recursive(1, 3, 2, |inner| {
			prop_oneof![
				prop::collection::vec(inner.clone(), 1..3).prop_map(|ws| format!("lat<{}>", ws.join(", "))),
				inner.prop_map(|ws| format!("expressionset<lal_char(ab), {ws}>(linear)")),
			]
		})
	}

	proptest! {
		#[test]
		fn normalization_is_idempotent(
			ls in labelset_text(),
			ws in weightset_text(),
			sep in prop::sample::select(vec![", ", ",", " -> "]),
		) {
			let text = format!("{ls}{sep}{ws}");
			let once = normalize_context(&text).unwrap();
			let short = normalize_context(&once.short).unwrap();
			let full = normalize_context(&once.full).unwrap();
			prop_assert_eq!(&short.short, &once.short);
			prop_assert_eq!(&full.full, &once.full);
			prop_assert_eq!(&full.short, &once.short);
		}
	}
}
