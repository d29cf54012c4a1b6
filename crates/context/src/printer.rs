//! Rust code generation for descriptors.
//!
//! [`Printer`] walks a [`Descriptor`] and appends the Rust type that
//! instantiates it to an indented body, recording every `use` item the type
//! needs. Imports go into two insertion-ordered, deduplicated sets:
//! immediate ones, and late ones (tuplesets and algorithm modules) that are
//! emitted after the immediate block.
//!
//! ```text
//! // preamble
//! use <immediate>;   first-seen order
//!
//! use <late>;        first-seen order
//!
//! <body>
//! ```

use indexmap::IndexSet;

use crate::ast::{AutomatonNode, ContextNode, Descriptor, ExpressionSetNode, GensetNode, Node, Visitor};
use crate::error::PrintError;

/// Fixed head of every generated source file.
pub const PREAMBLE: &str = "\
// Generated by the vcsn dyn runtime. Do not edit.
#![allow(unused_imports, non_camel_case_types, non_snake_case, clippy::all)]
";

/// Weightset name, defining module, type.
const WEIGHTSETS: &[(&str, &str, &str)] = &[
	("b", "vcsn::weightset::b", "B"),
	("f2", "vcsn::weightset::f2", "F2"),
	("log", "vcsn::weightset::log", "Log"),
	("nmin", "vcsn::weightset::nmin", "NMin"),
	("q", "vcsn::weightset::q", "Q"),
	("qmp", "vcsn::weightset::qmp", "QMp"),
	("r", "vcsn::weightset::r", "R"),
	("rmin", "vcsn::weightset::rmin", "RMin"),
	("z", "vcsn::weightset::z", "Z"),
	("zmin", "vcsn::weightset::zmin", "ZMin"),
];

/// Automaton kind, defining module, type.
const AUTOMATA: &[(&str, &str, &str)] = &[
	("determinized_automaton", "vcsn::algos::determinize", "DeterminizedAutomaton"),
	("detweighted_automaton", "vcsn::algos::determinize", "DetweightedAutomaton"),
	("expression_automaton", "vcsn::core::expression_automaton", "ExpressionAutomaton"),
	("filter_automaton", "vcsn::algos::filter", "FilterAutomaton"),
	("focus_automaton", "vcsn::algos::focus", "FocusAutomaton"),
	("mutable_automaton", "vcsn::core::mutable_automaton", "MutableAutomaton"),
	("pair_automaton", "vcsn::algos::synchronizing_word", "PairAutomaton"),
	("partition_automaton", "vcsn::core::partition_automaton", "PartitionAutomaton"),
	("permutation_automaton", "vcsn::core::permutation_automaton", "PermutationAutomaton"),
	("product_automaton", "vcsn::algos::product", "ProductAutomaton"),
	("scc_automaton", "vcsn::algos::scc", "SccAutomaton"),
	("transpose_automaton", "vcsn::algos::transpose", "TransposeAutomaton"),
	("tuple_automaton", "vcsn::core::tuple_automaton", "TupleAutomaton"),
];

const LETTERS: &[(&str, &str, &str)] = &[
	("char_letters", "vcsn::alphabets::chars", "CharLetters"),
	("string_letters", "vcsn::alphabets::string", "StringLetters"),
];

/// Algorithms living in a module named after another one.
const ALGO_ALIASES: &[(&str, &str)] = &[
	("ambiguous-word", "is-ambiguous"),
	("chain", "concatenate"),
	("coaccessible", "accessible"),
	("codeterminize", "determinize"),
	("cominimize", "minimize"),
	("component", "scc"),
	("condense", "scc"),
	("conjunction", "product"),
	("context-of", "make-context"),
	("copy-convert", "copy"),
	("costandard", "standard"),
	("difference", "are-equivalent"),
	("eliminate-state", "to-expression"),
	("factor", "prefix"),
	("infiltration", "product"),
	("is-accessible", "accessible"),
	("is-coaccessible", "accessible"),
	("is-codeterministic", "is-deterministic"),
	("is-costandard", "standard"),
	("is-cycle-ambiguous", "is-ambiguous"),
	("is-empty", "accessible"),
	("is-normalized", "normalize"),
	("is-out-sorted", "sort"),
	("is-standard", "standard"),
	("is-synchronized-by", "synchronizing-word"),
	("is-trim", "accessible"),
	("is-useless", "accessible"),
	("ldiv", "divide"),
	("lgcd", "divide"),
	("list", "print"),
	("make-expressionset", "make-context"),
	("make-word-context", "make-context"),
	("multiply", "concatenate"),
	("num-components", "scc"),
	("pair", "synchronizing-word"),
	("power", "product"),
	("rdiv", "divide"),
	("right-mult", "left-mult"),
	("shortest", "enumerate"),
	("shuffle", "product"),
	("subword", "prefix"),
	("suffix", "prefix"),
	("trim", "accessible"),
	("union-a", "union"),
];

/// Value-kind suffixes that do not take part in module names.
const ALGO_SUFFIXES: &[&str] = &[
	"-automaton",
	"-ctx",
	"-expansion",
	"-label",
	"-polynomial",
	"-expression",
	"-vector",
	"-weight",
];

/// Name of the `vcsn::algos` module defining `algo`.
///
/// ```
/// assert_eq!(vcsn_context::printer::algo_module("is_trim"), "accessible");
/// assert_eq!(vcsn_context::printer::algo_module("determinize"), "determinize");
/// assert_eq!(vcsn_context::printer::algo_module("to_expression"), "to_expression");
/// ```
pub fn algo_module(algo: &str) -> String {
	let mut name = algo.replace('_', "-");
	if name != "is-valid-expression" {
		for suffix in ALGO_SUFFIXES {
			if name != "to-expression"
				&& let Some(stem) = name.strip_suffix(suffix)
			{
				name = stem.to_string();
			}
		}
	}
	if let Some((_, target)) = ALGO_ALIASES.iter().find(|(from, _)| *from == name) {
		name = target.to_string();
	}
	name.replace('-', "_")
}

fn lookup<'t>(table: &'t [(&str, &'t str, &'t str)], key: &str) -> Option<(&'t str, &'t str)> {
	table.iter().find(|(name, ..)| *name == key).map(|(_, module, ty)| (*module, *ty))
}

/// Accumulates generated code and the imports it depends on.
#[derive(Debug, Default)]
pub struct Printer {
	body: String,
	indent: usize,
	at_line_start: bool,
	headers: IndexSet<String>,
	headers_late: IndexSet<String>,
	link_args: IndexSet<String>,
}

impl Printer {
	pub fn new() -> Self {
		Self {
			at_line_start: true,
			..Self::default()
		}
	}

	/// Records an immediate `use` item.
	pub fn header(&mut self, item: impl Into<String>) {
		self.headers.insert(item.into());
	}

	/// Records a `use` item emitted after the immediate block.
	pub fn header_late(&mut self, item: impl Into<String>) {
		self.headers_late.insert(item.into());
	}

	/// Records the module defining `algo` and returns its name.
	pub fn header_algo(&mut self, algo: &str) -> String {
		let module = algo_module(algo);
		self.header_late(format!("vcsn::algos::{module}"));
		module
	}

	pub fn link_arg(&mut self, arg: impl Into<String>) {
		self.link_args.insert(arg.into());
	}

	pub fn link_args(&self) -> impl Iterator<Item = &str> {
		self.link_args.iter().map(String::as_str)
	}

	pub fn headers(&self) -> impl Iterator<Item = &str> {
		self.headers.iter().map(String::as_str)
	}

	pub fn headers_late(&self) -> impl Iterator<Item = &str> {
		self.headers_late.iter().map(String::as_str)
	}

	/// Appends raw text to the body, indenting fresh lines.
	pub fn emit(&mut self, text: &str) {
		for (i, line) in text.split('\n').enumerate() {
			if i > 0 {
				self.newline();
			}
			if line.is_empty() {
				continue;
			}
			if self.at_line_start {
				self.body.extend(std::iter::repeat_n('\t', self.indent));
				self.at_line_start = false;
			}
			self.body.push_str(line);
		}
	}

	/// Appends `text` and ends the line.
	pub fn line(&mut self, text: &str) {
		self.emit(text);
		self.newline();
	}

	pub fn newline(&mut self) {
		self.body.push('\n');
		self.at_line_start = true;
	}

	pub fn indent(&mut self) {
		self.indent += 1;
	}

	pub fn dedent(&mut self) {
		self.indent = self.indent.saturating_sub(1);
	}

	/// Appends the Rust type instantiating `node`.
	pub fn visit(&mut self, node: &Descriptor) -> Result<(), PrintError> {
		node.accept(self)
	}

	/// Renders the complete source file.
	pub fn finish(self) -> String {
		let mut out = String::from(PREAMBLE);
		out.push('\n');
		for item in &self.headers {
			out.push_str(&format!("use {item};\n"));
		}
		out.push('\n');
		for item in &self.headers_late {
			out.push_str(&format!("use {item};\n"));
		}
		out.push('\n');
		out.push_str(&self.body);
		out
	}

	/// `Name<` newline, indented children separated by `,`, `>`.
	fn generic(&mut self, name: &str, children: &[Node]) -> Result<(), PrintError> {
		self.emit(name);
		self.emit("<");
		self.indent();
		for (i, child) in children.iter().enumerate() {
			self.newline();
			child.accept(self)?;
			if i + 1 < children.len() {
				self.emit(",");
			}
		}
		self.dedent();
		self.newline();
		self.emit(">");
		Ok(())
	}

	fn tuple(&mut self, sets: &[Node]) -> Result<(), PrintError> {
		self.emit("(");
		for (i, set) in sets.iter().enumerate() {
			if i > 0 {
				self.emit(" ");
			}
			set.accept(self)?;
			self.emit(",");
		}
		self.emit(")");
		Ok(())
	}
}

impl Visitor for Printer {
	type Output = Result<(), PrintError>;

	fn visit_context(&mut self, node: &ContextNode) -> Self::Output {
		self.header("vcsn::ctx::Context");
		self.generic("Context", &[node.labelset.clone(), node.weightset.clone()])
	}

	fn visit_tupleset(&mut self, sets: &[Node]) -> Self::Output {
		self.header_late("vcsn::labelset::tupleset::TupleSet");
		self.emit("TupleSet<");
		self.tuple(sets)?;
		self.emit(">");
		Ok(())
	}

	fn visit_tuple(&mut self, sets: &[Node]) -> Self::Output {
		self.tuple(sets)
	}

	fn visit_oneset(&mut self) -> Self::Output {
		self.header("vcsn::labelset::oneset::OneSet");
		self.emit("OneSet");
		Ok(())
	}

	fn visit_genset(&mut self, node: &GensetNode) -> Self::Output {
		let Some((module, ty)) = lookup(LETTERS, &node.letter_type) else {
			return Err(PrintError::Unsupported {
				kind: "letter type",
				name: node.letter_type.clone(),
			});
		};
		self.header("vcsn::alphabets::setalpha::SetAlphabet");
		self.header(format!("{module}::{ty}"));
		self.emit(&format!("SetAlphabet<{ty}>"));
		Ok(())
	}

	fn visit_letterset(&mut self, genset: &Node) -> Self::Output {
		self.header("vcsn::labelset::letterset::LetterSet");
		self.emit("LetterSet<");
		genset.accept(self)?;
		self.emit(">");
		Ok(())
	}

	fn visit_wordset(&mut self, genset: &Node) -> Self::Output {
		self.header("vcsn::labelset::wordset::WordSet");
		self.emit("WordSet<");
		genset.accept(self)?;
		self.emit(">");
		Ok(())
	}

	fn visit_nullableset(&mut self, labelset: &Node) -> Self::Output {
		self.header("vcsn::labelset::nullableset::NullableSet");
		self.generic("NullableSet", std::slice::from_ref(labelset))
	}

	fn visit_expressionset(&mut self, node: &ExpressionSetNode) -> Self::Output {
		self.header("vcsn::core::rat::expressionset::ExpressionSet");
		self.generic("ExpressionSet", std::slice::from_ref(&node.context))
	}

	fn visit_expansionset(&mut self, expressionset: &Node) -> Self::Output {
		self.header("vcsn::core::rat::expansionset::ExpansionSet");
		self.generic("ExpansionSet", std::slice::from_ref(expressionset))
	}

	fn visit_weightset(&mut self, type_name: &str) -> Self::Output {
		let Some((module, ty)) = lookup(WEIGHTSETS, type_name) else {
			return Err(PrintError::Unsupported {
				kind: "weightset",
				name: type_name.to_string(),
			});
		};
		self.header(format!("{module}::{ty}"));
		if type_name == "qmp" {
			self.link_arg("-lgmp");
		}
		self.emit(ty);
		Ok(())
	}

	fn visit_automaton(&mut self, node: &AutomatonNode) -> Self::Output {
		let Some((module, ty)) = lookup(AUTOMATA, &node.type_name) else {
			return Err(PrintError::Unsupported {
				kind: "automaton type",
				name: node.type_name.clone(),
			});
		};
		self.header(format!("{module}::{ty}"));
		self.generic(ty, &node.children)
	}

	fn visit_polynomialset(&mut self, child: &Node) -> Self::Output {
		self.header("vcsn::weightset::polynomialset::PolynomialSet");
		self.generic("PolynomialSet", std::slice::from_ref(child))
	}

	fn visit_other(&mut self, type_name: &str) -> Self::Output {
		let rendered = match type_name {
			"bool" => "bool".to_string(),
			"int" => "i32".to_string(),
			"unsigned" => "u32".to_string(),
			"float" => "f32".to_string(),
			"std::string" | "const std::string" => "String".to_string(),
			"boost::optional<unsigned>" => "Option<u32>".to_string(),
			"vcsn::rat::identities" => {
				self.header("vcsn::core::rat::Identities");
				"Identities".to_string()
			}
			"vcsn::direction" => {
				self.header("vcsn::misc::Direction");
				"Direction".to_string()
			}
			other => match other
				.strip_prefix("std::integral_constant<unsigned, ")
				.and_then(|rest| rest.strip_suffix('>'))
			{
				Some(n) => {
					self.header("vcsn::misc::IntegralConstant");
					format!("IntegralConstant<{n}>")
				}
				None => other.to_string(),
			},
		};
		self.emit(&rendered);
		Ok(())
	}
}
