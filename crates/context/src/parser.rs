//! Recursive-descent reader for context and type descriptions.
//!
//! Accepts the union of the historical spellings: short forms (`lal_char(ab)`,
//! `law<string>`, `lao`, `lat<...>`), canonical forms (`context<...>`,
//! `letterset<char_letters(ab)>`), bracket forms (`[ab]`, `<string>[ab]*`),
//! and the `,`, `->` and legacy `_` separators between labelset and
//! weightset (`lal_char_b`).

use crate::ast::{Descriptor, Node};
use crate::error::ContextError;
use crate::identities::Identities;

/// Terminal weightset names.
pub const WEIGHTSETS: &[&str] = &["b", "f2", "log", "nmin", "q", "qmp", "r", "rmin", "z", "zmin"];

/// Labelset keywords, longest first so legacy `lal_char_b` splits greedily.
const LABELSETS: &[&str] = &[
	"nullableset",
	"lal_string",
	"lan_string",
	"law_string",
	"expressionset",
	"letterset",
	"seriesset",
	"tupleset",
	"lal_char",
	"lan_char",
	"law_char",
	"wordset",
	"oneset",
	"lal",
	"lan",
	"lao",
	"lat",
	"law",
];

const DECORATIONS: &[&str] = &["vcsn::", "vcsn_", "ctx::", "ctx_"];

/// Parses a context description such as `lal_char(abc), zmin`.
pub fn parse_context(text: &str) -> Result<Node, ContextError> {
	let body = strip_decoration(text);
	let mut parser = Parser::new(text, body);
	let word = parser.word();
	let res = parser.context_from(word)?;
	parser.finish(res)
}

/// Parses any valueset or type name: contexts, automata, expressionsets,
/// `std::tuple<...>`, primitives such as `unsigned` or `const std::string`.
pub fn parse_type(text: &str) -> Result<Node, ContextError> {
	let body = strip_quotes(text);
	let mut parser = Parser::new(text, body);
	let res = parser.any()?;
	parser.finish(res)
}

/// Removes surrounding whitespace and one pair of matching quotes.
pub fn strip_quotes(text: &str) -> &str {
	let s = text.trim();
	for quote in ['\'', '"'] {
		if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
			return s[1..s.len() - 1].trim();
		}
	}
	s
}

/// [`strip_quotes`], then the `vcsn::`/`vcsn_`/`ctx::`/`ctx_` prefixes.
pub fn strip_decoration(text: &str) -> &str {
	let mut s = strip_quotes(text);
	loop {
		let Some(rest) = DECORATIONS.iter().find_map(|p| s.strip_prefix(p)) else {
			break;
		};
		s = rest.trim_start();
	}
	s
}

/// Canonical whitespace for raw type parameters: no space around angle
/// brackets, exactly one space after commas, single spaces between words.
pub fn canonical_parameters(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut pending_space = false;
	for c in raw.chars() {
		if c.is_whitespace() {
			pending_space = true;
			continue;
		}
		if pending_space
			&& is_word_char(c)
			&& out.chars().last().is_some_and(is_word_char)
		{
			out.push(' ');
		}
		pending_space = false;
		out.push(c);
		if c == ',' {
			out.push(' ');
		}
	}
	out
}

fn is_word_start(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

fn is_word_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

fn is_weightset(w: &str) -> bool {
	WEIGHTSETS.contains(&w)
}

fn is_labelset(w: &str) -> bool {
	LABELSETS.contains(&w)
}

fn is_letter_type(w: &str) -> bool {
	matches!(w, "char" | "string" | "char_letters" | "string_letters")
}

/// Words that open a descriptor rather than an opaque type name.
fn is_keyword(w: &str) -> bool {
	w.ends_with("_automaton")
		|| is_labelset(w)
		|| is_weightset(w)
		|| matches!(w, "context" | "expansionset" | "polynomialset")
}

fn letter_type(w: &str) -> String {
	match w {
		"char" | "string" => format!("{w}_letters"),
		other => other.to_string(),
	}
}

struct Parser<'a> {
	/// Original text, for error reports.
	input: &'a str,
	src: &'a str,
	pos: usize,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str, src: &'a str) -> Self {
		Self { input, src, pos: 0 }
	}

	fn error(&self, message: impl Into<String>) -> ContextError {
		ContextError::malformed(self.input, message)
	}

	fn finish(mut self, res: Node) -> Result<Node, ContextError> {
		if self.peek().is_some() {
			let read = crate::names::full_name(&res);
			return Err(self.error(format!(
				"unexpected trailing characters after '{read}': '{}'",
				&self.src[self.pos..]
			)));
		}
		Ok(res)
	}

	fn rest(&self) -> &'a str {
		&self.src[self.pos..]
	}

	fn skip_space(&mut self) {
		let rest = self.rest();
		self.pos += rest.len() - rest.trim_start().len();
	}

	/// Next non-space character.
	fn peek(&mut self) -> Option<char> {
		self.skip_space();
		self.rest().chars().next()
	}

	/// Next character, spaces included.
	fn peek_raw(&self) -> Option<char> {
		self.rest().chars().next()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek_raw()?;
		self.pos += c.len_utf8();
		Some(c)
	}

	fn eat(&mut self, expected: char) -> Result<(), ContextError> {
		match self.peek() {
			Some(c) if c == expected => {
				self.pos += c.len_utf8();
				Ok(())
			}
			Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
			None => Err(self.error(format!("unexpected end of input, expected '{expected}'"))),
		}
	}

	fn eat_str(&mut self, s: &str) -> bool {
		self.skip_space();
		if self.rest().starts_with(s) {
			self.pos += s.len();
			true
		} else {
			false
		}
	}

	/// Next identifier, possibly empty. `::` is part of identifiers.
	fn word(&mut self) -> String {
		self.skip_space();
		let rest = self.rest();
		if !rest.chars().next().is_some_and(is_word_start) {
			return String::new();
		}
		let len = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
		self.pos += len;
		rest[..len].to_string()
	}

	/// Raw `<...>` parameters, angle brackets included.
	fn parameters(&mut self) -> Result<String, ContextError> {
		self.eat('<')?;
		let start = self.pos;
		let mut depth = 1usize;
		while let Some(c) = self.bump() {
			match c {
				'<' => depth += 1,
				'>' => {
					depth -= 1;
					if depth == 0 {
						let inner = &self.src[start..self.pos - 1];
						return Ok(format!("<{}>", canonical_parameters(inner)));
					}
				}
				_ => {}
			}
		}
		Err(self.error("unexpected end of input in type parameters"))
	}

	/// Generators up to `close`, backslash escapes decoded. The opening
	/// delimiter is already consumed.
	fn generators(&mut self, close: char) -> Result<String, ContextError> {
		let mut gens = String::new();
		loop {
			match self.bump() {
				None => return Err(self.error("unexpected end of input in generators")),
				Some(c) if c == close => return Ok(gens),
				Some('\\') => match self.bump() {
					Some(c) => gens.push(c),
					None => return Err(self.error("unexpected end of input after '\\'")),
				},
				Some(c) => gens.push(c),
			}
		}
	}

	/// Optional `(gens)` right after a letter type.
	fn paren_generators(&mut self) -> Result<Option<String>, ContextError> {
		if self.peek() == Some('(') {
			self.bump();
			return self.generators(')').map(Some);
		}
		Ok(None)
	}

	/// A generator set whose letter type is already read.
	fn genset_from(&mut self, word: &str) -> Result<Node, ContextError> {
		if word == "set_alphabet" {
			self.eat('<')?;
			let inner = self.word();
			let gens = self.genset_from(&inner)?;
			self.eat('>')?;
			return Ok(gens);
		}
		if word.is_empty() {
			return Err(self.error("expected a letter type"));
		}
		let gens = self.paren_generators()?;
		Ok(Descriptor::genset(letter_type(word), gens))
	}

	/// `<char(ab)>`, `<char>`, `(ab)` or nothing (char letters, no alphabet).
	fn typed_genset(&mut self) -> Result<Node, ContextError> {
		match self.peek() {
			Some('<') => {
				self.eat('<')?;
				let word = self.word();
				let gens = self.genset_from(&word)?;
				self.eat('>')?;
				Ok(gens)
			}
			_ => {
				let gens = self.paren_generators()?;
				Ok(Descriptor::genset("char_letters", gens))
			}
		}
	}

	/// `[gens]` or `[gens]*`, the letter type already read.
	fn bracket_labelset(&mut self, letters: &str) -> Result<Node, ContextError> {
		self.eat('[')?;
		let gens = self.generators(']')?;
		let genset = Descriptor::genset(letter_type(letters), Some(gens));
		if self.peek_raw() == Some('*') {
			self.bump();
			return Ok(Descriptor::wordset(genset));
		}
		Ok(Descriptor::letterset(genset))
	}

	/// Body of `lan`/`nullableset`: a genset or a full labelset.
	fn nullable_body(&mut self) -> Result<Node, ContextError> {
		if self.peek() != Some('<') {
			let gens = self.paren_generators()?;
			return Ok(Descriptor::letterset(Descriptor::genset("char_letters", gens)));
		}
		let save = self.pos;
		self.eat('<')?;
		let word = self.word();
		if is_letter_type(&word) || word == "set_alphabet" {
			let genset = self.genset_from(&word)?;
			self.eat('>')?;
			return Ok(Descriptor::letterset(genset));
		}
		self.pos = save;
		self.eat('<')?;
		let word = self.word();
		let inner = self.labelset_from(&word)?;
		self.eat('>')?;
		Ok(inner)
	}

	fn labelset_from(&mut self, word: &str) -> Result<Node, ContextError> {
		let char_gens = |p: &mut Self, letters: &str| -> Result<Node, ContextError> {
			let gens = p.paren_generators()?;
			Ok(Descriptor::genset(letter_type(letters), gens))
		};
		match word {
			"lal_char" => Ok(Descriptor::letterset(char_gens(self, "char")?)),
			"lal_string" => Ok(Descriptor::letterset(char_gens(self, "string")?)),
			"law_char" => Ok(Descriptor::wordset(char_gens(self, "char")?)),
			"law_string" => Ok(Descriptor::wordset(char_gens(self, "string")?)),
			"lan_char" => Ok(Descriptor::nullableset(Descriptor::letterset(char_gens(self, "char")?))),
			"lan_string" => Ok(Descriptor::nullableset(Descriptor::letterset(char_gens(self, "string")?))),
			"lal" | "letterset" => Ok(Descriptor::letterset(self.typed_genset()?)),
			"law" | "wordset" => Ok(Descriptor::wordset(self.typed_genset()?)),
			"lan" | "nullableset" => Ok(Descriptor::nullableset(self.nullable_body()?)),
			"lao" | "oneset" => Ok(Descriptor::oneset()),
			"lat" | "tupleset" => self.tupleset(),
			"expressionset" | "seriesset" => self.expressionset(word),
			"" => match self.peek() {
				Some('[') => self.bracket_labelset("char"),
				Some('<') => {
					self.eat('<')?;
					let letters = self.word();
					if !is_letter_type(&letters) {
						return Err(self.error(format!("invalid letter type: \"{letters}\"")));
					}
					self.eat('>')?;
					self.bracket_labelset(&letters)
				}
				Some(c) => Err(self.error(format!("invalid labelset name: \"{c}\""))),
				None => Err(self.error("unexpected end of input, expected a labelset")),
			},
			other => Err(self.error(format!("invalid labelset name: \"{other}\""))),
		}
	}

	fn weightset_from(&mut self, word: &str) -> Result<Node, ContextError> {
		if word.is_empty() && self.peek().is_none() {
			return Err(self.error("unexpected end of input, expected a weightset"));
		}
		match word {
			w if is_weightset(w) => Ok(Descriptor::weightset(w)),
			"expressionset" | "seriesset" => self.expressionset(word),
			"polynomialset" => self.polynomialset(),
			"lat" | "tupleset" => self.tupleset(),
			other => Err(self.error(format!("invalid weightset name: \"{other}\""))),
		}
	}

	fn labelset_or_weightset(&mut self) -> Result<Node, ContextError> {
		let word = self.word();
		if is_weightset(&word) || word == "polynomialset" {
			return self.weightset_from(&word);
		}
		if is_labelset(&word) || word.is_empty() {
			return self.labelset_from(&word);
		}
		Err(self.error(format!("invalid weightset or labelset name: \"{word}\"")))
	}

	/// Splits a legacy `lal_char_zmin` word into labelset and weightset.
	fn split_legacy(word: &str) -> Option<(&str, &str)> {
		LABELSETS.iter().find_map(|ls| {
			let rest = word.strip_prefix(ls)?.strip_prefix('_')?;
			(!rest.is_empty()).then_some((*ls, rest))
		})
	}

	/// `LS SEP WS` or `context<LS, WS>`, the first word already read.
	fn context_from(&mut self, word: String) -> Result<Node, ContextError> {
		if word == "context" {
			self.eat('<')?;
			let inner = self.word();
			let res = self.context_from(inner)?;
			self.eat('>')?;
			return Ok(res);
		}
		if !is_labelset(&word)
			&& let Some((ls, ws)) = Self::split_legacy(&word)
		{
			let labelset = self.labelset_from(ls)?;
			let weightset = self.weightset_from(ws)?;
			return Ok(Descriptor::context(labelset, weightset));
		}
		let labelset = self.labelset_from(&word)?;
		self.separator()?;
		let ws = self.word();
		let weightset = self.weightset_from(&ws)?;
		Ok(Descriptor::context(labelset, weightset))
	}

	fn separator(&mut self) -> Result<(), ContextError> {
		if self.eat_str("->") || self.eat_str(",") || self.eat_str("_") {
			return Ok(());
		}
		match self.peek() {
			Some(c) => Err(self.error(format!("expected ',' after labelset, found '{c}'"))),
			None => Err(self.error("unexpected end of input, expected ','")),
		}
	}

	fn tupleset(&mut self) -> Result<Node, ContextError> {
		self.eat('<')?;
		let mut sets = vec![self.labelset_or_weightset()?];
		while self.peek() == Some(',') {
			self.eat(',')?;
			sets.push(self.labelset_or_weightset()?);
		}
		self.eat('>')?;
		Descriptor::tupleset(sets)
	}

	fn expressionset(&mut self, word: &str) -> Result<Node, ContextError> {
		self.eat('<')?;
		let inner = self.word();
		let context = self.context_from(inner)?;
		self.eat('>')?;
		let mut identities = if word == "seriesset" {
			Identities::Distributive
		} else {
			Identities::default()
		};
		if self.peek() == Some('(') {
			self.eat('(')?;
			let name = self.word();
			identities = name.parse::<Identities>().map_err(|e| self.error(e.to_string()))?;
			self.eat(')')?;
		}
		Ok(Descriptor::expressionset(context, identities))
	}

	fn polynomialset(&mut self) -> Result<Node, ContextError> {
		self.eat('<')?;
		let inner = self.word();
		let context = self.context_from(inner)?;
		self.eat('>')?;
		Ok(Descriptor::polynomialset(context))
	}

	fn expansionset(&mut self) -> Result<Node, ContextError> {
		self.eat('<')?;
		let word = self.word();
		if word != "expressionset" && word != "seriesset" {
			return Err(self.error(format!("invalid expansionset component: \"{word}\"")));
		}
		let rs = self.expressionset(&word)?;
		self.eat('>')?;
		Ok(Descriptor::expansionset(rs))
	}

	fn automaton(&mut self, name: String) -> Result<Node, ContextError> {
		self.eat('<')?;
		// The first child of an automaton reads as a context when it looks like one.
		let word = self.word();
		let first = if word == "context" || is_labelset(&word) || Self::split_legacy(&word).is_some() {
			let save = self.pos;
			match self.context_from(word.clone()) {
				Ok(ctx) => ctx,
				Err(_) if is_labelset(&word) => {
					self.pos = save;
					self.labelset_from(&word)?
				}
				Err(e) => return Err(e),
			}
		} else {
			self.any_from(word)?
		};
		let mut children = vec![first];
		while self.peek() == Some(',') {
			self.eat(',')?;
			children.push(self.any()?);
		}
		self.eat('>')?;
		Ok(Descriptor::automaton(name, children))
	}

	fn tuple(&mut self) -> Result<Node, ContextError> {
		self.eat('<')?;
		let mut sets = vec![self.any()?];
		while self.peek() == Some(',') {
			self.eat(',')?;
			sets.push(self.any()?);
		}
		self.eat('>')?;
		Descriptor::tuple(sets)
	}

	fn any(&mut self) -> Result<Node, ContextError> {
		let word = self.word();
		self.any_from(word)
	}

	fn any_from(&mut self, word: String) -> Result<Node, ContextError> {
		let word = match word.strip_prefix("vcsn::") {
			Some(rest) if is_keyword(rest) => rest.to_string(),
			_ => word,
		};
		match word.as_str() {
			w if w.ends_with("_automaton") => self.automaton(word),
			"context" => self.context_from(word),
			"expressionset" | "seriesset" => self.expressionset(&word),
			"expansionset" => self.expansionset(),
			"polynomialset" => self.polynomialset(),
			"std::tuple" => self.tuple(),
			"const" => {
				let rest = self.any()?;
				match &*rest {
					Descriptor::Other(name) => Ok(Descriptor::other(format!("const {name}"))),
					_ => Err(self.error("expected a type name after 'const'")),
				}
			}
			w if is_weightset(w) => self.weightset_from(w),
			w if is_labelset(w) => self.labelset_from(w),
			w if Self::split_legacy(w).is_some() => self.context_from(word),
			"" => match self.peek() {
				Some('[') | Some('<') => self.labelset_from(""),
				Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
				None => Err(self.error("unexpected end of input")),
			},
			_ => {
				let mut name = word;
				if self.peek() == Some('<') {
					name.push_str(&self.parameters()?);
				}
				Ok(Descriptor::other(name))
			}
		}
	}
}
