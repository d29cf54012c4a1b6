//! Extraction of compile-time assertion messages from toolchain output.
//!
//! Algorithms reject impossible type combinations (a tape number out of
//! range, a non-commutative weightset) with const panics; those messages are
//! what the user needs, not the surrounding diagnostic noise.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	[
		r"(?m)evaluation panicked: (.*)$",
		r"(?m)the evaluated program panicked at '(.*)', ",
		r"(?m)static assertion failed: (.*)$",
		r#"(?m)static_assert failed "(.*)"$"#,
	]
	.into_iter()
	.filter_map(|p| Regex::new(p).ok())
	.collect()
});

/// Assertion messages in `output`, deduplicated, in order of appearance.
pub fn assertions(output: &str) -> Vec<String> {
	let mut found: Vec<(usize, String)> = PATTERNS
		.iter()
		.flat_map(|re| re.captures_iter(output))
		.filter_map(|caps| {
			let m = caps.get(1)?;
			Some((m.start(), m.as_str().trim().to_string()))
		})
		.collect();
	found.sort_by_key(|(at, _)| *at);
	found
		.into_iter()
		.map(|(_, msg)| msg)
		.filter(|msg| !msg.is_empty())
		.collect::<IndexSet<_>>()
		.into_iter()
		.collect()
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn const_panics() {
		let output = "\
error[E0080]: evaluation panicked: focus: invalid tape number
 --> plugin.rs:12:5
error[E0080]: evaluation panicked: focus: invalid tape number
 --> plugin.rs:18:5
error[E0080]: evaluation of constant value failed
  = note: the evaluated program panicked at 'determinize: requires a free labelset', src/algos/determinize.rs:40:9
";
		assert_eq!(
			assertions(output),
			["focus: invalid tape number", "determinize: requires a free labelset"]
		);
	}

	#[test]
	fn legacy_formats() {
		let output = "static assertion failed: minimize: requires free labelset\nstatic_assert failed \"lift: invalid tape\"\n";
		assert_eq!(assertions(output), ["minimize: requires free labelset", "lift: invalid tape"]);
	}

	#[test]
	fn ordinary_errors_have_none() {
		assert!(assertions("error[E0412]: cannot find type `Foo` in this scope").is_empty());
	}
}
