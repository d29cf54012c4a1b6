//! Source generation for plugin modules.
//!
//! An algorithm module declares one type alias per signature part, then
//! exports the registration entry point, which hands each
//! `vcsn::algos::<module>::dyn_::<operation>` instance to the host.
//!
//! ```text
//! type T0 = MutableAutomaton<...>;
//! type T1 = String;
//!
//! #[unsafe(no_mangle)]
//! pub unsafe extern "C" fn vcsn_register_v1(host: *const VcsnHostV1) -> VcsnStatus {
//!     ...host.register("determinize", &[...], determinize::dyn_::determinize::<T0, T1> as *const ())...
//! }
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;

use vcsn_context::parser::parse_type;
use vcsn_context::{Printer, normalize_context};
use vcsn_registry::Signature;

use crate::error::Result;
use crate::paths::{algo_base, context_base};

/// Operations that must live in the same module, because registering one
/// needs the others to be present.
const COMPANIONS: &[&[&str]] = &[&["delay_automaton", "is_synchronized"]];

/// A generated source file and how to build it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
	/// Base path relative to the plugin directory, without extension.
	pub relative: PathBuf,
	pub source: String,
	/// Extra linker arguments required by the types involved.
	pub link_args: Vec<String>,
}

/// Operations compiled together with `operation`, itself included, sorted.
pub fn companions(operation: &str) -> BTreeSet<&str> {
	COMPANIONS
		.iter()
		.find(|group| group.contains(&operation))
		.map(|group| group.iter().copied().collect())
		.unwrap_or_else(|| BTreeSet::from([operation]))
}

fn entry_point_header(printer: &mut Printer) {
	printer.header("vcsn_abi::Host");
	printer.header("vcsn_abi::VcsnHostV1");
	printer.header("vcsn_abi::VcsnStatus");
}

fn open_entry_point(printer: &mut Printer) {
	printer.newline();
	printer.line("#[unsafe(no_mangle)]");
	printer.line("pub unsafe extern \"C\" fn vcsn_register_v1(host: *const VcsnHostV1) -> VcsnStatus {");
	printer.indent();
	printer.line("let host = match unsafe { Host::from_raw(host) } {");
	printer.indent();
	printer.line("Ok(host) => host,");
	printer.line("Err(status) => return status,");
	printer.dedent();
	printer.line("};");
}

fn close_entry_point(printer: &mut Printer, result: &str) {
	printer.line(result);
	printer.dedent();
	printer.line("}");
}

/// Module implementing `operation` (and its companions) for `signature`.
pub fn algorithms_unit(operation: &str, signature: &Signature) -> Result<GeneratedUnit> {
	let operations = companions(operation);
	let mut printer = Printer::new();
	entry_point_header(&mut printer);

	let mut registrations = Vec::new();
	let mut count = 0;
	for op in &operations {
		let module = printer.header_algo(op);
		printer.line(&format!("// {op}."));
		let mut aliases = Vec::with_capacity(signature.len());
		for part in signature.iter() {
			let node = parse_type(part)?;
			let alias = format!("T{count}");
			printer.emit(&format!("type {alias} = "));
			printer.visit(&node)?;
			printer.line(";");
			aliases.push(alias);
			count += 1;
		}
		printer.newline();
		registrations.push((op, module, aliases));
	}

	let parts: Vec<String> = signature.iter().map(|p| format!("{p:?}")).collect();
	open_entry_point(&mut printer);
	for (op, module, aliases) in &registrations {
		printer.line("let status = host.register(");
		printer.indent();
		printer.line(&format!("{op:?},"));
		printer.line(&format!("&[{}],", parts.join(", ")));
		printer.line(&format!("{module}::dyn_::{op}::<{}> as *const (),", aliases.join(", ")));
		printer.dedent();
		printer.line(");");
		printer.line("if !status.is_ok() {");
		printer.indent();
		printer.line("return status;");
		printer.dedent();
		printer.line("}");
	}
	close_entry_point(&mut printer, "VcsnStatus::Ok");

	let first = operations.first().copied().unwrap_or(operation);
	let link_args = printer.link_args().map(str::to_string).collect();
	Ok(GeneratedUnit {
		relative: algo_base(first, &signature.to_string()),
		source: printer.finish(),
		link_args,
	})
}

/// Module instantiating every operation the library provides for `context`.
pub fn context_unit(context: &str) -> Result<GeneratedUnit> {
	let normalized = normalize_context(context)?;
	let mut printer = Printer::new();
	entry_point_header(&mut printer);
	printer.header("vcsn::ctx::instantiate");

	printer.emit("type Ctx = ");
	printer.visit(&normalized.descriptor)?;
	printer.line(";");

	open_entry_point(&mut printer);
	close_entry_point(&mut printer, "instantiate::register_all::<Ctx>(&host)");

	let link_args = printer.link_args().map(str::to_string).collect();
	Ok(GeneratedUnit {
		relative: context_base(&normalized.short),
		source: printer.finish(),
		link_args,
	})
}
