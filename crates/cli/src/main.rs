//! `vcsn`: command-line front end to the dyn runtime.

mod cli;

use std::path::Path;

use anyhow::{Context as _, bail};
use clap::Parser;
use tracing::debug;
use vcsn_context::{normalize_context, normalize_type};
use vcsn_jit::paths::inventory;
use vcsn_jit::translate::{algorithms_unit, context_unit};
use vcsn_jit::{JitConfig, JitError, LoadReport, NativeSpecializer};
use vcsn_registry::{Registries, Signature};

use crate::cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	match cli.command {
		Command::Normalize { is_type, text } => {
			let normalized = if is_type { normalize_type(&text) } else { normalize_context(&text) }?;
			println!("{}", normalized.short);
			println!("{}", normalized.full);
		}
		Command::Generate { context, name, types } => {
			let unit = if context {
				if !types.is_empty() {
					bail!("--context takes a single context name");
				}
				context_unit(&name)?
			} else {
				algorithms_unit(&name, &Signature::normalized(&types)?)?
			};
			debug!(module = %unit.relative.display(), link_args = ?unit.link_args, "generated");
			print!("{}", unit.source);
		}
		Command::Compile { operation, types } => {
			let signature = Signature::normalized(&types)?;
			let specializer = specializer(cli.plugindir.as_deref(), cli.verbose)?;
			let registries = Registries::new();
			let report = specializer
				.compile(&operation, &signature, &registries)
				.map_err(|e| explain(e, cli.verbose))
				.with_context(|| format!("while compiling {operation} for {signature}"))?;
			print_report(&report, &registries);
		}
		Command::CompileContext { context } => {
			let specializer = specializer(cli.plugindir.as_deref(), cli.verbose)?;
			let registries = Registries::new();
			let report = specializer
				.compile_context(&context, &registries)
				.map_err(|e| explain(e, cli.verbose))
				.with_context(|| format!("while compiling context {context}"))?;
			print_report(&report, &registries);
		}
		Command::List => {
			println!("operations:");
			for op in vcsn_dyn::ops::OPERATIONS {
				println!("  {op}");
			}
			let config = config(cli.plugindir.as_deref(), cli.verbose)?;
			let plugindir = config.plugindir();
			println!("modules in {}:", plugindir.display());
			for artifact in inventory(&plugindir) {
				let state = if artifact.built { "built" } else { "source only" };
				if artifact.operation.is_empty() {
					println!("  context {} [{state}]", artifact.name);
				} else {
					println!("  {} {} [{state}]", artifact.operation, artifact.name);
				}
			}
		}
	}
	Ok(())
}

fn config(plugindir: Option<&Path>, verbose: bool) -> anyhow::Result<JitConfig> {
	let mut config = JitConfig::load()?;
	if let Some(dir) = plugindir {
		config.plugindir = Some(dir.to_path_buf());
	}
	config.verbose |= verbose;
	Ok(config)
}

fn specializer(plugindir: Option<&Path>, verbose: bool) -> anyhow::Result<NativeSpecializer> {
	Ok(NativeSpecializer::from_config(config(plugindir, verbose)?)?)
}

/// Spells out assertions and toolchain output, which `JitError`'s own
/// message leaves to the caller.
fn explain(err: JitError, verbose: bool) -> anyhow::Error {
	let (assertions, command, diagnostics) = match err {
		JitError::Compile {
			assertions,
			command,
			diagnostics,
		} => (assertions, command, diagnostics),
		other => return other.into(),
	};
	let mut text = String::from("compilation failed");
	for assertion in &assertions {
		text.push_str(&format!("\n  {assertion}"));
	}
	if verbose || assertions.is_empty() {
		text.push_str(&format!("\n  diagnostics:\n{}", diagnostics.trim_end()));
	}
	text.push_str(&format!("\n  failed command:\n    {command}"));
	anyhow::anyhow!(text)
}

fn print_report(report: &LoadReport, registries: &Registries) {
	println!("{} ({} entries)", report.path.display(), report.registered);
	for name in registries.names() {
		for signature in registries.signatures(&name) {
			println!("  {name}{signature}");
		}
	}
}

/// Filter directives: `VCSN_LOG` when set, else by verbosity. Registry
/// events are let through when the registry debug toggle is on.
fn filter_directives(log: Option<String>, verbose: bool, registry_debug: bool) -> String {
	let mut directives = log.unwrap_or_else(|| {
		if verbose {
			"vcsn=debug,vcsn_jit=debug,vcsn_registry=debug,info".to_string()
		} else {
			"warn".to_string()
		}
	});
	if registry_debug && !verbose {
		directives.push_str(",vcsn_registry=info");
	}
	directives
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let log = std::env::var("VCSN_LOG").ok().filter(|v| !v.is_empty());
	let directives = filter_directives(log, verbose, vcsn_registry::debug_enabled());
	let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}
