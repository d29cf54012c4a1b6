//! Rust compiler driver.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::config::JitConfig;
use crate::diagnostics;
use crate::error::{IoContext, JitError, Result};

/// One source file to turn into a loadable module.
#[derive(Debug, Clone, Copy)]
pub struct BuildJob<'a> {
	pub source: &'a Path,
	pub output: &'a Path,
	pub link_args: &'a [String],
}

/// Builds generated sources into dynamic libraries.
pub trait Toolchain: Send + Sync {
	fn build(&self, job: &BuildJob<'_>) -> Result<()>;
}

/// `rustc`, invoked directly with the configured externs and search paths.
#[derive(Debug, Clone)]
pub struct Rustc {
	program: PathBuf,
	config: JitConfig,
}

impl Rustc {
	/// Resolves the compiler binary.
	///
	/// # Errors
	///
	/// Returns [`JitError::Toolchain`] when no compiler can be found.
	pub fn from_config(config: &JitConfig) -> Result<Self> {
		let wanted = config.rustc.clone().unwrap_or_else(|| PathBuf::from("rustc"));
		let program = which::which(&wanted).map_err(|e| JitError::Toolchain(format!("{}: {e}", wanted.display())))?;
		debug!(rustc = %program.display(), "resolved compiler");
		Ok(Self {
			program,
			config: config.clone(),
		})
	}

	pub fn program(&self) -> &Path {
		&self.program
	}

	/// Command line building `job`.
	pub fn command(&self, job: &BuildJob<'_>) -> Command {
		let config = &self.config;
		let mut cmd = Command::new(&self.program);
		cmd.args(["--crate-type", "cdylib", "--crate-name", "vcsn_plugin"])
			.arg("--edition")
			.arg(&config.edition)
			.arg("-C")
			.arg(format!("opt-level={}", config.opt_level))
			.args(["--color", "never"]);
		if config.debug {
			cmd.args(["-C", "debuginfo=2", "-C", "save-temps"]);
		}
		cmd.args(&config.rustflags);
		for (name, path) in &config.externs {
			cmd.arg("--extern").arg(format!("{name}={}", path.display()));
		}
		for dir in &config.library_path {
			cmd.arg("-L").arg(dir);
		}
		for arg in job.link_args {
			cmd.arg("-C").arg(format!("link-arg={arg}"));
		}
		cmd.arg("-o").arg(job.output).arg(job.source);
		cmd.env("LC_ALL", "C");
		cmd
	}
}

/// Shell-like rendering of `cmd` for error messages.
pub fn render(cmd: &Command) -> String {
	std::iter::once(cmd.get_program())
		.chain(cmd.get_args())
		.map(|arg| {
			let arg = arg.to_string_lossy();
			if arg.is_empty() || arg.contains([' ', '<', '>', '(', ')', '\'', '"']) {
				format!("'{}'", arg.replace('\'', r"'\''"))
			} else {
				arg.into_owned()
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

impl Toolchain for Rustc {
	fn build(&self, job: &BuildJob<'_>) -> Result<()> {
		let mut cmd = self.command(job);
		let command = render(&cmd);
		if self.config.debug {
			info!(%command, "run");
		} else {
			debug!(%command, "run");
		}
		let output = cmd.output().at(&self.program)?;
		let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
		if !output.status.success() {
			return Err(JitError::Compile {
				assertions: diagnostics::assertions(&stderr),
				command,
				diagnostics: stderr,
			});
		}
		if !stderr.trim().is_empty() {
			warn!(source = %job.source.display(), "compiler warnings:\n{stderr}");
		}
		Ok(())
	}
}
