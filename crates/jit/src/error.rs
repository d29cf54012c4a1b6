use std::path::PathBuf;

use vcsn_context::{ContextError, PrintError};
use vcsn_registry::SpecializeError;

use crate::config::ConfigError;
use crate::loader::LoadError;

/// Errors produced while generating, building or loading a module.
#[derive(Debug, thiserror::Error)]
pub enum JitError {
	/// The toolchain rejected the generated source.
	#[error("compilation failed\n  failed command:\n    {command}")]
	Compile {
		assertions: Vec<String>,
		command: String,
		diagnostics: String,
	},
	#[error("toolchain unavailable: {0}")]
	Toolchain(String),
	#[error("I/O error on {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Context(#[from] ContextError),
	#[error(transparent)]
	Print(#[from] PrintError),
	#[error(transparent)]
	Load(#[from] LoadError),
}

pub type Result<T> = std::result::Result<T, JitError>;

pub(crate) trait IoContext<T> {
	fn at(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
	fn at(self, path: impl Into<PathBuf>) -> Result<T> {
		self.map_err(|source| JitError::Io {
			path: path.into(),
			source,
		})
	}
}

impl JitError {
	/// Converts into the registry's error type.
	///
	/// Raw toolchain output is kept when `verbose` is set or when no
	/// assertion explains the failure.
	pub fn into_specialize_error(self, verbose: bool) -> SpecializeError {
		match self {
			JitError::Compile {
				assertions,
				command,
				diagnostics,
			} => {
				let mut report = String::new();
				if verbose || assertions.is_empty() {
					report.push_str(diagnostics.trim_end());
					report.push('\n');
				}
				report.push_str(&format!("failed command:\n  {command}"));
				SpecializeError::Compile {
					assertions,
					command,
					diagnostics: report,
				}
			}
			JitError::Context(e) => SpecializeError::Malformed(e),
			JitError::Print(e) => SpecializeError::Unsupported(e),
			JitError::Load(e) => SpecializeError::Load {
				path: e.path().to_path_buf(),
				message: e.to_string(),
			},
			other => SpecializeError::Environment(other.to_string()),
		}
	}
}
