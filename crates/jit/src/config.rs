//! Backend configuration.
//!
//! Settings come from `$VCSN_HOME/config.toml` (default `~/.vcsn`), then
//! environment variables override them one by one.
//!
//! ```toml
//! rustc = "/usr/local/bin/rustc"
//! rustflags = ["-C", "target-cpu=native"]
//! opt_level = "3"
//! library_path = ["/opt/vcsn/lib"]
//!
//! [extern]
//! vcsn = "/opt/vcsn/lib/libvcsn.rlib"
//! vcsn_abi = "/opt/vcsn/lib/libvcsn_abi.rlib"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("invalid ${var}: {message}")]
	Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JitConfig {
	/// Compiler binary; `rustc` from `PATH` when unset.
	pub rustc: Option<PathBuf>,
	pub rustflags: Vec<String>,
	pub edition: String,
	pub opt_level: String,
	/// `--extern` crates generated modules link against.
	#[serde(rename = "extern")]
	pub externs: BTreeMap<String, PathBuf>,
	/// `-L` search directories.
	pub library_path: Vec<PathBuf>,
	/// Where sources and modules are generated.
	pub plugindir: Option<PathBuf>,
	/// Include raw toolchain output in errors even when assertions explain
	/// the failure.
	pub verbose: bool,
	/// Log toolchain commands; keep debug info and intermediate files.
	pub debug: bool,
	/// File receiving one line per compilation with its duration.
	pub timing_log: Option<PathBuf>,
	#[serde(skip)]
	pub home: PathBuf,
}

impl Default for JitConfig {
	fn default() -> Self {
		Self {
			rustc: None,
			rustflags: Vec::new(),
			edition: "2024".to_string(),
			opt_level: "2".to_string(),
			externs: BTreeMap::new(),
			library_path: Vec::new(),
			plugindir: None,
			verbose: false,
			debug: false,
			timing_log: None,
			home: default_home(),
		}
	}
}

fn default_home() -> PathBuf {
	dirs::home_dir()
		.unwrap_or_else(std::env::temp_dir)
		.join(".vcsn")
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
	match path.strip_prefix("~") {
		Ok(rest) => dirs::home_dir().unwrap_or_else(std::env::temp_dir).join(rest),
		Err(_) => path.to_path_buf(),
	}
}

fn flag(value: &str) -> bool {
	!value.is_empty() && value != "0"
}

impl JitConfig {
	/// Reads the configuration file and the process environment.
	pub fn load() -> Result<Self, ConfigError> {
		Self::load_with(|var| std::env::var(var).ok())
	}

	/// Like [`JitConfig::load`], reading variables through `lookup`.
	pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let home = lookup("VCSN_HOME")
			.map(|h| expand_tilde(Path::new(&h)))
			.unwrap_or_else(default_home);
		let path = home.join("config.toml");
		let mut config = match std::fs::read_to_string(&path) {
			Ok(text) => Self::from_toml_str(&text).map_err(|source| ConfigError::Parse { path, source })?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
			Err(source) => return Err(ConfigError::Read { path, source }),
		};
		config.home = home;
		config.apply_env_with(lookup)?;
		Ok(config)
	}

	pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(text)
	}

	/// Overrides fields from `VCSN_*` variables.
	pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
		if let Some(rustc) = lookup("VCSN_RUSTC") {
			self.rustc = Some(PathBuf::from(rustc));
		}
		if let Some(flags) = lookup("VCSN_RUSTFLAGS") {
			self.rustflags = flags.split_whitespace().map(str::to_string).collect();
		}
		if let Some(edition) = lookup("VCSN_EDITION") {
			self.edition = edition;
		}
		if let Some(level) = lookup("VCSN_OPT_LEVEL") {
			if !matches!(level.as_str(), "0" | "1" | "2" | "3" | "s" | "z") {
				return Err(ConfigError::Invalid {
					var: "VCSN_OPT_LEVEL",
					message: format!("expected 0-3, s or z, got {level:?}"),
				});
			}
			self.opt_level = level;
		}
		if let Some(externs) = lookup("VCSN_EXTERN") {
			for item in externs.split(';').map(str::trim).filter(|s| !s.is_empty()) {
				let Some((name, path)) = item.split_once('=') else {
					return Err(ConfigError::Invalid {
						var: "VCSN_EXTERN",
						message: format!("expected name=path, got {item:?}"),
					});
				};
				self.externs.insert(name.trim().to_string(), PathBuf::from(path.trim()));
			}
		}
		if let Some(paths) = lookup("VCSN_LIBRARY_PATH") {
			self.library_path = std::env::split_paths(&paths).collect();
		}
		if let Some(dir) = lookup("VCSN_PLUGINDIR") {
			self.plugindir = Some(PathBuf::from(dir));
		}
		if let Some(v) = lookup("VCSN_VERBOSE") {
			self.verbose = flag(&v);
		}
		if let Some(v) = lookup("VCSN_DEBUG") {
			self.debug = flag(&v);
		}
		if let Some(v) = lookup("VCSN_TIME")
			&& flag(&v)
		{
			self.timing_log = Some(if v == "1" {
				std::env::temp_dir().join("vcsn-compile.log")
			} else {
				PathBuf::from(v)
			});
		}
		Ok(())
	}

	/// Root of generated sources and modules.
	pub fn plugindir(&self) -> PathBuf {
		match &self.plugindir {
			Some(dir) => expand_tilde(dir),
			None => self.home.join("plugins"),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use pretty_assertions::assert_eq;

	use super::*;

	fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |k| map.get(k).cloned()
	}

	#[test]
	fn file_then_environment() {
		let home = tempfile::tempdir().unwrap();
		std::fs::write(
			home.path().join("config.toml"),
			"opt_level = \"3\"\nrustflags = [\"-Ctarget-cpu=native\"]\n\n[extern]\nvcsn = \"/opt/libvcsn.rlib\"\n",
		)
		.unwrap();
		let home_str = home.path().to_str().unwrap().to_string();
		let config = JitConfig::load_with(env(&[
			("VCSN_HOME", home_str.as_str()),
			("VCSN_EXTERN", "vcsn_abi=/opt/libvcsn_abi.rlib; vcsn=/usr/libvcsn.rlib"),
			("VCSN_VERBOSE", "1"),
		]))
		.unwrap();

		assert_eq!(config.opt_level, "3");
		assert_eq!(config.rustflags, ["-Ctarget-cpu=native"]);
		assert_eq!(config.externs["vcsn"], PathBuf::from("/usr/libvcsn.rlib"));
		assert_eq!(config.externs["vcsn_abi"], PathBuf::from("/opt/libvcsn_abi.rlib"));
		assert!(config.verbose);
		assert_eq!(config.plugindir(), home.path().join("plugins"));
	}

	#[test]
	fn plugindir_override() {
		let mut config = JitConfig::default();
		config
			.apply_env_with(env(&[("VCSN_PLUGINDIR", "/var/cache/vcsn"), ("VCSN_TIME", "/tmp/times.log")]))
			.unwrap();
		assert_eq!(config.plugindir(), PathBuf::from("/var/cache/vcsn"));
		assert_eq!(config.timing_log, Some(PathBuf::from("/tmp/times.log")));
	}

	#[test]
	fn invalid_values_are_reported() {
		let mut config = JitConfig::default();
		let err = config.apply_env_with(env(&[("VCSN_OPT_LEVEL", "fast")])).unwrap_err();
		assert_eq!(err.to_string(), "invalid $VCSN_OPT_LEVEL: expected 0-3, s or z, got \"fast\"");
		assert!(config.apply_env_with(env(&[("VCSN_EXTERN", "vcsn")])).is_err());
		assert!(JitConfig::from_toml_str("optimisation = 3").is_err());
	}

	#[test]
	fn missing_file_means_defaults() {
		let home = tempfile::tempdir().unwrap();
		let home_str = home.path().to_str().unwrap().to_string();
		let config = JitConfig::load_with(env(&[("VCSN_HOME", home_str.as_str())])).unwrap();
		assert_eq!(config.edition, "2024");
		assert_eq!(config.home, home.path());
	}
}
