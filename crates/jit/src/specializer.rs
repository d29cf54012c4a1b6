//! The native [`Specializer`]: generate, build, load.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use vcsn_registry::{Registries, Request, Signature, SpecializeError, Specializer};

use crate::config::JitConfig;
use crate::error::{IoContext, Result};
use crate::loader::{DylibLoader, LoadReport, ModuleLoader};
use crate::paths::{needs_rebuild, stage, tmpname, with_suffix};
use crate::toolchain::{BuildJob, Rustc, Toolchain};
use crate::translate::{GeneratedUnit, algorithms_unit, context_unit};

/// Compiles missing instantiations into modules under the plugin directory
/// and loads them.
///
/// Sources are staged atomically and a module is rebuilt only when its
/// source is newer, so a warm plugin directory costs one load per module.
/// Builds of one module are serialized, whichever operation or catalogue
/// asked for it.
pub struct NativeSpecializer {
	config: JitConfig,
	toolchain: Arc<dyn Toolchain>,
	loader: Arc<dyn ModuleLoader>,
	building: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for NativeSpecializer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NativeSpecializer")
			.field("plugindir", &self.config.plugindir())
			.finish_non_exhaustive()
	}
}

impl NativeSpecializer {
	pub fn new(config: JitConfig, toolchain: Arc<dyn Toolchain>, loader: Arc<dyn ModuleLoader>) -> Self {
		Self {
			config,
			toolchain,
			loader,
			building: Mutex::new(HashMap::new()),
		}
	}

	/// `rustc` and the platform loader.
	pub fn from_config(config: JitConfig) -> Result<Self> {
		let toolchain = Rustc::from_config(&config)?;
		Ok(Self::new(config, Arc::new(toolchain), Arc::new(DylibLoader::new())))
	}

	pub fn config(&self) -> &JitConfig {
		&self.config
	}

	/// Builds and loads the module implementing `operation` for `signature`.
	pub fn compile(&self, operation: &str, signature: &Signature, registries: &Registries) -> Result<LoadReport> {
		let unit = algorithms_unit(operation, signature)?;
		self.build_and_load(&unit, registries)
	}

	/// Builds and loads the module instantiating `context`.
	pub fn compile_context(&self, context: &str, registries: &Registries) -> Result<LoadReport> {
		let unit = context_unit(context)?;
		self.build_and_load(&unit, registries)
	}

	/// Writes the source of `unit` and returns its path, without building.
	pub fn generate(&self, unit: &GeneratedUnit) -> Result<PathBuf> {
		let source = with_suffix(&self.config.plugindir().join(&unit.relative), ".rs");
		if stage(&source, &unit.source)? {
			debug!(source = %source.display(), "wrote source");
		}
		Ok(source)
	}

	fn build_and_load(&self, unit: &GeneratedUnit, registries: &Registries) -> Result<LoadReport> {
		let base = self.config.plugindir().join(&unit.relative);
		let slot = self.building.lock().entry(base.clone()).or_default().clone();
		let _guard = slot.lock();
		let source = self.generate(unit)?;
		let library = with_suffix(&base, &format!(".{}", std::env::consts::DLL_EXTENSION));

		if needs_rebuild(&source, &library) {
			let start = Instant::now();
			info!(module = %unit.relative.display(), "compiling");
			let tmp = tmpname(&base, std::env::consts::DLL_EXTENSION);
			let job = BuildJob {
				source: &source,
				output: &tmp,
				link_args: &unit.link_args,
			};
			let built = self.toolchain.build(&job);
			if let Err(e) = built {
				let _ = std::fs::remove_file(&tmp);
				return Err(e);
			}
			std::fs::rename(&tmp, &library).at(&library)?;
			self.record_time(start, &unit.relative);
		} else {
			debug!(library = %library.display(), "module is up to date");
		}

		Ok(self.loader.load(&library, registries)?)
	}

	fn record_time(&self, start: Instant, relative: &Path) {
		let ms = start.elapsed().as_millis();
		info!(module = %relative.display(), ms, "compiled");
		let Some(log) = &self.config.timing_log else {
			return;
		};
		let line = format!("{ms}ms, '{}'\n", relative.display());
		let appended = std::fs::OpenOptions::new()
			.create(true)
			.append(true)
			.open(log)
			.and_then(|mut f| f.write_all(line.as_bytes()));
		if let Err(e) = appended {
			warn!(log = %log.display(), error = %e, "cannot record compilation time");
		}
	}
}

impl Specializer for NativeSpecializer {
	fn specialize(&self, request: &Request<'_>, registries: &Registries) -> std::result::Result<(), SpecializeError> {
		match self.compile(request.operation, request.signature, registries) {
			Ok(report) => {
				debug!(operation = request.operation, registered = report.registered, "specialized");
				Ok(())
			}
			Err(e) => {
				debug!(operation = request.operation, signature = %request.signature, error = %e, "specialization failed");
				Err(e.into_specialize_error(self.config.verbose))
			}
		}
	}
}
