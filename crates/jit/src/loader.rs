//! Loading compiled modules into the registries.
//!
//! # Invariants
//!
//! - A loaded library is never closed: the entry points it registered stay
//!   reachable from the registries for the life of the process.
//! - Libraries are opened with global symbol visibility on Unix, so a module
//!   may resolve symbols exported by an earlier one.

use std::ffi::c_void;
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use parking_lot::Mutex;
use tracing::{debug, info};
use vcsn_abi::{ENTRY_SYMBOL, VCSN_ABI_VERSION, VcsnHostV1, VcsnPluginEntryV1, VcsnStatus, VcsnStr};
use vcsn_registry::{RawEntry, Registries, Signature};

/// Module loading failures.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
	#[error("cannot open {}: {message}", path.display())]
	Open { path: PathBuf, message: String },
	#[error("{} does not export vcsn_register_v1: {message}", path.display())]
	MissingEntry { path: PathBuf, message: String },
	#[error("{} registration failed with {status:?} after {registered} entries", path.display())]
	Registration {
		path: PathBuf,
		status: VcsnStatus,
		registered: usize,
	},
}

impl LoadError {
	pub fn path(&self) -> &Path {
		match self {
			LoadError::Open { path, .. } | LoadError::MissingEntry { path, .. } | LoadError::Registration { path, .. } => path,
		}
	}
}

/// What a successful load registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
	pub path: PathBuf,
	pub registered: usize,
}

/// Opens a built module and runs its registration entry point.
pub trait ModuleLoader: Send + Sync {
	fn load(&self, path: &Path, registries: &Registries) -> Result<LoadReport, LoadError>;
}

struct Registration<'a> {
	registries: &'a Registries,
	count: usize,
}

unsafe extern "C" fn host_register(
	ctx: *mut c_void,
	operation: VcsnStr,
	signature: *const VcsnStr,
	signature_len: usize,
	entry: *const c_void,
) -> VcsnStatus {
	// SAFETY: `ctx` is the `Registration` owned by `run_entry` for the
	// duration of the entry point call.
	let Some(registration) = (unsafe { ctx.cast::<Registration<'_>>().as_mut() }) else {
		return VcsnStatus::InvalidArgument;
	};
	let Some(operation) = (unsafe { operation.as_str() }) else {
		return VcsnStatus::InvalidArgument;
	};
	let parts: &[VcsnStr] = match (signature.is_null(), signature_len) {
		(_, 0) => &[],
		(true, _) => return VcsnStatus::InvalidArgument,
		(false, len) => unsafe { std::slice::from_raw_parts(signature, len) },
	};
	let mut names = Vec::with_capacity(parts.len());
	for part in parts {
		match unsafe { part.as_str() } {
			Some(name) => names.push(name.to_string()),
			None => return VcsnStatus::InvalidArgument,
		}
	}
	let Some(entry) = RawEntry::new(entry.cast()) else {
		return VcsnStatus::InvalidArgument;
	};
	registration.registries.set_raw(operation, Signature::new(names), entry);
	registration.count += 1;
	VcsnStatus::Ok
}

/// Calls a module's entry point against `registries`.
///
/// Returns the number of entries registered, or the failing status with the
/// number registered before the failure.
///
/// # Safety
///
/// `entry` must be a registration entry point honoring the `vcsn_abi`
/// contract, and every entry point it registers must have the entry type of
/// the operation it is registered under.
pub unsafe fn run_entry(entry: VcsnPluginEntryV1, registries: &Registries) -> Result<usize, (VcsnStatus, usize)> {
	let mut registration = Registration { registries, count: 0 };
	let host = VcsnHostV1 {
		struct_size: std::mem::size_of::<VcsnHostV1>(),
		abi_version: VCSN_ABI_VERSION,
		registries: (&mut registration as *mut Registration<'_>).cast(),
		register: host_register,
	};
	let status = unsafe { entry(&host) };
	match status {
		VcsnStatus::Ok => Ok(registration.count),
		status => Err((status, registration.count)),
	}
}

struct LoadedModule {
	path: PathBuf,
	_library: ManuallyDrop<Library>,
}

/// [`ModuleLoader`] backed by the platform dynamic loader.
#[derive(Default)]
pub struct DylibLoader {
	modules: Mutex<Vec<LoadedModule>>,
}

impl DylibLoader {
	pub fn new() -> Self {
		Self::default()
	}

	/// Paths of every module loaded so far.
	pub fn loaded(&self) -> Vec<PathBuf> {
		self.modules.lock().iter().map(|m| m.path.clone()).collect()
	}
}

#[cfg(unix)]
unsafe fn open(path: &Path) -> Result<Library, libloading::Error> {
	use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
	unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL) }.map(Library::from)
}

#[cfg(not(unix))]
unsafe fn open(path: &Path) -> Result<Library, libloading::Error> {
	unsafe { Library::new(path) }
}

impl ModuleLoader for DylibLoader {
	fn load(&self, path: &Path, registries: &Registries) -> Result<LoadReport, LoadError> {
		debug!(path = %path.display(), "loading module");
		// SAFETY: modules come from our own code generator and are built
		// against the same `vcsn-abi`.
		let library = unsafe { open(path) }.map_err(|e| LoadError::Open {
			path: path.to_path_buf(),
			message: e.to_string(),
		})?;
		let registered = unsafe {
			let entry: Symbol<VcsnPluginEntryV1> = library.get(ENTRY_SYMBOL).map_err(|e| LoadError::MissingEntry {
				path: path.to_path_buf(),
				message: e.to_string(),
			})?;
			run_entry(*entry, registries)
		};
		self.modules.lock().push(LoadedModule {
			path: path.to_path_buf(),
			_library: ManuallyDrop::new(library),
		});
		let registered = registered.map_err(|(status, registered)| LoadError::Registration {
			path: path.to_path_buf(),
			status,
			registered,
		})?;
		info!(path = %path.display(), registered, "loaded module");
		Ok(LoadReport {
			path: path.to_path_buf(),
			registered,
		})
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use vcsn_abi::Host;
	use vcsn_registry::{EntryPoint, Value};

	use super::*;

	vcsn_registry::operation! {
		Trim = "trim": fn(Value) -> Value;
	}

	fn trim(aut: Value) -> Value {
		aut
	}

	unsafe extern "C" fn good_module(host: *const VcsnHostV1) -> VcsnStatus {
		let host = match unsafe { Host::from_raw(host) } {
			Ok(host) => host,
			Err(status) => return status,
		};
		let entry = trim as fn(Value) -> Value;
		for ctx in ["mutable_automaton<context<letterset<char_letters>, b>>", "mutable_automaton<context<letterset<char_letters>, z>>"] {
			let status = host.register("trim", &[ctx], entry as *const ());
			if !status.is_ok() {
				return status;
			}
		}
		VcsnStatus::Ok
	}

	unsafe extern "C" fn half_module(host: *const VcsnHostV1) -> VcsnStatus {
		let Ok(host) = (unsafe { Host::from_raw(host) }) else {
			return VcsnStatus::Incompatible;
		};
		host.register("trim", &["mutable_automaton<context<letterset<char_letters>, q>>"], (trim as fn(Value) -> Value) as *const ());
		host.register("trim", &["x"], std::ptr::null())
	}

	#[test]
	fn entry_point_registers_into_registries() {
		let registries = Registries::new();
		let count = unsafe { run_entry(good_module, &registries) }.unwrap();
		assert_eq!(count, 2);

		let registry = registries.registry::<Trim>().unwrap();
		let sig = Signature::new(["mutable_automaton<context<letterset<char_letters>, z>>"]);
		let entry = registry.get0(&sig).unwrap();
		assert_eq!(entry.into_raw(), (trim as fn(Value) -> Value).into_raw());
		assert_eq!(registries.signatures("trim").len(), 2);
	}

	#[test]
	fn failing_entry_point_reports_progress() {
		let registries = Registries::new();
		let err = unsafe { run_entry(half_module, &registries) }.unwrap_err();
		assert_eq!(err, (VcsnStatus::InvalidArgument, 1));
	}

	#[test]
	fn missing_library() {
		let err = DylibLoader::new()
			.load(Path::new("/nonexistent/module.so"), &Registries::new())
			.unwrap_err();
		assert!(matches!(err, LoadError::Open { .. }));
		assert_eq!(err.path(), Path::new("/nonexistent/module.so"));
	}
}
