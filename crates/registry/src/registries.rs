use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::entry::{Operation, RawEntry};
use crate::error::DispatchError;
use crate::registry::{Registry, RegistryCore};
use crate::signature::Signature;
use crate::specializer::{Request, SpecializeError, Specializer};

/// Catalogue of registries, one per operation name, created on first use.
///
/// Cloning shares the catalogue. Registries are never removed.
#[derive(Clone, Default)]
pub struct Registries {
	inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
	registries: RwLock<HashMap<String, Arc<RegistryCore>>>,
	specializer: RwLock<Option<Arc<dyn Specializer>>>,
}

impl Registries {
	/// Creates an empty catalogue with no specializer.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_specializer(specializer: Arc<dyn Specializer>) -> Self {
		let registries = Self::new();
		registries.set_specializer(specializer);
		registries
	}

	/// Installs the backend used on registry misses.
	pub fn set_specializer(&self, specializer: Arc<dyn Specializer>) {
		*self.inner.specializer.write() = Some(specializer);
	}

	pub fn has_specializer(&self) -> bool {
		self.inner.specializer.read().is_some()
	}

	/// Typed registry of `Op`.
	pub fn registry<Op: Operation>(&self) -> Result<Registry<Op>, DispatchError> {
		let core = self.core(Op::NAME);
		core.bind::<Op::Entry>()?;
		Ok(Registry::new(core, self.clone()))
	}

	/// Inserts an entry without type information; the module registration path.
	///
	/// The caller vouches that `entry` has the entry type of `operation`.
	pub fn set_raw(&self, operation: &str, signature: Signature, entry: RawEntry) {
		self.core(operation).set(signature, entry);
	}

	/// Cached entry of `operation` for `signature`; never specializes.
	pub fn get0_raw(&self, operation: &str, signature: &Signature) -> Option<RawEntry> {
		let core = self.inner.registries.read().get(operation).cloned()?;
		core.get0(signature)
	}

	/// Names of the registries created so far, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<_> = self.inner.registries.read().keys().cloned().collect();
		names.sort();
		names
	}

	/// Known signatures of `operation`, sorted; empty for unknown names.
	pub fn signatures(&self, operation: &str) -> Vec<Signature> {
		self.inner
			.registries
			.read()
			.get(operation)
			.map(|core| core.signatures())
			.unwrap_or_default()
	}

	pub(crate) fn core(&self, name: &str) -> Arc<RegistryCore> {
		if let Some(core) = self.inner.registries.read().get(name) {
			return core.clone();
		}
		self.inner
			.registries
			.write()
			.entry(name.to_string())
			.or_insert_with(|| {
				debug!(operation = name, "creating registry");
				Arc::new(RegistryCore::new(name))
			})
			.clone()
	}

	pub(crate) fn specialize(&self, request: &Request<'_>) -> Result<(), SpecializeError> {
		let specializer = self.inner.specializer.read().clone();
		let Some(specializer) = specializer else {
			return Err(SpecializeError::NoSpecializer);
		};
		debug!(operation = request.operation, signature = %request.signature, "specializing");
		specializer.specialize(request, self)
	}
}

impl std::fmt::Debug for Registries {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Registries")
			.field("names", &self.names())
			.field("specializer", &self.has_specializer())
			.finish()
	}
}

/// The process-wide catalogue.
pub fn registries() -> &'static Registries {
	static GLOBAL: OnceLock<Registries> = OnceLock::new();
	GLOBAL.get_or_init(Registries::new)
}
