//! Per-operation registry of specialized entry points.
//!
//! # Role
//!
//! A [`Registry`] maps a [`Signature`] to the entry point implementing its
//! operation for those argument types. On a miss, [`Registry::get`] asks the
//! catalogue's [`Specializer`](crate::Specializer) to produce one, then looks
//! again.
//!
//! # Invariants
//!
//! - Entries are never evicted; once `get` succeeds for a signature, later
//!   lookups return the same entry unless a module overwrites it with `set`.
//! - Concurrent misses on one signature share a single specialization.
//! - A failed specialization is not cached; the next call retries.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use tracing::{info, trace};

use crate::entry::{EntryPoint, Invoke, Operation, RawEntry};
use crate::error::DispatchError;
use crate::registries::Registries;
use crate::signature::Signature;
use crate::specializer::{Request, SpecializeError};
use crate::value::Arguments;

const DEBUG_UNSET: u8 = 2;
static DEBUG: AtomicU8 = AtomicU8::new(DEBUG_UNSET);

fn env_flag(name: &str) -> bool {
	std::env::var_os(name).is_some_and(|v| !v.is_empty() && v != "0")
}

/// Whether every `get`/`set` is logged at info level.
///
/// Defaults to `VCSN_DEBUG_REGISTRY` (or the legacy `YYDEBUG`) being set.
pub fn debug_enabled() -> bool {
	match DEBUG.load(Ordering::Relaxed) {
		DEBUG_UNSET => {
			let on = env_flag("VCSN_DEBUG_REGISTRY") || env_flag("YYDEBUG");
			DEBUG.store(on as u8, Ordering::Relaxed);
			on
		}
		v => v == 1,
	}
}

/// Overrides the environment toggle.
pub fn set_debug(on: bool) {
	DEBUG.store(on as u8, Ordering::Relaxed);
}

macro_rules! registry_event {
	($op:expr, $action:literal, $sig:expr) => {
		if debug_enabled() {
			info!(operation = %$op, signature = %$sig, "registry {}", $action);
		} else {
			trace!(operation = %$op, signature = %$sig, "registry {}", $action);
		}
	};
}

#[derive(Default)]
struct Flight {
	result: OnceLock<Result<(), SpecializeError>>,
}

/// Untyped storage behind a [`Registry`].
pub(crate) struct RegistryCore {
	name: Arc<str>,
	entry_type: OnceLock<(TypeId, &'static str)>,
	entries: RwLock<BTreeMap<Signature, RawEntry>>,
	flights: Mutex<HashMap<Signature, Arc<Flight>>>,
}

impl RegistryCore {
	pub(crate) fn new(name: &str) -> Self {
		Self {
			name: name.into(),
			entry_type: OnceLock::new(),
			entries: RwLock::new(BTreeMap::new()),
			flights: Mutex::new(HashMap::new()),
		}
	}

	pub(crate) fn name(&self) -> &str {
		&self.name
	}

	/// Binds the entry type on first typed access and checks it afterwards.
	pub(crate) fn bind<E: 'static>(&self) -> Result<(), DispatchError> {
		let requested = (TypeId::of::<E>(), std::any::type_name::<E>());
		let (id, registered) = *self.entry_type.get_or_init(|| requested);
		if id != requested.0 {
			return Err(DispatchError::EntryTypeMismatch {
				operation: self.name.to_string(),
				registered,
				requested: requested.1,
			});
		}
		Ok(())
	}

	pub(crate) fn get0(&self, signature: &Signature) -> Option<RawEntry> {
		registry_event!(self.name, "get", signature);
		self.entries.read().get(signature).copied()
	}

	pub(crate) fn set(&self, signature: Signature, entry: RawEntry) {
		registry_event!(self.name, "set", signature);
		self.entries.write().insert(signature, entry);
	}

	pub(crate) fn signatures(&self) -> Vec<Signature> {
		self.entries.read().keys().cloned().collect()
	}

	/// Runs or joins the in-flight specialization of `signature`.
	fn specialize(&self, signature: &Signature, registries: &Registries) -> Result<(), SpecializeError> {
		let (flight, owner) = {
			let mut flights = self.flights.lock();
			if self.entries.read().contains_key(signature) {
				return Ok(());
			}
			match flights.get(signature) {
				Some(flight) => (flight.clone(), false),
				None => {
					let flight = Arc::new(Flight::default());
					flights.insert(signature.clone(), flight.clone());
					(flight, true)
				}
			}
		};
		let result = flight
			.result
			.get_or_init(|| {
				let request = Request {
					operation: &self.name,
					signature,
				};
				registries.specialize(&request)
			})
			.clone();
		if owner {
			self.flights.lock().remove(signature);
		}
		result
	}
}

/// Typed handle on the registry of operation `Op`.
pub struct Registry<Op> {
	core: Arc<RegistryCore>,
	registries: Registries,
	_op: PhantomData<fn() -> Op>,
}

impl<Op> Clone for Registry<Op> {
	fn clone(&self) -> Self {
		Self {
			core: self.core.clone(),
			registries: self.registries.clone(),
			_op: PhantomData,
		}
	}
}

impl<Op> std::fmt::Debug for Registry<Op> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Registry").field("name", &self.core.name()).finish_non_exhaustive()
	}
}

impl<Op: Operation> Registry<Op> {
	pub(crate) fn new(core: Arc<RegistryCore>, registries: Registries) -> Self {
		Self {
			core,
			registries,
			_op: PhantomData,
		}
	}

	pub fn name(&self) -> &str {
		self.core.name()
	}

	/// Cached entry for `signature`; never specializes.
	pub fn get0(&self, signature: &Signature) -> Option<Op::Entry> {
		// SAFETY: `Registries::registry` checked that every typed access to
		// this name uses `Op::Entry`; modules register entries of that type.
		self.core.get0(signature).map(|raw| unsafe { Op::Entry::from_raw(raw) })
	}

	/// Entry for `signature`, specializing it on a miss.
	pub fn get(&self, signature: &Signature) -> Result<Op::Entry, DispatchError> {
		if let Some(entry) = self.get0(signature) {
			return Ok(entry);
		}
		if let Err(source) = self.core.specialize(signature, &self.registries) {
			return Err(DispatchError::Unavailable {
				operation: Op::NAME.to_string(),
				signature: signature.clone(),
				available: self.signatures(),
				source,
			});
		}
		self.get0(signature).ok_or_else(|| DispatchError::RegistrationInvariant {
			operation: Op::NAME.to_string(),
			signature: signature.clone(),
		})
	}

	/// Inserts or replaces the entry for `signature`.
	pub fn set(&self, signature: Signature, entry: Op::Entry) -> bool {
		self.core.set(signature, entry.into_raw());
		true
	}

	/// Known signatures, sorted.
	pub fn signatures(&self) -> Vec<Signature> {
		self.core.signatures()
	}

	/// Calls the entry for `signature` with `args`.
	pub fn call_with<A>(&self, signature: &Signature, args: A) -> Result<<Op::Entry as Invoke<A>>::Output, DispatchError>
	where
		Op::Entry: Invoke<A>,
	{
		Ok(self.get(signature)?.invoke(args))
	}

	/// Calls the entry for the signature named by `args` themselves.
	pub fn call<A>(&self, args: A) -> Result<<Op::Entry as Invoke<A>>::Output, DispatchError>
	where
		A: Arguments,
		Op::Entry: Invoke<A>,
	{
		let signature = args.signature();
		self.call_with(&signature, args)
	}
}
