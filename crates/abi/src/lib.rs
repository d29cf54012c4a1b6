//! C ABI between the dyn runtime and the plugin modules it compiles.
//!
//! A plugin module exports exactly one symbol, [`ENTRY_SYMBOL`], whose type is
//! [`VcsnPluginEntryV1`]. The loader calls it once, right after opening the
//! module, and hands it a [`VcsnHostV1`] table. The module registers every
//! `(operation, signature, entry point)` triple it implements through the
//! table's `register` callback, usually via the safe [`Host`] wrapper.
//!
//! Everything here is `#[repr(C)]` so that host and module only have to agree
//! on [`VCSN_ABI_VERSION`], not on the Rust compiler that built them.

use core::ffi::c_void;

/// Version of the host table layout. Bumped on any incompatible change.
pub const VCSN_ABI_VERSION: u32 = 1;

/// Name of the registration entry point every plugin module exports.
pub const ENTRY_SYMBOL: &[u8] = b"vcsn_register_v1\0";

/// Status codes crossing the module boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsnStatus {
	Ok = 0,
	Failed = 1,
	Incompatible = 2,
	InvalidArgument = 3,
}

impl VcsnStatus {
	pub fn is_ok(self) -> bool {
		self == VcsnStatus::Ok
	}
}

/// Borrowed UTF-8 string view.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VcsnStr {
	pub ptr: *const u8,
	pub len: usize,
}

impl VcsnStr {
	pub fn new(s: &str) -> Self {
		Self { ptr: s.as_ptr(), len: s.len() }
	}

	/// Reads the view back as a `&str`. A null pointer reads as `""`.
	///
	/// Returns `None` when the bytes are not valid UTF-8.
	///
	/// # Safety
	///
	/// `ptr` must be null or valid for reads of `len` bytes for `'a`.
	pub unsafe fn as_str<'a>(&self) -> Option<&'a str> {
		if self.ptr.is_null() {
			return Some("");
		}
		let bytes = unsafe { std::slice::from_raw_parts(self.ptr, self.len) };
		std::str::from_utf8(bytes).ok()
	}
}

/// Host callback inserting one entry point into the host's registries.
pub type RegisterFn = unsafe extern "C" fn(
	registries: *mut c_void,
	operation: VcsnStr,
	signature: *const VcsnStr,
	signature_len: usize,
	entry: *const c_void,
) -> VcsnStatus;

/// Table handed to a plugin's entry point.
#[repr(C)]
#[derive(Debug)]
pub struct VcsnHostV1 {
	pub struct_size: usize,
	pub abi_version: u32,
	/// Opaque handle passed back to `register`.
	pub registries: *mut c_void,
	pub register: RegisterFn,
}

/// Type of the exported [`ENTRY_SYMBOL`].
pub type VcsnPluginEntryV1 = unsafe extern "C" fn(host: *const VcsnHostV1) -> VcsnStatus;

/// Module-side view of a [`VcsnHostV1`].
#[derive(Debug, Clone, Copy)]
pub struct Host<'a> {
	raw: &'a VcsnHostV1,
}

impl<'a> Host<'a> {
	/// Validates the table the loader passed in.
	///
	/// # Safety
	///
	/// `host` must be null or point to a table that stays valid for `'a`.
	pub unsafe fn from_raw(host: *const VcsnHostV1) -> Result<Self, VcsnStatus> {
		let Some(raw) = (unsafe { host.as_ref() }) else {
			return Err(VcsnStatus::InvalidArgument);
		};
		if raw.abi_version != VCSN_ABI_VERSION || raw.struct_size < std::mem::size_of::<VcsnHostV1>() {
			return Err(VcsnStatus::Incompatible);
		}
		Ok(Self { raw })
	}

	/// Registers `entry` as the implementation of `operation` for `signature`.
	pub fn register(&self, operation: &str, signature: &[&str], entry: *const ()) -> VcsnStatus {
		if entry.is_null() {
			return VcsnStatus::InvalidArgument;
		}
		let signature: Vec<VcsnStr> = signature.iter().map(|s| VcsnStr::new(s)).collect();
		unsafe {
			(self.raw.register)(
				self.raw.registries,
				VcsnStr::new(operation),
				signature.as_ptr(),
				signature.len(),
				entry.cast(),
			)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Default)]
	struct Sink {
		seen: Vec<(String, Vec<String>)>,
	}

	unsafe extern "C" fn collect(
		registries: *mut c_void,
		operation: VcsnStr,
		signature: *const VcsnStr,
		signature_len: usize,
		_entry: *const c_void,
	) -> VcsnStatus {
		let sink = unsafe { &mut *registries.cast::<Sink>() };
		let parts = unsafe { std::slice::from_raw_parts(signature, signature_len) };
		let names = parts.iter().map(|p| unsafe { p.as_str() }.unwrap_or_default().to_string()).collect();
		let op = unsafe { operation.as_str() }.unwrap_or_default().to_string();
		sink.seen.push((op, names));
		VcsnStatus::Ok
	}

	fn entry() {}

	fn table(sink: &mut Sink, abi_version: u32) -> VcsnHostV1 {
		VcsnHostV1 {
			struct_size: std::mem::size_of::<VcsnHostV1>(),
			abi_version,
			registries: (sink as *mut Sink).cast(),
			register: collect,
		}
	}

	#[test]
	fn register_round_trips_through_table() {
		let mut sink = Sink::default();
		let raw = table(&mut sink, VCSN_ABI_VERSION);
		let host = unsafe { Host::from_raw(&raw) }.expect("compatible host");

		let status = host.register("determinize", &["mutable_automaton<lal>", "bool"], entry as fn() as *const ());
		assert!(status.is_ok());
		assert_eq!(
			sink.seen,
			vec![("determinize".to_string(), vec!["mutable_automaton<lal>".to_string(), "bool".to_string()])]
		);
	}

	#[test]
	fn rejects_null_and_mismatched_tables() {
		assert_eq!(unsafe { Host::from_raw(std::ptr::null()) }.unwrap_err(), VcsnStatus::InvalidArgument);

		let mut sink = Sink::default();
		let raw = table(&mut sink, VCSN_ABI_VERSION + 1);
		assert_eq!(unsafe { Host::from_raw(&raw) }.unwrap_err(), VcsnStatus::Incompatible);
	}

	#[test]
	fn null_entry_is_refused() {
		let mut sink = Sink::default();
		let raw = table(&mut sink, VCSN_ABI_VERSION);
		let host = unsafe { Host::from_raw(&raw) }.expect("compatible host");
		assert_eq!(host.register("trim", &[], std::ptr::null()), VcsnStatus::InvalidArgument);
		assert!(sink.seen.is_empty());
	}

	#[test]
	fn null_str_reads_empty() {
		let s = VcsnStr { ptr: std::ptr::null(), len: 4 };
		assert_eq!(unsafe { s.as_str() }, Some(""));
	}
}
