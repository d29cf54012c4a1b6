//! Type-erased entry points.
//!
//! Registries store bare code addresses ([`RawEntry`]); each operation fixes
//! the function-pointer type its entries have through [`EntryPoint`].

/// Address of a registered implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawEntry(*const ());

// SAFETY: a `RawEntry` is the address of a function in a module that is never
// unloaded; it carries no thread-affine state.
unsafe impl Send for RawEntry {}
unsafe impl Sync for RawEntry {}

impl RawEntry {
	/// Returns `None` for a null address.
	pub fn new(ptr: *const ()) -> Option<Self> {
		(!ptr.is_null()).then_some(Self(ptr))
	}

	pub fn as_ptr(self) -> *const () {
		self.0
	}
}

/// A function-pointer type that can be stored as a [`RawEntry`].
///
/// # Safety
///
/// Implementors must be plain function pointers, so that `from_raw` of an
/// address produced by `into_raw` (or registered by a module for the same
/// operation) yields a callable pointer of the same type.
pub unsafe trait EntryPoint: Copy + Send + Sync + 'static {
	fn into_raw(self) -> RawEntry;

	/// # Safety
	///
	/// `raw` must be the address of a function of exactly this type.
	unsafe fn from_raw(raw: RawEntry) -> Self;
}

/// Calls an entry point with a tuple of arguments.
pub trait Invoke<Args> {
	type Output;

	fn invoke(self, args: Args) -> Self::Output;
}

macro_rules! fn_entry_point {
	($($arg:ident $var:ident),*) => {
		// SAFETY: `fn` pointers are thin code addresses.
		unsafe impl<Ret: 'static, $($arg: 'static),*> EntryPoint for fn($($arg),*) -> Ret {
			fn into_raw(self) -> RawEntry {
				RawEntry(self as *const ())
			}

			unsafe fn from_raw(raw: RawEntry) -> Self {
				unsafe { std::mem::transmute_copy::<*const (), Self>(&raw.0) }
			}
		}

		impl<Ret, $($arg),*> Invoke<($($arg,)*)> for fn($($arg),*) -> Ret {
			type Output = Ret;

			#[allow(clippy::unused_unit)]
			fn invoke(self, args: ($($arg,)*)) -> Ret {
				let ($($var,)*) = args;
				self($($var),*)
			}
		}
	};
}

fn_entry_point!();
fn_entry_point!(A1 a1);
fn_entry_point!(A1 a1, A2 a2);
fn_entry_point!(A1 a1, A2 a2, A3 a3);
fn_entry_point!(A1 a1, A2 a2, A3 a3, A4 a4);
fn_entry_point!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
fn_entry_point!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);

/// An operation name bound to the type of its entry points.
pub trait Operation: 'static {
	/// Registry name, e.g. `"determinize"`.
	const NAME: &'static str;
	type Entry: EntryPoint;
}

/// Declares a unit type implementing [`Operation`].
///
/// ```
/// vcsn_registry::operation! {
///     /// Number of states.
///     pub NumStates = "num_states": fn(u32) -> u32;
/// }
/// assert_eq!(<NumStates as vcsn_registry::Operation>::NAME, "num_states");
/// ```
#[macro_export]
macro_rules! operation {
	($($(#[$meta:meta])* $vis:vis $ty:ident = $name:literal : $entry:ty;)+) => {
		$(
			$(#[$meta])*
			#[derive(Debug, Clone, Copy)]
			$vis struct $ty;

			impl $crate::Operation for $ty {
				const NAME: &'static str = $name;
				type Entry = $entry;
			}
		)+
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	fn add(a: u32, b: u32) -> u32 {
		a + b
	}

	#[test]
	fn raw_round_trip_preserves_the_function() {
		let entry = add as fn(u32, u32) -> u32;
		let raw = entry.into_raw();
		let back = unsafe { <fn(u32, u32) -> u32>::from_raw(raw) };
		assert_eq!(back.invoke((2, 3)), 5);
		assert_eq!(back.into_raw(), raw);
	}

	#[test]
	fn null_is_not_an_entry() {
		assert!(RawEntry::new(std::ptr::null()).is_none());
	}
}
