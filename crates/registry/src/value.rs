//! Dynamically typed operands and the type-naming protocol.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use vcsn_context::{ContextError, Identities, normalize_type};

use crate::signature::Signature;

/// Values that know the canonical name of their type.
pub trait Named {
	fn sname(&self) -> Cow<'_, str>;
}

impl<T: Named + ?Sized> Named for &T {
	fn sname(&self) -> Cow<'_, str> {
		(**self).sname()
	}
}

macro_rules! named_static {
	($($ty:ty => $name:literal),* $(,)?) => {
		$(impl Named for $ty {
			fn sname(&self) -> Cow<'_, str> {
				Cow::Borrowed($name)
			}
		})*
	};
}

named_static! {
	bool => "bool",
	u32 => "unsigned",
	i32 => "int",
	f32 => "float",
	String => "const std::string",
	str => "const std::string",
	Option<u32> => "boost::optional<unsigned>",
	Identities => "vcsn::rat::identities",
}

/// A compile-time unsigned, such as a tape number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegralConstant(pub u32);

impl Named for IntegralConstant {
	fn sname(&self) -> Cow<'_, str> {
		Cow::Owned(format!("std::integral_constant<unsigned, {}>", self.0))
	}
}

/// Tuples of [`Named`] operands.
pub trait Arguments {
	fn signature(&self) -> Signature;
}

macro_rules! tuple_arguments {
	($($arg:ident $idx:tt),*) => {
		impl<$($arg: Named),*> Arguments for ($($arg,)*) {
			fn signature(&self) -> Signature {
				Signature::new([$(self.$idx.sname().into_owned()),*])
			}
		}
	};
}

impl Arguments for () {
	fn signature(&self) -> Signature {
		Signature::default()
	}
}

tuple_arguments!(A1 0);
tuple_arguments!(A1 0, A2 1);
tuple_arguments!(A1 0, A2 1, A3 2);
tuple_arguments!(A1 0, A2 1, A3 2, A4 3);
tuple_arguments!(A1 0, A2 1, A3 2, A4 3, A5 4);
tuple_arguments!(A1 0, A2 1, A3 2, A4 3, A5 4, A6 5);

/// A type-erased operand tagged with its type names.
#[derive(Clone)]
pub struct Value {
	sname: Arc<str>,
	vname: Arc<str>,
	payload: Arc<dyn Any + Send + Sync>,
}

impl Value {
	/// Wraps `payload` under already-canonical names.
	pub fn new<T: Any + Send + Sync>(sname: impl Into<Arc<str>>, vname: impl Into<Arc<str>>, payload: T) -> Self {
		Self {
			sname: sname.into(),
			vname: vname.into(),
			payload: Arc::new(payload),
		}
	}

	/// Wraps `payload`, normalizing `type_name` into both names.
	pub fn typed<T: Any + Send + Sync>(type_name: &str, payload: T) -> Result<Self, ContextError> {
		let names = normalize_type(type_name)?;
		Ok(Self::new(names.short, names.full, payload))
	}

	/// Canonical short name of the operand's type.
	pub fn sname(&self) -> &str {
		&self.sname
	}

	/// Full name, alphabets included.
	pub fn vname(&self) -> &str {
		&self.vname
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.payload.downcast_ref()
	}

	pub fn payload(&self) -> &Arc<dyn Any + Send + Sync> {
		&self.payload
	}
}

impl Named for Value {
	fn sname(&self) -> Cow<'_, str> {
		Cow::Borrowed(&self.sname)
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Value")
			.field("sname", &self.sname)
			.field("vname", &self.vname)
			.finish_non_exhaustive()
	}
}

/// Error raised by an algorithm once dispatched; propagated unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct AlgoError(pub String);

impl AlgoError {
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}
