//! Dynamically typed entry points to the vcsn algorithms.
//!
//! Each function looks up the implementation matching the dynamic types of
//! its operands in the process-wide [`registries`], compiling and loading
//! one on first use once [`init`] has installed the native backend.
//!
//! ```no_run
//! vcsn_dyn::init()?;
//! let ctx = vcsn_dyn::make_context("lal_char(ab), b")?;
//! println!("{}", ctx.vname());
//! # Ok::<(), vcsn_dyn::Error>(())
//! ```

pub mod ops;

use std::sync::Arc;

use tracing::info;
use vcsn_context::{ContextError, normalize_context};
use vcsn_jit::{ConfigError, JitConfig, JitError, NativeSpecializer};
use vcsn_registry::{AlgoError, DispatchError, IntegralConstant, Operation, Registry, Signature};
pub use vcsn_registry::{Registries, Value, registries};

pub use crate::ops::Direction;
use crate::ops::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Dispatch(#[from] DispatchError),
	/// The algorithm ran and rejected its input.
	#[error(transparent)]
	Algorithm(#[from] AlgoError),
	#[error(transparent)]
	Context(#[from] ContextError),
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Jit(#[from] JitError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Installs the native backend configured from the environment.
pub fn init() -> Result<()> {
	init_with(JitConfig::load()?)
}

/// Installs the native backend with `config`.
pub fn init_with(config: JitConfig) -> Result<()> {
	let plugindir = config.plugindir();
	let specializer = NativeSpecializer::from_config(config)?;
	registries().set_specializer(Arc::new(specializer));
	info!(plugindir = %plugindir.display(), "native specializer installed");
	Ok(())
}

fn registry<Op: Operation>() -> Result<Registry<Op>> {
	Ok(registries().registry::<Op>()?)
}

pub fn accessible(aut: &Value) -> Result<Value> {
	Ok(registry::<Accessible>()?.call((aut.clone(),))??)
}

pub fn coaccessible(aut: &Value) -> Result<Value> {
	Ok(registry::<Coaccessible>()?.call((aut.clone(),))??)
}

pub fn trim(aut: &Value) -> Result<Value> {
	Ok(registry::<Trim>()?.call((aut.clone(),))??)
}

pub fn transpose(aut: &Value) -> Result<Value> {
	Ok(registry::<Transpose>()?.call((aut.clone(),))??)
}

pub fn complete(aut: &Value) -> Result<Value> {
	Ok(registry::<Complete>()?.call((aut.clone(),))??)
}

pub fn is_deterministic(aut: &Value) -> Result<bool> {
	Ok(registry::<IsDeterministic>()?.call((aut.clone(),))??)
}

pub fn is_trim(aut: &Value) -> Result<bool> {
	Ok(registry::<IsTrim>()?.call((aut.clone(),))??)
}

pub fn is_proper(aut: &Value) -> Result<bool> {
	Ok(registry::<IsProper>()?.call((aut.clone(),))??)
}

/// The determinized automaton.
///
/// `algo` is `"boolean"`, `"weighted"` or `"auto"`; the labelset of `aut`
/// must be free.
pub fn determinize(aut: &Value, algo: &str) -> Result<Value> {
	Ok(registry::<Determinize>()?.call((aut.clone(), algo.to_string()))??)
}

pub fn codeterminize(aut: &Value, algo: &str) -> Result<Value> {
	Ok(registry::<Codeterminize>()?.call((aut.clone(), algo.to_string()))??)
}

/// The minimized automaton; `aut` must be deterministic.
pub fn minimize(aut: &Value, algo: &str) -> Result<Value> {
	Ok(registry::<Minimize>()?.call((aut.clone(), algo.to_string()))??)
}

/// An equivalent automaton without spontaneous transitions.
pub fn proper(aut: &Value, direction: Direction, prune: bool) -> Result<Value> {
	Ok(registry::<Proper>()?.call((aut.clone(), direction, prune))??)
}

/// The automaton reading tape `tape` of a multitape automaton.
///
/// An out-of-range tape has no implementation: the error carries the
/// assertion raised while compiling it.
pub fn focus(aut: &Value, tape: u32) -> Result<Value> {
	Ok(registry::<Focus>()?.call((aut.clone(), IntegralConstant(tape)))??)
}

pub fn product(lhs: &Value, rhs: &Value) -> Result<Value> {
	Ok(registry::<Product>()?.call((lhs.clone(), rhs.clone()))??)
}

/// The first `max` accepted words, as a polynomial.
pub fn shortest(aut: &Value, max: u32) -> Result<Value> {
	Ok(registry::<Shortest>()?.call((aut.clone(), max))??)
}

pub fn derivation(expression: &Value, label: &Value, breaking: bool) -> Result<Value> {
	Ok(registry::<Derivation>()?.call((expression.clone(), label.clone(), breaking))??)
}

/// Builds a context from its name.
///
/// The implementation is looked up by the context's short name and receives
/// the full name, alphabet included.
pub fn make_context(name: &str) -> Result<Value> {
	let normalized = normalize_context(name)?;
	let signature = Signature::new([normalized.short]);
	Ok(registry::<MakeContext>()?.call_with(&signature, (normalized.full,))??)
}

#[cfg(test)]
mod tests;
