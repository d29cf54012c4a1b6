use pretty_assertions::assert_eq;
use serial_test::serial;
use vcsn_registry::{AlgoError, DispatchError, Operation, Registries, Signature, SpecializeError, Value, registries};

use crate::ops::{self, OPERATIONS};
use crate::{Direction, Error};

fn automaton(ctx: &str) -> Value {
	Value::typed(&format!("mutable_automaton<{ctx}>"), ()).unwrap()
}

fn determinize_impl(aut: Value, algo: String) -> Result<Value, AlgoError> {
	if algo == "boolean" && !aut.sname().ends_with(", b>>") {
		return Err(AlgoError::new("determinize: boolean algorithm requires a Boolean automaton"));
	}
	Ok(Value::new(format!("determinized({})", aut.sname()), aut.vname().to_string(), ()))
}

fn make_context_impl(full: String) -> Result<Value, AlgoError> {
	Ok(Value::new("context", full, ()))
}

fn focus_impl(aut: Value, tape: vcsn_registry::IntegralConstant) -> Result<Value, AlgoError> {
	Ok(Value::new(format!("focus{}", tape.0), aut.vname().to_string(), ()))
}

fn proper_impl(aut: Value, direction: Direction, prune: bool) -> Result<Value, AlgoError> {
	Ok(Value::new(format!("{direction:?} {prune}"), aut.vname().to_string(), ()))
}

#[test]
#[serial]
fn dispatches_on_dynamic_types() {
	let registry = registries().registry::<ops::Determinize>().unwrap();
	let sig = Signature::normalized(["mutable_automaton<lal_char_z>", "const std::string"]).unwrap();
	registry.set(sig, determinize_impl);

	let det = crate::determinize(&automaton("lal_char(ab)_z"), "weighted").unwrap();
	assert_eq!(det.sname(), "determinized(mutable_automaton<context<letterset<char_letters>, z>>)");

	let err = crate::determinize(&automaton("lal_char(ab)_z"), "boolean").unwrap_err();
	assert!(matches!(err, Error::Algorithm(_)));
	assert_eq!(err.to_string(), "determinize: boolean algorithm requires a Boolean automaton");
}

#[test]
#[serial]
fn make_context_keys_on_the_short_name() {
	let registry = registries().registry::<ops::MakeContext>().unwrap();
	registry.set(Signature::new(["context<wordset<char_letters>, q>"]), make_context_impl);

	let ctx = crate::make_context("law_char(xyz), q").unwrap();
	assert_eq!(ctx.vname(), "context<wordset<char_letters(xyz)>, q>");
	let again = crate::make_context("context<wordset<char_letters(ab)>, q>").unwrap();
	assert_eq!(again.vname(), "context<wordset<char_letters(ab)>, q>");

	assert!(matches!(crate::make_context("law_char_bogus"), Err(Error::Context(_))));
}

#[test]
#[serial]
fn tape_numbers_and_directions_are_part_of_the_signature() {
	let focus = registries().registry::<ops::Focus>().unwrap();
	let aut = automaton("lat<lal_char, lal_char>, b");
	let sig = Signature::normalized([aut.sname(), "std::integral_constant<unsigned, 1>"]).unwrap();
	focus.set(sig, focus_impl);
	assert_eq!(crate::focus(&aut, 1).unwrap().sname(), "focus1");

	let proper = registries().registry::<ops::Proper>().unwrap();
	let sig = Signature::new([aut.sname(), "vcsn::direction", "bool"]);
	proper.set(sig, proper_impl);
	assert_eq!(crate::proper(&aut, Direction::Forward, false).unwrap().sname(), "Forward false");
}

#[test]
fn missing_implementation_without_backend() {
	let catalogue = Registries::new();
	let trim = catalogue.registry::<ops::Trim>().unwrap();
	let err = Error::from(trim.call((automaton("lal_char_zmin"),)).unwrap_err());
	let Error::Dispatch(DispatchError::Unavailable { source, .. }) = &err else {
		panic!("unexpected error: {err:?}");
	};
	assert!(matches!(source, SpecializeError::NoSpecializer));
	assert!(err.to_string().starts_with("trim: no implementation available for"));
}

#[test]
fn catalogue_names() {
	let mut sorted = OPERATIONS.to_vec();
	sorted.sort();
	assert_eq!(OPERATIONS, sorted.as_slice());
	for name in [
		ops::Determinize::NAME,
		ops::Focus::NAME,
		ops::MakeContext::NAME,
		ops::IsDeterministic::NAME,
		ops::Derivation::NAME,
	] {
		assert!(OPERATIONS.contains(&name), "{name}");
	}
}
