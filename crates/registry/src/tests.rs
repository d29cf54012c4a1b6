use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serial_test::serial;

use crate::{
	DispatchError, EntryPoint, IntegralConstant, Registries, Request, SpecializeError, Signature, Specializer, Value,
	registries,
};

crate::operation! {
	Determinize = "determinize": fn(Value, String) -> String;
	Focus = "focus": fn(Value, IntegralConstant) -> u32;
	FocusAsText = "focus": fn(Value, String) -> String;
}

fn determinize(aut: Value, algo: String) -> String {
	format!("determinize({}, {algo})", aut.sname())
}

fn focus(_: Value, tape: IntegralConstant) -> u32 {
	tape.0
}

/// Registers `determinize` for whatever signature is requested.
#[derive(Default)]
struct Counting {
	calls: AtomicUsize,
	delay: Option<Duration>,
}

impl Specializer for Counting {
	fn specialize(&self, request: &Request<'_>, registries: &Registries) -> Result<(), SpecializeError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if let Some(delay) = self.delay {
			std::thread::sleep(delay);
		}
		let entry = determinize as fn(Value, String) -> String;
		registries.set_raw(request.operation, request.signature.clone(), entry.into_raw());
		Ok(())
	}
}

/// Fails every request, like a toolchain rejecting an out-of-range tape.
struct Rejecting;

impl Specializer for Rejecting {
	fn specialize(&self, request: &Request<'_>, _: &Registries) -> Result<(), SpecializeError> {
		Err(SpecializeError::Compile {
			assertions: vec![format!("{}: invalid tape number", request.operation)],
			command: "rustc plugin.rs".into(),
			diagnostics: "error[E0080]: evaluation panicked: focus: invalid tape number".into(),
		})
	}
}

/// Claims success without registering anything.
struct Forgetful;

impl Specializer for Forgetful {
	fn specialize(&self, _: &Request<'_>, _: &Registries) -> Result<(), SpecializeError> {
		Ok(())
	}
}

fn automaton() -> Value {
	Value::typed("mutable_automaton<lal_char(ab), b>", ()).unwrap()
}

fn determinize_sig() -> Signature {
	Signature::new(["mutable_automaton<context<letterset<char_letters>, b>>", "const std::string"])
}

#[test]
fn first_get_specializes_once_then_hits() {
	let counting = Arc::new(Counting::default());
	let registries = Registries::with_specializer(counting.clone());
	let registry = registries.registry::<Determinize>().unwrap();
	let sig = determinize_sig();

	assert!(registry.get0(&sig).is_none());
	let first = registry.get(&sig).unwrap();
	assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
	assert!(registry.get0(&sig).is_some());

	let second = registry.get(&sig).unwrap();
	assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
	assert_eq!(first.into_raw(), second.into_raw());
}

#[test]
fn call_derives_the_signature_from_arguments() {
	let counting = Arc::new(Counting::default());
	let registries = Registries::with_specializer(counting.clone());
	let registry = registries.registry::<Determinize>().unwrap();

	let out = registry.call((automaton(), "weighted".to_string())).unwrap();
	assert_eq!(out, "determinize(mutable_automaton<context<letterset<char_letters>, b>>, weighted)");
	assert_eq!(registry.signatures(), [determinize_sig()]);

	registry.call_with(&determinize_sig(), (automaton(), "boolean".to_string())).unwrap();
	assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn failure_lists_sorted_signatures_and_diagnostics() {
	let registries = Registries::with_specializer(Arc::new(Rejecting));
	let registry = registries.registry::<Focus>().unwrap();
	for ctx in ["lat<lal_char, lal_char>, z", "lat<lal_char, lal_char>, b", "lat<lal_char, lao>, q"] {
		let aut = format!("mutable_automaton<{ctx}>");
		let sig = Signature::normalized([aut.as_str(), "std::integral_constant<unsigned, 0>"]).unwrap();
		registry.set(sig, focus as fn(Value, IntegralConstant) -> u32);
	}

	let failed = Signature::normalized([
		"mutable_automaton<lat<lal_char, lal_char>, b>",
		"std::integral_constant<unsigned, 3>",
	])
	.unwrap();
	let err = registry.get(&failed).unwrap_err();
	assert!(!err.is_internal());
	let DispatchError::Unavailable { available, source, .. } = &err else {
		panic!("unexpected error: {err:?}");
	};
	let mut sorted = available.clone();
	sorted.sort();
	assert_eq!(available, &sorted);
	assert_eq!(source.assertions(), ["focus: invalid tape number"]);

	let text = err.to_string();
	assert!(text.starts_with(&format!("focus: no implementation available for {failed}\n")), "{text}");
	let listed: Vec<_> = text
		.lines()
		.skip_while(|l| *l != "  available versions:")
		.skip(1)
		.take_while(|l| l.starts_with("    "))
		.map(str::trim)
		.collect();
	let expected: Vec<_> = sorted.iter().map(ToString::to_string).collect();
	assert_eq!(listed, expected);
	assert!(text.contains(&format!("  failed signature:\n    {failed}")));
	assert!(text.contains("evaluation panicked: focus: invalid tape number"));
}

#[test]
fn failures_are_not_cached() {
	let registries = Registries::with_specializer(Arc::new(Rejecting));
	let registry = registries.registry::<Determinize>().unwrap();
	let sig = determinize_sig();
	assert!(registry.get(&sig).is_err());

	let counting = Arc::new(Counting::default());
	registries.set_specializer(counting.clone());
	assert!(registry.get(&sig).is_ok());
	assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_registration_is_an_internal_error() {
	let registries = Registries::with_specializer(Arc::new(Forgetful));
	let err = registries.registry::<Determinize>().unwrap().get(&determinize_sig()).unwrap_err();
	assert!(matches!(err, DispatchError::RegistrationInvariant { .. }));
	assert!(err.is_internal());
	assert!(err.to_string().contains("internal error"));
}

#[test]
fn without_specializer_misses_are_unavailable() {
	let registries = Registries::new();
	let err = registries.registry::<Determinize>().unwrap().get(&determinize_sig()).unwrap_err();
	assert!(matches!(
		err,
		DispatchError::Unavailable {
			source: SpecializeError::NoSpecializer,
			..
		}
	));
}

#[test]
fn entry_type_is_bound_per_name() {
	let registries = Registries::new();
	registries.registry::<Focus>().unwrap();
	let err = registries.registry::<FocusAsText>().unwrap_err();
	assert!(matches!(err, DispatchError::EntryTypeMismatch { .. }));
	assert_eq!(registries.names(), ["focus"]);
}

#[test]
fn concurrent_misses_share_one_specialization() {
	let counting = Arc::new(Counting {
		calls: AtomicUsize::new(0),
		delay: Some(Duration::from_millis(50)),
	});
	let registries = Registries::with_specializer(counting.clone());
	let sig = determinize_sig();
	let barrier = Barrier::new(8);

	std::thread::scope(|scope| {
		for _ in 0..8 {
			scope.spawn(|| {
				let registry = registries.registry::<Determinize>().unwrap();
				barrier.wait();
				registry.get(&sig).unwrap();
			});
		}
	});
	assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn global_catalogue_is_shared() {
	let a = registries();
	let b = registries();
	assert!(std::ptr::eq(a, b));

	let sig = Signature::new(["global-test"]);
	a.set_raw("global_catalogue_entry", sig.clone(), (focus as fn(Value, IntegralConstant) -> u32).into_raw());
	assert!(b.get0_raw("global_catalogue_entry", &sig).is_some());
	assert!(b.names().contains(&"global_catalogue_entry".to_string()));
}

#[derive(Clone, Default)]
struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

impl std::io::Write for Captured {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

/// Runs `f` under an info-level subscriber and returns what it logged.
fn logged(f: impl FnOnce()) -> String {
	let captured = Captured::default();
	let writer = captured.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_max_level(tracing::Level::INFO)
		.with_ansi(false)
		.with_writer(move || writer.clone())
		.finish();
	tracing::subscriber::with_default(subscriber, f);
	let bytes = captured.0.lock().clone();
	String::from_utf8(bytes).unwrap()
}

#[test]
#[serial]
fn debug_toggle_logs_gets_and_sets() {
	let registries = Registries::new();
	let sig = determinize_sig();
	let entry = (determinize as fn(Value, String) -> String).into_raw();

	crate::set_debug(true);
	assert!(crate::debug_enabled());
	let on = logged(|| {
		registries.set_raw("determinize", sig.clone(), entry);
		registries.get0_raw("determinize", &sig);
	});
	crate::set_debug(false);
	assert!(!crate::debug_enabled());
	let off = logged(|| {
		registries.get0_raw("determinize", &sig);
	});

	assert!(on.contains("registry set"), "{on}");
	assert!(on.contains("registry get"), "{on}");
	assert!(on.contains("operation=determinize"), "{on}");
	assert!(on.contains(&sig.to_string()), "{on}");
	assert_eq!(off, "");
}
