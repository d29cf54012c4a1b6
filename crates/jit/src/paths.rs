//! Layout of the plugin directory.
//!
//! Type names can be arbitrarily long, so each path component derived from
//! one is cut into segments short enough for any filesystem.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::error::{IoContext, Result};

/// Longest path component derived from a type name.
pub const SEGMENT_LEN: usize = 150;

/// Splits `name` into `/`-separated segments of at most [`SEGMENT_LEN`] characters.
pub fn split_long(name: &str) -> String {
	let chars: Vec<char> = name.chars().map(|c| if c == '/' { '_' } else { c }).collect();
	chars
		.chunks(SEGMENT_LEN)
		.map(|chunk| chunk.iter().collect::<String>())
		.collect::<Vec<_>>()
		.join("/")
}

/// `base` with `suffix` appended verbatim to its last component.
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
	let mut name = OsString::from(base.as_os_str());
	name.push(suffix);
	PathBuf::from(name)
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary name next to `base`, unique per call in this process.
pub fn tmpname(base: &Path, ext: &str) -> PathBuf {
	let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
	with_suffix(base, &format!(".{}.{n}.{ext}", std::process::id()))
}

/// Base path (no extension, relative to the plugin directory) of the module
/// holding `operation` for a signature.
pub fn algo_base(operation: &str, signature: &str) -> PathBuf {
	Path::new("algos").join(operation).join(split_long(signature))
}

/// Base path (no extension, relative to the plugin directory) of the module
/// instantiating a context.
pub fn context_base(context: &str) -> PathBuf {
	Path::new("contexts").join(split_long(context))
}

/// Writes `content` to `target` through a temporary file.
///
/// An identical existing file is left untouched, preserving its timestamp so
/// the module built from it stays fresh. Returns whether `target` changed.
pub fn stage(target: &Path, content: &str) -> Result<bool> {
	if let Some(dir) = target.parent() {
		std::fs::create_dir_all(dir).at(dir)?;
	}
	let tmp = tmpname(target, "tmp");
	std::fs::write(&tmp, content).at(&tmp)?;
	if std::fs::read_to_string(target).is_ok_and(|old| old == content) {
		std::fs::remove_file(&tmp).at(&tmp)?;
		return Ok(false);
	}
	std::fs::rename(&tmp, target).at(target)?;
	Ok(true)
}

fn mtime(path: &Path) -> Option<SystemTime> {
	std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Whether `output` is missing or older than `source`.
pub fn needs_rebuild(source: &Path, output: &Path) -> bool {
	match (mtime(source), mtime(output)) {
		(Some(src), Some(out)) => src > out,
		_ => true,
	}
}

/// A generated module found in the plugin directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Artifact {
	/// `algos` or `contexts`.
	pub kind: String,
	/// Operation name; empty for contexts.
	pub operation: String,
	/// Signature or context name, segments rejoined.
	pub name: String,
	pub source: PathBuf,
	/// Whether an up-to-date library sits next to the source.
	pub built: bool,
}

/// Generated modules under `plugindir`, sorted.
pub fn inventory(plugindir: &Path) -> Vec<Artifact> {
	let mut found: Vec<Artifact> = WalkDir::new(plugindir)
		.into_iter()
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().is_file())
		.filter_map(|e| artifact(plugindir, e.into_path()))
		.collect();
	found.sort();
	found
}

fn artifact(plugindir: &Path, source: PathBuf) -> Option<Artifact> {
	let base = PathBuf::from(source.to_str()?.strip_suffix(".rs")?);
	let relative = base.strip_prefix(plugindir).ok()?;
	let parts: Vec<String> = relative.iter().map(|c| c.to_string_lossy().into_owned()).collect();
	let (kind, operation, name) = match parts.as_slice() {
		[kind, op, rest @ ..] if kind == "algos" && !rest.is_empty() => (kind.clone(), op.clone(), rest.concat()),
		[kind, rest @ ..] if kind == "contexts" && !rest.is_empty() => (kind.clone(), String::new(), rest.concat()),
		_ => return None,
	};
	let library = with_suffix(&base, &format!(".{}", std::env::consts::DLL_EXTENSION));
	Some(Artifact {
		kind,
		operation,
		name,
		built: !needs_rebuild(&source, &library),
		source,
	})
}
