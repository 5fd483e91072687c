//! Path patterns: literal segments and `:name` captures.

use hashbrown::HashMap;
use percent_encoding::percent_decode_str;
use tracing::trace;

/// Marks a capturing segment in a route pattern.
pub const CAPTURE_PREFIX: char = ':';

/// Captured, percent-decoded path parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);
impl Params {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.insert(name.into(), value.into());
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
	path.split('/').filter(|segment| !segment.is_empty())
}

/// Matches `path` against `pattern`.
///
/// Empty segments are ignored on both sides, so `/products/42/` matches `/products/:id`.
/// The segment counts must be equal. There is no prefix matching.
///
/// Returns [`None`] if a literal segment differs or a captured segment isn't valid percent-encoded UTF-8.
#[must_use]
pub fn match_path(pattern: &str, path: &str) -> Option<Params> {
	if segments(pattern).count() != segments(path).count() {
		return None;
	}

	let mut params = Params::new();
	for (expected, actual) in segments(pattern).zip(segments(path)) {
		match expected.strip_prefix(CAPTURE_PREFIX) {
			Some(name) => match percent_decode_str(actual).decode_utf8() {
				Ok(value) => params.insert(name, value),
				Err(_) => {
					trace!(segment = actual, "Path segment isn't valid UTF-8 after decoding.");
					return None;
				}
			},
			None if expected == actual => (),
			None => return None,
		}
	}
	Some(params)
}
