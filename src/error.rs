//! Error types, one `enum` per concern.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Misuse of the hook protocol. These are program errors: a component that produces one is broken, not unlucky.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
	#[error("`use_state` was called outside of a prepared render session")]
	NotPrepared,
	#[error("hook slot {index} holds a different type than `{expected}`; `use_state` calls must happen in the same order on every render")]
	SlotTypeMismatch { index: usize, expected: &'static str },
	#[error("render called `use_state` {found} time(s), but the previous render called it {expected} time(s)")]
	CallCountChanged { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum RenderError {
	#[error(transparent)]
	Hook(#[from] HookError),
	#[error("missing route parameter `{0}`")]
	MissingParam(&'static str),
	#[error(transparent)]
	Api(#[from] ApiError),
	#[error("the router was dropped before the render ran")]
	RouterGone,
	#[error("no `window` available")]
	NoWindow,
	#[error("JavaScript error: {0}")]
	Js(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
	#[error("no `window` available")]
	NoWindow,
	#[error("request to {url} failed: {message}")]
	Network { url: String, message: String },
	#[error("request to {url} returned HTTP {status}")]
	Status { url: String, status: u16 },
	#[error("product {0} not found")]
	NotFound(String),
	#[error("malformed response body: {0}")]
	Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("storage is unavailable")]
	Unavailable,
	#[error("storage error: {0}")]
	Js(String),
}

/// Renders a thrown JavaScript value for logs and error messages.
#[must_use]
pub fn describe_js(value: &JsValue) -> String {
	value
		.as_string()
		.or_else(|| js_sys::JSON::stringify(value).ok().and_then(|s| s.as_string()))
		.unwrap_or_else(|| format!("{:?}", value))
}

impl From<JsValue> for RenderError {
	fn from(value: JsValue) -> Self {
		Self::Js(describe_js(&value))
	}
}

impl From<JsValue> for StorageError {
	fn from(value: JsValue) -> Self {
		Self::Js(describe_js(&value))
	}
}
