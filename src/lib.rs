#![doc(html_root_url = "https://docs.rs/storefront-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A string-templated storefront for the browser.
//!
//! Pages are plain `fn`s that read hook-style state from a [`RenderSession`](`hook::RenderSession`)
//! and return markup. The [`Router`](`router::Router`) injects that markup into one root element,
//! mounts listeners on it and tears them down again before the next render.
//! The cart is an observable store that persists itself to `localStorage`.
//!
//! Call [`start`] once from JavaScript to boot the storefront into `#root`.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod hook;
pub mod ledger;
pub mod listeners;
pub mod pages;
pub mod query;
pub mod render;
pub mod router;
pub mod schedule;
pub mod views;

use api::HttpCatalog;
use cart::{CartStore, LocalStorage};
use config::Config;
use core::cell::RefCell;
use pages::Storefront;
use router::Router;
use std::{rc::Rc, sync::Once};
use tracing::{info, warn};
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsValue};

struct App {
	router: Router<Storefront>,
	/// Backs `window.navigate`.
	_navigate: Closure<dyn Fn(String)>,
}

thread_local! {
	static APP: RefCell<Option<App>> = RefCell::new(None);
}

static LOGGING: Once = Once::new();

/// Boots the storefront.
///
/// `config_json` is an optional JSON object with [`Config`] fields, e.g. `{"rootId": "app"}`.
/// Calling this again replaces the running storefront.
///
/// # Errors
///
/// Iff there's no `window`, no root element or the router can't listen for history changes.
#[wasm_bindgen]
pub fn start(config_json: Option<String>) -> Result<(), JsValue> {
	console_error_panic_hook::set_once();

	let parsed = config_json.as_deref().map(Config::parse).transpose();
	let config = parsed.as_ref().ok().cloned().flatten().unwrap_or_default();
	LOGGING.call_once(|| {
		tracing_wasm::set_as_global_default_with_config(tracing_wasm::WASMLayerConfigBuilder::new().set_max_level(config.max_level()).build());
	});
	if let Err(error) = parsed {
		warn!("Ignoring malformed configuration: {}", error);
	}

	let window = web_sys::window().ok_or_else(|| JsValue::from_str("no `window` available"))?;
	let document = window.document().ok_or_else(|| JsValue::from_str("no `document` available"))?;
	let root = document
		.get_element_by_id(&config.root_id)
		.ok_or_else(|| JsValue::from_str(&format!("no element with id `{}`", config.root_id)))?;

	let cart = CartStore::new(LocalStorage, config.storage_key.clone());
	let catalog = Rc::new(HttpCatalog::new(&config.api_base));
	let router = Router::new(root, pages::routes(), Rc::new(Storefront::new(catalog, cart, config)));
	router.listen().map_err(|error| JsValue::from_str(&error.to_string()))?;

	let global_navigate = Closure::wrap(Box::new(navigate) as Box<dyn Fn(String)>);
	js_sys::Reflect::set(&window, &JsValue::from_str("navigate"), global_navigate.as_ref())?;

	let previous = APP.with(|app| {
		app.borrow_mut().replace(App {
			router: router.clone(),
			_navigate: global_navigate,
		})
	});
	if let Some(previous) = previous {
		info!("Replacing the running storefront.");
		previous.router.unmount();
	}

	info!("Storefront started.");
	router.render_route();
	Ok(())
}

/// Client-side navigation to `path` (pathname plus optional query), also installed as `window.navigate`.
#[wasm_bindgen]
#[allow(clippy::needless_pass_by_value)]
pub fn navigate(path: String) {
	match APP.with(|app| app.borrow().as_ref().map(|app| app.router.clone())) {
		Some(router) => router.navigate(&path),
		None => warn!(path = %path, "`navigate` called before `start`."),
	}
}
