//! The storefront's routes: catalog and product detail pages, plus the cart modal both of them carry.

pub mod cart_modal;
pub mod detail;
pub mod home;

pub use cart_modal::CartModal;

use crate::{
	api::{Catalog, Categories},
	cart::CartStore,
	config::Config,
	error::{ApiError, RenderError},
	router::RouteTable,
	views,
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use futures::future::{self, FutureExt, LocalBoxFuture};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event};

/// Async data that a page shows once it's there.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
	Loading,
	Loaded(T),
	/// A message for the user. Details go to the log.
	Failed(String),
}

/// Everything the storefront's pages share. This is the router's environment.
pub struct Storefront {
	pub catalog: Rc<dyn Catalog>,
	pub cart: Rc<CartStore>,
	pub config: Config,
	pub cart_modal: CartModal,
	categories: RefCell<Option<Categories>>,
}
impl Debug for Storefront {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Storefront")
			.field("cart", &self.cart)
			.field("config", &self.config)
			.field("cart_modal", &self.cart_modal)
			.field("categories_cached", &self.categories.borrow().is_some())
			.finish_non_exhaustive()
	}
}

impl Storefront {
	#[must_use]
	pub fn new(catalog: Rc<dyn Catalog>, cart: Rc<CartStore>, config: Config) -> Self {
		Self {
			catalog,
			cart,
			config,
			cart_modal: CartModal::default(),
			categories: RefCell::new(None),
		}
	}

	/// The category tree, fetched once and then served from memory. Failures aren't cached.
	pub fn categories(self: &Rc<Self>) -> LocalBoxFuture<'static, Result<Categories, ApiError>> {
		if let Some(cached) = self.categories.borrow().clone() {
			return future::ready(Ok(cached)).boxed_local();
		}

		let this = Rc::clone(self);
		let request = self.catalog.categories();
		async move {
			let categories = request.await?;
			debug!(top_level = categories.0.len(), "Cached categories.");
			*this.categories.borrow_mut() = Some(categories.clone());
			Ok(categories)
		}
		.boxed_local()
	}
}

/// The storefront's route table.
#[must_use]
pub fn routes() -> RouteTable<Storefront> {
	RouteTable::new(views::not_found, error_view)
		.route_with_mount("/", home::component, home::mount)
		.route("/products/:id", detail::component)
}

fn error_view(error: &RenderError) -> String {
	views::error_page(match error {
		RenderError::MissingParam(_) => "상품 ID가 제공되지 않았습니다.",
		RenderError::Api(ApiError::NotFound(_)) => "상품을 찾을 수 없습니다.",
		_ => "페이지를 불러오지 못했습니다.",
	})
}

/// `/products/{id}` with `id` percent-encoded.
#[must_use]
pub fn product_href(product_id: &str) -> String {
	format!("/products/{}", utf8_percent_encode(product_id, NON_ALPHANUMERIC))
}

/// The closest ancestor-or-self of the event's target matching `selector`.
fn closest(event: &Event, selector: &str) -> Option<Element> {
	let target: Element = event.target()?.dyn_into().ok()?;
	target.closest(selector).ok().flatten()
}

/// The `data-{name}` attribute of `element`, or empty.
fn data(element: &Element, name: &str) -> String {
	element.get_attribute(&format!("data-{}", name)).unwrap_or_default()
}
