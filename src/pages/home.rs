//! The catalog page: search and filters in the URL, products fetched per navigation, more pages on scroll.

use super::{cart_modal, closest, data, product_href, Loadable, Storefront};
use crate::{
	api::{Categories, Product, ProductPage},
	error::RenderError,
	hook::RenderSession,
	listeners::{ListenerSet, Liveness, Observation},
	query::{FilterChange, HomeQuery},
	render::{Cleanup, MountContext, Navigator, RouteContext, View},
	views::{
		self,
		home::{end_of_list, product_cards, HomeState},
	},
};
use core::cell::Cell;
use futures::future;
use std::rc::Rc;
use tracing::{debug, error, info, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, Event, HtmlInputElement, HtmlSelectElement, KeyboardEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct HomeData {
	pub page: ProductPage,
	pub categories: Categories,
}

/// Renders the catalog for the query in the current URL.
///
/// The first pass of each navigation starts the product and category fetch.
///
/// # Errors
///
/// Only hook misuse. Fetch failures are shown inline.
pub fn component(context: &RouteContext<Storefront>, session: &RenderSession) -> Result<View<Storefront>, RenderError> {
	let store = &context.env;
	let query = HomeQuery::parse(&context.search, store.config.default_limit);
	let (data, set_data) = session.use_state(|| Loadable::<HomeData>::Loading)?;

	if session.passes() == 1 {
		let store = Rc::clone(store);
		let query = query.clone();
		spawn_local(async move {
			let result = future::try_join(store.catalog.products(&query), store.categories()).await;
			set_data.set(match result {
				Ok((page, categories)) => {
					debug!(products = page.products.len(), total = page.pagination.total, "Loaded catalog page.");
					Loadable::Loaded(HomeData { page, categories })
				}
				Err(error) => {
					error!("Failed to load the catalog: {}", error);
					Loadable::Failed(String::from("상품 목록을 불러오지 못했습니다."))
				}
			});
		});
	}

	let state = match &data {
		Loadable::Loading => HomeState::Loading,
		Loadable::Loaded(HomeData { page, categories }) => HomeState::Loaded { page, categories },
		Loadable::Failed(message) => HomeState::Failed(message),
	};
	Ok(View::Markup(views::home::page(&query, state, store.cart.len())))
}

/// Wires filters, product cards, infinite scroll and the cart modal.
pub fn mount(context: &MountContext<'_, Storefront>) -> Cleanup {
	let store = Rc::clone(&context.route.env);
	let root = context.root.clone();
	let query = Rc::new(HomeQuery::parse(&context.route.search, store.config.default_limit));
	let mut listeners = ListenerSet::new();

	listeners.listen(&root, "click", {
		let store = Rc::clone(&store);
		let query = Rc::clone(&query);
		let navigator = context.navigator().clone();
		move |event| on_click(&event, &store, &query, &navigator)
	});

	listeners.listen(&root, "change", {
		let query = Rc::clone(&query);
		let navigator = context.navigator().clone();
		move |event| {
			let change = if let Some(select) = closest(&event, "#limit-select").and_then(|select| select.dyn_into::<HtmlSelectElement>().ok()) {
				match select.value().parse() {
					Ok(limit) => FilterChange::Limit(limit),
					Err(_) => return warn!(value = %select.value(), "Ignoring an invalid page size."),
				}
			} else if let Some(select) = closest(&event, "#sort-select").and_then(|select| select.dyn_into::<HtmlSelectElement>().ok()) {
				FilterChange::Sort(select.value())
			} else {
				return;
			};
			navigator.navigate(&query.apply(change).href("/"));
		}
	});

	listeners.listen(&root, "keydown", {
		let query = Rc::clone(&query);
		let navigator = context.navigator().clone();
		move |event| {
			if event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key).as_deref() != Some("Enter") {
				return;
			}
			if let Some(input) = closest(&event, "#search-input").and_then(|input| input.dyn_into::<HtmlInputElement>().ok()) {
				navigator.navigate(&query.apply(FilterChange::Search(input.value().trim().to_owned())).href("/"));
			}
		}
	});

	infinite_scroll(&mut listeners, &root, &store, &query);
	cart_modal::attach(&mut listeners, &root, &store);
	listeners.into_cleanup()
}

fn on_click(event: &Event, store: &Storefront, query: &HomeQuery, navigator: &Navigator) {
	if let Some(button) = closest(event, ".add-to-cart-btn") {
		// Cards carry what a cart line needs.
		if let Some(card) = button.closest(".product-card").ok().flatten() {
			let product = Product {
				product_id: data(&card, "product-id"),
				title: data(&card, "title"),
				image: data(&card, "image"),
				lprice: data(&card, "lprice"),
				..Product::default()
			};
			info!(product_id = %product.product_id, "Adding to cart.");
			store.cart.add_item(&product, 1.0);
		}
		return;
	}

	if let Some(card) = closest(event, ".product-card") {
		return navigator.navigate(&product_href(&data(&card, "product-id")));
	}

	let change = if let Some(button) = closest(event, ".category1-filter-btn") {
		FilterChange::Category1(data(&button, "category1"))
	} else if let Some(button) = closest(event, ".category2-filter-btn") {
		FilterChange::Category2 {
			category1: data(&button, "category1"),
			category2: data(&button, "category2"),
		}
	} else if let Some(button) = closest(event, "[data-breadcrumb]") {
		match data(&button, "breadcrumb").as_str() {
			"category1" => FilterChange::Category1(data(&button, "category1")),
			"category2" => FilterChange::Category2 {
				category1: data(&button, "category1"),
				category2: data(&button, "category2"),
			},
			_ => FilterChange::ResetCategories,
		}
	} else {
		return;
	};
	navigator.navigate(&query.apply(change).href("/"));
}

#[derive(Debug)]
struct Scroll {
	next_page: Cell<u32>,
	has_next: Cell<bool>,
	loading: Cell<bool>,
}

/// Appends the next page whenever the sentinel comes into view, continuing from `#home-page`'s data attributes.
fn infinite_scroll(listeners: &mut ListenerSet, root: &Element, store: &Rc<Storefront>, query: &Rc<HomeQuery>) {
	let (container, sentinel) = match (
		root.query_selector("#home-page").ok().flatten(),
		root.query_selector("[data-observer-target]").ok().flatten(),
	) {
		(Some(container), Some(sentinel)) => (container, sentinel),
		_ => return trace!("No scroll sentinel."),
	};
	if data(&container, "has-next") != "true" {
		return;
	}
	let current: u32 = data(&container, "current-page").parse().unwrap_or(1);

	let scroll = Rc::new(Scroll {
		next_page: Cell::new(current.saturating_add(1)),
		has_next: Cell::new(true),
		loading: Cell::new(false),
	});
	let liveness = Liveness::new();

	listeners.observe_intersection(&sentinel, &store.config.scroll_root_margin, {
		let store = Rc::clone(store);
		let query = Rc::clone(query);
		let root = root.clone();
		let liveness = liveness.clone();
		move |observation| {
			if scroll.loading.get() || !scroll.has_next.get() || !liveness.is_alive() {
				return;
			}
			scroll.loading.set(true);
			let page = scroll.next_page.get();
			debug!(page, "Loading next page.");

			let request = store.catalog.products(&query.with_page(page));
			let scroll = Rc::clone(&scroll);
			let liveness = liveness.clone();
			let root = root.clone();
			let observation = observation.clone();
			spawn_local(async move {
				let result = request.await;
				if !liveness.is_alive() {
					return debug!(page, "Dropped a page that arrived after its mount was torn down.");
				}
				scroll.loading.set(false);
				match result {
					Ok(loaded) => append_page(&root, &observation, &scroll, page, &loaded),
					Err(error) => {
						error!(page, "Failed to load more products: {}", error);
						scroll.has_next.set(false);
						observation.disconnect();
					}
				}
			});
		}
	});
	listeners.on_teardown(move || liveness.end());
}

fn append_page(root: &Element, observation: &Observation, scroll: &Scroll, page: u32, loaded: &ProductPage) {
	if let Some(grid) = root.query_selector("#products-grid").ok().flatten() {
		if let Err(js_error) = grid.insert_adjacent_html("beforeend", &product_cards(&loaded.products)) {
			error!("Failed to append products: {}", crate::error::describe_js(&js_error));
		}
	}

	let has_next = loaded.pagination.has_next;
	scroll.next_page.set(page.saturating_add(1));
	scroll.has_next.set(has_next);
	if let Some(container) = root.query_selector("#home-page").ok().flatten() {
		let _ = container.set_attribute("data-current-page", &page.to_string());
		let _ = container.set_attribute("data-has-next", if has_next { "true" } else { "false" });
	}

	if has_next {
		// The sentinel may still be in view, which the observer wouldn't report as a change.
		if let Some(sentinel) = root.query_selector("[data-observer-target]").ok().flatten() {
			observation.reobserve(&sentinel);
		}
	} else {
		observation.disconnect();
		if let Some(status) = root.query_selector("#scroll-status").ok().flatten() {
			status.set_inner_html(end_of_list());
		}
		debug!(page, "Reached the last page.");
	}
}
