use super::{cart_modal, closest, data, product_href, Loadable, Storefront};
use crate::{
	api::{parse_number, Product},
	cart::sanitize_quantity,
	error::{ApiError, RenderError},
	hook::{RenderSession, Setter},
	listeners::ListenerSet,
	query::{FilterChange, HomeQuery},
	render::{Cleanup, MountContext, RouteContext, View},
	views::{self, detail::DetailState},
};
use std::rc::Rc;
use tracing::{error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;

#[derive(Debug, Clone, PartialEq)]
pub struct DetailData {
	pub product: Product,
	/// Same category, without the product itself.
	pub related: Vec<Product>,
}

/// Renders `/products/:id`, with a quantity stepper whose value lives in a state cell.
///
/// # Errors
///
/// [`RenderError::MissingParam`] without an `id`, and hook misuse.
pub fn component(context: &RouteContext<Storefront>, session: &RenderSession) -> Result<View<Storefront>, RenderError> {
	let product_id = context.params.get("id").filter(|id| !id.is_empty()).ok_or(RenderError::MissingParam("id"))?;
	let (detail, set_detail) = session.use_state(|| Loadable::<DetailData>::Loading)?;
	let (quantity, set_quantity) = session.use_state(|| 1_u32)?;

	if session.passes() == 1 {
		let store = Rc::clone(&context.env);
		let product_id = product_id.to_owned();
		spawn_local(async move {
			set_detail.set(match load(&store, &product_id).await {
				Ok(detail) => Loadable::Loaded(detail),
				Err(ApiError::NotFound(_)) => Loadable::Failed(String::from("상품을 찾을 수 없습니다.")),
				Err(error) => {
					error!(product_id = %product_id, "Failed to load product: {}", error);
					Loadable::Failed(String::from("상품을 불러오지 못했습니다."))
				}
			});
		});
	}

	let cart_count = context.env.cart.len();
	let (markup, product) = match detail {
		Loadable::Loading => (views::detail::page(DetailState::Loading, quantity, cart_count), None),
		Loadable::Failed(message) => (views::detail::page(DetailState::Failed(&message), quantity, cart_count), None),
		Loadable::Loaded(DetailData { product, related }) => (
			views::detail::page(DetailState::Loaded { product: &product, related: &related }, quantity, cart_count),
			Some(product),
		),
	};
	Ok(View::with_init(markup, move |mount| init(mount, product, set_quantity)))
}

async fn load(store: &Storefront, product_id: &str) -> Result<DetailData, ApiError> {
	let product = store.catalog.product(product_id).await?;

	let mut query = HomeQuery::new(store.config.default_limit);
	query.category1 = product.category1.clone();
	query.category2 = product.category2.clone();
	let related = match store.catalog.products(&query).await {
		Ok(page) => page.products.into_iter().filter(|related| related.product_id != product.product_id).collect(),
		Err(error) => {
			warn!("Failed to load related products: {}", error);
			Vec::new()
		}
	};
	Ok(DetailData { product, related })
}

fn init(context: &MountContext<'_, Storefront>, product: Option<Product>, set_quantity: Setter<u32>) -> Cleanup {
	let store = Rc::clone(&context.route.env);
	let root = context.root.clone();
	let mut listeners = ListenerSet::new();

	listeners.listen(&root, "click", {
		let store = Rc::clone(&store);
		let root = root.clone();
		let navigator = context.navigator().clone();
		let set_quantity = set_quantity.clone();
		move |event| {
			if let Some(card) = closest(&event, ".related-product-card") {
				navigator.navigate(&product_href(&data(&card, "product-id")));
			} else if let Some(link) = closest(&event, ".breadcrumb-link") {
				let category1 = data(&link, "category1");
				let change = match data(&link, "category2") {
					category2 if category2.is_empty() => FilterChange::Category1(category1),
					category2 => FilterChange::Category2 { category1, category2 },
				};
				navigator.navigate(&HomeQuery::new(store.config.default_limit).apply(change).href("/"));
			} else if closest(&event, ".go-to-product-list").is_some() {
				let mut query = HomeQuery::new(store.config.default_limit);
				if let Some(product) = &product {
					query = query.apply(FilterChange::Category2 {
						category1: product.category1.clone(),
						category2: product.category2.clone(),
					});
				}
				navigator.navigate(&query.href("/"));
			} else if closest(&event, "#quantity-increase").is_some() {
				set_quantity.update(|quantity| quantity.saturating_add(1));
			} else if closest(&event, "#quantity-decrease").is_some() {
				set_quantity.update(|quantity| quantity.saturating_sub(1).max(1));
			} else if closest(&event, "#add-to-cart-btn").is_some() {
				if let Some(product) = &product {
					// The input may hold a typed value that wasn't committed with `change` yet.
					let quantity = quantity_input(&root).map_or(1, |input| sanitize_quantity(parse_number(&input.value())));
					info!(product_id = %product.product_id, quantity, "Adding to cart.");
					store.cart.add_item(product, f64::from(quantity));
				}
			}
		}
	});

	listeners.listen(&root, "change", move |event| {
		if let Some(input) = closest(&event, "#quantity-input").and_then(|input| input.dyn_into::<HtmlInputElement>().ok()) {
			set_quantity.set(sanitize_quantity(parse_number(&input.value())));
		}
	});

	cart_modal::attach(&mut listeners, &root, &store);
	listeners.into_cleanup()
}

fn quantity_input(root: &web_sys::Element) -> Option<HtmlInputElement> {
	root.query_selector("#quantity-input").ok().flatten()?.dyn_into().ok()
}
