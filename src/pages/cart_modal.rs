//! Keeps the header badge and the cart modal in sync with the [`CartStore`](`crate::cart::CartStore`).
//!
//! Whether the modal is open lives in the [`Storefront`], so it survives re-renders of the page below it.

use super::{closest, data, Storefront};
use crate::{cart::CartItem, error::describe_js, listeners::ListenerSet, views};
use anyhow::anyhow;
use core::cell::Cell;
use std::rc::Rc;
use tracing::{debug, error, info, trace};
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlInputElement, KeyboardEvent};

#[derive(Debug, Default)]
pub struct CartModal {
	open: Cell<bool>,
}
impl CartModal {
	#[must_use]
	pub fn is_open(&self) -> bool {
		self.open.get()
	}
}

/// Subscribes the badge and modal under `root` to the cart and wires the modal's controls.
///
/// Everything is undone by `listeners`' teardown.
pub fn attach(listeners: &mut ListenerSet, root: &Element, store: &Rc<Storefront>) {
	let subscription = store.cart.subscribe({
		let root = root.clone();
		let store = Rc::downgrade(store);
		Rc::new(move |items: &[CartItem]| match store.upgrade() {
			Some(store) => refresh(&root, items, store.cart_modal.is_open()),
			None => Ok(()),
		})
	});
	listeners.on_teardown(move || subscription.unsubscribe());

	listeners.listen(root, "click", {
		let root = root.clone();
		let store = Rc::downgrade(store);
		move |event| {
			if let Some(store) = store.upgrade() {
				on_click(&event, &root, &store);
			}
		}
	});

	listeners.listen(root, "change", {
		let store = Rc::downgrade(store);
		move |event| {
			if let Some(store) = store.upgrade() {
				on_change(&event, &store);
			}
		}
	});

	if let Some(document) = root.owner_document() {
		listeners.listen(&document, "keydown", {
			let root = root.clone();
			let store = Rc::downgrade(store);
			move |event| {
				let escape = event.dyn_ref::<KeyboardEvent>().map_or(false, |event| event.key() == "Escape");
				if let Some(store) = store.upgrade().filter(|store| escape && store.cart_modal.is_open()) {
					set_open(&root, &store, false);
				}
			}
		});
	}
}

fn refresh(root: &Element, items: &[CartItem], open: bool) -> anyhow::Result<()> {
	let find = |selector: &str| root.query_selector(selector).map_err(|error| anyhow!("`{}`: {}", selector, describe_js(&error)));
	if let Some(button) = find("#cart-icon-btn")? {
		button.set_inner_html(&views::cart_icon(items.len()));
	}
	if let Some(modal_root) = find("#cart-modal-root")? {
		modal_root.set_inner_html(&if open { views::cart::modal(items) } else { String::new() });
	}
	trace!(items = items.len(), open, "Refreshed cart views.");
	Ok(())
}

fn set_open(root: &Element, store: &Storefront, open: bool) {
	store.cart_modal.open.set(open);
	debug!(open, "Toggled cart modal.");
	if let Err(error) = refresh(root, &store.cart.get_state(), open) {
		error!("Failed to render the cart modal: {:#}", error);
	}
}

fn on_click(event: &Event, root: &Element, store: &Storefront) {
	let cart = &store.cart;
	if closest(event, "#cart-icon-btn").is_some() {
		set_open(root, store, true);
	} else if closest(event, ".cart-modal-overlay").is_some() || closest(event, "#cart-modal-close-btn").is_some() {
		set_open(root, store, false);
	} else if let Some(button) = closest(event, ".quantity-increase-btn") {
		step_quantity(store, &data(&button, "product-id"), 1);
	} else if let Some(button) = closest(event, ".quantity-decrease-btn") {
		step_quantity(store, &data(&button, "product-id"), -1);
	} else if let Some(button) = closest(event, ".cart-item-remove-btn") {
		cart.remove_item(&data(&button, "product-id"));
	} else if closest(event, "#cart-modal-remove-selected-btn").is_some() {
		cart.remove_checked();
	} else if closest(event, "#cart-modal-clear-cart-btn").is_some() {
		cart.clear();
	} else if closest(event, "#cart-modal-checkout-btn").is_some() {
		info!(items = cart.checked_count(), total = cart.total_price(), "Checkout requested.");
	}
}

fn on_change(event: &Event, store: &Storefront) {
	let input = match event.target().and_then(|target| target.dyn_into::<HtmlInputElement>().ok()) {
		Some(input) => input,
		None => return,
	};
	let cart = &store.cart;
	if input.id() == "cart-modal-select-all-checkbox" {
		cart.set_all_checked(input.checked());
	} else if input.class_list().contains("cart-item-checkbox") {
		cart.update_item_checked(&data(&input, "product-id"), input.checked());
	} else if input.class_list().contains("quantity-input") {
		cart.update_item_quantity(&data(&input, "product-id"), crate::api::parse_number(&input.value()));
	}
}

fn step_quantity(store: &Storefront, product_id: &str, delta: i64) {
	let current = store.cart.get_state().iter().find(|item| item.product_id == product_id).map(|item| item.quantity);
	if let Some(quantity) = current {
		#[allow(clippy::cast_precision_loss)]
		let next = (i64::from(quantity) + delta) as f64;
		store.cart.update_item_quantity(product_id, next);
	}
}
