//! The shopping cart: an observable, persisted list of [`CartItem`]s.
//!
//! [`CartStore`] is independent of rendering. Pages subscribe to it from their mounts
//! and unsubscribe in their cleanups.

mod item;
mod storage;

pub use item::{load_items, sanitize_quantity, CartItem};
pub use storage::{LocalStorage, MemoryStorage, Storage};

use crate::api::Product;
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, trace, warn};

/// Receives the full item list after every change, and once on subscription.
pub type Subscriber = Rc<dyn Fn(&[CartItem]) -> anyhow::Result<()>>;

type SubscriberList = Vec<(u64, Subscriber)>;

pub struct CartStore {
	items: RefCell<Rc<Vec<CartItem>>>,
	subscribers: RefCell<SubscriberList>,
	next_subscription: Cell<u64>,
	storage: Box<dyn Storage>,
	key: String,
}
impl Debug for CartStore {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("CartStore");
		debug.field("key", &self.key).field("subscribers", &self.subscribers.borrow().len());
		if cfg!(feature = "dangerous-logging") {
			debug.field("items", &self.items.borrow());
		} else {
			debug.field("items", &self.items.borrow().len());
		}
		debug.finish()
	}
}

/// Keeps a [`CartStore`] subscription registered until [`unsubscribe`](`Subscription::unsubscribe`) is called.
#[derive(Debug)]
#[must_use = "a subscription stays registered until it's unsubscribed"]
pub struct Subscription {
	store: Weak<CartStore>,
	id: u64,
}
impl Subscription {
	pub fn unsubscribe(self) {
		if let Some(store) = self.store.upgrade() {
			store.subscribers.borrow_mut().retain(|(id, _)| *id != self.id);
			trace!(id = self.id, "Unsubscribed from cart.");
		}
	}
}

impl CartStore {
	/// Rehydrates the cart stored under `key`. Unreadable or malformed data yields an empty cart.
	#[must_use]
	pub fn new(storage: impl Storage + 'static, key: impl Into<String>) -> Rc<Self> {
		let key = key.into();
		let items = match storage.load(&key) {
			Ok(Some(stored)) => load_items(&stored).unwrap_or_else(|error| {
				warn!("Discarding malformed stored cart: {}", error);
				Vec::new()
			}),
			Ok(None) => Vec::new(),
			Err(error) => {
				warn!("Failed to restore cart: {}", error);
				Vec::new()
			}
		};
		info!(items = items.len(), "Restored cart.");

		Rc::new(Self {
			items: RefCell::new(Rc::new(items)),
			subscribers: RefCell::default(),
			next_subscription: Cell::new(0),
			storage: Box::new(storage),
			key,
		})
	}

	/// Registers `subscriber` and calls it right away with the current items.
	///
	/// Subscribing the same `Rc` again doesn't add a second registration.
	pub fn subscribe(self: &Rc<Self>, subscriber: Subscriber) -> Subscription {
		let existing = self
			.subscribers
			.borrow()
			.iter()
			.find(|(_, registered)| Rc::as_ptr(registered).cast::<()>() == Rc::as_ptr(&subscriber).cast::<()>())
			.map(|(id, _)| *id);

		let id = existing.unwrap_or_else(|| {
			let id = self.next_subscription.get();
			self.next_subscription.set(id + 1);
			self.subscribers.borrow_mut().push((id, Rc::clone(&subscriber)));
			id
		});

		let items = self.get_state();
		if let Err(error) = subscriber(&items) {
			error!("Cart subscriber failed: {:#}", error);
		}

		Subscription {
			store: Rc::downgrade(self),
			id,
		}
	}

	/// A snapshot of the current items.
	#[must_use]
	pub fn get_state(&self) -> Rc<Vec<CartItem>> {
		Rc::clone(&self.items.borrow())
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.items.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.items.borrow().is_empty()
	}

	#[must_use]
	pub fn checked_count(&self) -> usize {
		self.items.borrow().iter().filter(|item| item.checked).count()
	}

	#[must_use]
	pub fn total_price(&self) -> f64 {
		self.items.borrow().iter().map(CartItem::subtotal).sum()
	}

	/// Adds `quantity` of `product`, merging with an existing line for the same product.
	pub fn add_item(&self, product: &Product, quantity: f64) {
		if product.product_id.is_empty() {
			return warn!("Ignoring a product without id.");
		}
		let quantity = sanitize_quantity(quantity);
		self.update(|items| {
			let mut next = items.to_vec();
			match next.iter_mut().find(|item| item.product_id == product.product_id) {
				Some(item) => item.quantity = item.quantity.saturating_add(quantity),
				None => next.push(CartItem::from_product(product, quantity)),
			}
			next
		});
	}

	pub fn update_item_quantity(&self, product_id: &str, quantity: f64) {
		let quantity = sanitize_quantity(quantity);
		self.update_matching(product_id, |item| item.quantity = quantity);
	}

	pub fn update_item_checked(&self, product_id: &str, checked: bool) {
		self.update_matching(product_id, |item| item.checked = checked);
	}

	pub fn set_all_checked(&self, checked: bool) {
		self.update(|items| items.iter().cloned().map(|item| CartItem { checked, ..item }).collect());
	}

	pub fn remove_item(&self, product_id: &str) {
		if product_id.is_empty() {
			return;
		}
		self.update(|items| items.iter().filter(|item| item.product_id != product_id).cloned().collect());
	}

	/// Removes every checked line.
	pub fn remove_checked(&self) {
		self.update(|items| items.iter().filter(|item| !item.checked).cloned().collect());
	}

	pub fn clear(&self) {
		self.update(|_| Vec::new());
	}

	fn update_matching(&self, product_id: &str, change: impl Fn(&mut CartItem)) {
		if product_id.is_empty() {
			return;
		}
		self.update(|items| {
			let mut next = items.to_vec();
			next.iter_mut().filter(|item| item.product_id == product_id).for_each(&change);
			next
		});
	}

	/// Replaces the items with `next(current)` unless that changes nothing, then persists and notifies.
	fn update(&self, next: impl FnOnce(&[CartItem]) -> Vec<CartItem>) {
		let current = self.get_state();
		let next = next(&current);
		if next == *current {
			return trace!("Cart unchanged.");
		}

		let next = Rc::new(next);
		*self.items.borrow_mut() = Rc::clone(&next);
		self.persist(&next);
		self.notify();
	}

	fn persist(&self, items: &[CartItem]) {
		let json = match serde_json::to_string(items) {
			Ok(json) => json,
			Err(error) => return error!("Failed to serialize cart: {}", error),
		};
		match self.storage.save(&self.key, &json) {
			Ok(()) if cfg!(feature = "dangerous-logging") => debug!(cart = %json, "Persisted cart."),
			Ok(()) => debug!(items = items.len(), "Persisted cart."),
			Err(error) => warn!("Failed to persist cart, continuing in memory: {}", error),
		}
	}

	/// Each subscriber receives the items current at its turn, so a change made by an earlier callback reaches the later ones.
	fn notify(&self) {
		let snapshot: SubscriberList = self.subscribers.borrow().clone();
		for (id, subscriber) in snapshot {
			// Skip subscribers removed by an earlier callback of this round.
			if !self.subscribers.borrow().iter().any(|(registered, _)| *registered == id) {
				continue;
			}
			if let Err(error) = subscriber(&self.get_state()) {
				error!(id, "Cart subscriber failed: {:#}", error);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::bail;

	const KEY: &str = "cart";

	fn product(id: &str, price: &str) -> Product {
		Product {
			product_id: id.to_owned(),
			title: format!("Product {}", id),
			image: format!("https://example.com/{}.png", id),
			lprice: price.to_owned(),
			..Product::default()
		}
	}

	fn recorder() -> (Rc<RefCell<Vec<Vec<CartItem>>>>, Subscriber) {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let subscriber: Subscriber = {
			let seen = Rc::clone(&seen);
			Rc::new(move |items: &[CartItem]| {
				seen.borrow_mut().push(items.to_vec());
				Ok(())
			})
		};
		(seen, subscriber)
	}

	#[test]
	fn adding_the_same_product_merges_quantities() {
		let cart = CartStore::new(MemoryStorage::new(), KEY);
		cart.add_item(&product("p1", "1000"), 2.0);
		cart.add_item(&product("p1", "1000"), 3.0);

		let items = cart.get_state();
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].quantity, 5);
		assert!(!items[0].checked);
		assert_eq!(cart.total_price(), 5000.0);
	}

	#[test]
	fn added_quantities_are_sanitized() {
		let cart = CartStore::new(MemoryStorage::new(), KEY);
		cart.add_item(&product("p1", "10"), -3.0);
		cart.add_item(&product("p2", "10"), 2.5);
		cart.add_item(&product("", "10"), 1.0);
		let items = cart.get_state();
		assert_eq!(items.iter().map(|item| item.quantity).collect::<Vec<_>>(), [1, 2]);
	}

	#[test]
	fn persists_and_rehydrates() {
		let storage = MemoryStorage::new();
		let cart = CartStore::new(storage.clone(), KEY);
		cart.add_item(&product("p1", "1200"), 1.0);
		cart.add_item(&product("p2", "800"), 4.0);
		cart.update_item_checked("p2", true);

		let restored = CartStore::new(storage.clone(), KEY);
		assert_eq!(*restored.get_state(), *cart.get_state());
		assert_eq!(storage.saves(), 3);
	}

	#[test]
	fn malformed_storage_is_an_empty_cart() {
		let cart = CartStore::new(MemoryStorage::with_entry(KEY, "[{\"productId\":"), KEY);
		assert!(cart.is_empty());

		let cart = CartStore::new(MemoryStorage::with_entry(KEY, r#"[{"productId": "ok"}, {"title": "lost"}]"#), KEY);
		assert_eq!(cart.len(), 1);
		assert!(cart.get_state()[0].checked);
	}

	#[test]
	fn subscribe_replays_and_notifies() {
		let cart = CartStore::new(MemoryStorage::new(), KEY);
		let (seen, subscriber) = recorder();
		let subscription = cart.subscribe(subscriber);
		assert_eq!(*seen.borrow(), vec![Vec::<CartItem>::new()]);

		cart.add_item(&product("p1", "1"), 1.0);
		assert_eq!(seen.borrow().len(), 2);
		assert_eq!(seen.borrow()[1][0].product_id, "p1");

		subscription.unsubscribe();
		cart.clear();
		assert_eq!(seen.borrow().len(), 2);
		assert!(cart.is_empty());
	}

	#[test]
	fn unchanged_state_neither_persists_nor_notifies() {
		let storage = MemoryStorage::new();
		let cart = CartStore::new(storage.clone(), KEY);
		cart.add_item(&product("p1", "1"), 1.0);
		cart.add_item(&product("p2", "1"), 1.0);
		cart.set_all_checked(true);

		let (seen, subscriber) = recorder();
		let _subscription = cart.subscribe(subscriber);
		let saves = storage.saves();

		cart.set_all_checked(true);
		cart.update_item_checked("p1", true);
		cart.update_item_quantity("p1", 1.0);
		cart.update_item_quantity("missing", 3.0);
		cart.remove_item("missing");

		assert_eq!(storage.saves(), saves);
		assert_eq!(seen.borrow().len(), 1);
	}

	#[test]
	fn mutators() {
		let cart = CartStore::new(MemoryStorage::new(), KEY);
		cart.add_item(&product("p1", "100"), 1.0);
		cart.add_item(&product("p2", "200"), 1.0);
		cart.add_item(&product("p3", "300"), 1.0);

		cart.update_item_quantity("p2", 3.9);
		assert_eq!(cart.get_state()[1].quantity, 3);

		cart.update_item_checked("p1", true);
		cart.update_item_checked("p3", true);
		assert_eq!(cart.checked_count(), 2);

		cart.remove_checked();
		assert_eq!(cart.get_state().iter().map(|item| item.product_id.as_str()).collect::<Vec<_>>(), ["p2"]);

		cart.remove_item("p2");
		assert!(cart.is_empty());
	}

	#[test]
	fn failing_subscriber_does_not_stop_the_others() {
		let cart = CartStore::new(MemoryStorage::new(), KEY);
		let _failing = cart.subscribe(Rc::new(|items: &[CartItem]| {
			if items.is_empty() {
				Ok(())
			} else {
				bail!("can't render {} items", items.len())
			}
		}));
		let (seen, subscriber) = recorder();
		let _subscription = cart.subscribe(subscriber);

		cart.add_item(&product("p1", "1"), 1.0);
		assert_eq!(seen.borrow().len(), 2);
	}

	#[test]
	fn unsubscribing_during_notification() {
		let cart = CartStore::new(MemoryStorage::new(), KEY);
		let later: Rc<RefCell<Option<Subscription>>> = Rc::default();
		let calls = Rc::new(Cell::new(0));

		let _first = {
			let later = Rc::clone(&later);
			let calls = Rc::clone(&calls);
			cart.subscribe(Rc::new(move |items: &[CartItem]| {
				calls.set(calls.get() + 1);
				if !items.is_empty() {
					if let Some(subscription) = later.borrow_mut().take() {
						subscription.unsubscribe();
					}
				}
				Ok(())
			}))
		};
		let (seen, subscriber) = recorder();
		*later.borrow_mut() = Some(cart.subscribe(subscriber));
		let (third_seen, third) = recorder();
		let _third = cart.subscribe(third);

		cart.add_item(&product("p1", "1"), 1.0);
		assert_eq!(calls.get(), 2);
		assert_eq!(seen.borrow().len(), 1, "removed before its turn");
		assert_eq!(third_seen.borrow().len(), 2, "not skipped");
	}

	#[test]
	fn later_subscribers_see_changes_made_during_notification() {
		let cart = CartStore::new(MemoryStorage::new(), KEY);
		let weak = Rc::downgrade(&cart);
		let _auto_check = cart.subscribe(Rc::new(move |items: &[CartItem]| {
			if let (Some(cart), Some(item)) = (weak.upgrade(), items.iter().find(|item| !item.checked)) {
				cart.update_item_checked(&item.product_id, true);
			}
			Ok(())
		}));
		let (seen, subscriber) = recorder();
		let _subscription = cart.subscribe(subscriber);

		cart.add_item(&product("p1", "1"), 1.0);
		assert!(cart.get_state()[0].checked);
		assert_eq!(seen.borrow().last().map(Vec::as_slice), Some(cart.get_state().as_slice()));
	}

	#[test]
	fn same_subscriber_is_registered_once() {
		let cart = CartStore::new(MemoryStorage::new(), KEY);
		let (seen, subscriber) = recorder();
		let first = cart.subscribe(Rc::clone(&subscriber));
		let _second = cart.subscribe(subscriber);
		assert_eq!(seen.borrow().len(), 2);

		cart.add_item(&product("p1", "1"), 1.0);
		assert_eq!(seen.borrow().len(), 3);

		first.unsubscribe();
		cart.clear();
		assert_eq!(seen.borrow().len(), 3);
	}

	#[test]
	fn storage_failure_keeps_the_cart_in_memory() {
		let storage = MemoryStorage::new();
		storage.set_read_only(true);
		let cart = CartStore::new(storage.clone(), KEY);
		let (seen, subscriber) = recorder();
		let _subscription = cart.subscribe(subscriber);

		cart.add_item(&product("p1", "1"), 1.0);
		assert_eq!(cart.len(), 1);
		assert_eq!(seen.borrow().len(), 2);
		assert_eq!(storage.get(KEY), None);
	}
}
