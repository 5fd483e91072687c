//! Event listeners and observers wired by a mount, and their teardown.
//!
//! Every registration made through a [`ListenerSet`] is counted in a thread-wide [`Ledger`],
//! and every teardown uncounts it again. After any number of navigations,
//! [`active_listeners`] therefore only reports what the currently mounted page registered.

use crate::{error::describe_js, ledger::Ledger, render::Cleanup};
use core::fmt::{self, Debug, Formatter};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};
use tracing::{error, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Element, Event, EventTarget, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

/// Ledger key for intersection observers.
pub const OBSERVER: &str = "IntersectionObserver";

thread_local! {
	static LEDGER: RefCell<Ledger<&'static str>> = RefCell::new(Ledger::new());
}

/// Live registrations for `kind` (an event name, or [`OBSERVER`]).
#[must_use]
pub fn active_listeners(kind: &str) -> u32 {
	LEDGER.with(|ledger| ledger.borrow().count(kind))
}

/// Live registrations of all kinds.
#[must_use]
pub fn active_total() -> u32 {
	LEDGER.with(|ledger| ledger.borrow().total())
}

fn record(kind: &'static str) {
	LEDGER.with(|ledger| {
		if ledger.borrow_mut().increment(kind).is_err() {
			error!(kind, "Listener count saturated.");
		}
	});
}

fn release(kind: &'static str) {
	LEDGER.with(|ledger| {
		let mut ledger = ledger.borrow_mut();
		match ledger.decrement(kind) {
			Ok(0) => {
				ledger.prune();
			}
			Ok(_) => (),
			Err(_) => error!(kind, "Released a listener that was never recorded."),
		}
	});
}

struct Binding {
	target: EventTarget,
	event: &'static str,
	closure: Closure<dyn FnMut(Event)>,
}

/// Collects the registrations of one mount so they can be torn down together.
#[derive(Default)]
pub struct ListenerSet {
	bindings: Vec<Binding>,
	observers: Vec<(Observation, Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>)>,
	teardowns: Vec<Box<dyn FnOnce()>>,
}
impl Debug for ListenerSet {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListenerSet")
			.field("bindings", &self.bindings.iter().map(|binding| binding.event).collect::<Vec<_>>())
			.field("observers", &self.observers.len())
			.field("teardowns", &self.teardowns.len())
			.finish()
	}
}

impl ListenerSet {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `handler` as `event` listener on `target`.
	///
	/// A listener the browser refuses is logged and skipped.
	pub fn listen(&mut self, target: &EventTarget, event: &'static str, handler: impl FnMut(Event) + 'static) {
		let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
		if let Err(js_error) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
			return error!(event, "Failed to add event listener: {}", describe_js(&js_error));
		}
		record(event);
		trace!(event, "Added event listener.");
		self.bindings.push(Binding {
			target: target.clone(),
			event,
			closure,
		});
	}

	/// Calls `on_visible` whenever `target` starts intersecting the viewport (grown by `root_margin`).
	pub fn observe_intersection(&mut self, target: &Element, root_margin: &str, mut on_visible: impl FnMut(&Observation) + 'static) {
		let connected = Rc::new(Cell::new(true));
		let closure = Closure::wrap(Box::new({
			let connected = Rc::clone(&connected);
			move |entries: js_sys::Array, observer: IntersectionObserver| {
				let visible = entries
					.iter()
					.filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
					.any(|entry| entry.is_intersecting());
				if visible && connected.get() {
					on_visible(&Observation {
						observer,
						connected: Rc::clone(&connected),
					});
				}
			}
		}) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

		let options = IntersectionObserverInit::new();
		options.set_root_margin(root_margin);
		let observer = match IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &options) {
			Ok(observer) => observer,
			Err(js_error) => return error!("Failed to create IntersectionObserver: {}", describe_js(&js_error)),
		};
		observer.observe(target);
		record(OBSERVER);
		self.observers.push((Observation { observer, connected }, closure));
	}

	/// Runs `teardown` together with the listener removal.
	pub fn on_teardown(&mut self, teardown: impl FnOnce() + 'static) {
		self.teardowns.push(Box::new(teardown));
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.bindings.len() + self.observers.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Removes every listener, disconnects every observer and runs the extra teardowns.
	pub fn teardown(self) {
		let Self { bindings, observers, teardowns } = self;
		for Binding { target, event, closure } in bindings {
			if let Err(js_error) = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
				warn!(event, "Failed to remove event listener: {}", describe_js(&js_error));
			}
			release(event);
		}
		for (observation, _closure) in observers {
			observation.disconnect();
		}
		for teardown in teardowns {
			teardown();
		}
	}

	#[must_use]
	pub fn into_cleanup(self) -> Cleanup {
		Cleanup::new(move || self.teardown())
	}
}

/// An intersection observer registered through a [`ListenerSet`].
///
/// It can be disconnected before the set is torn down, which uncounts it right away.
#[derive(Debug, Clone)]
pub struct Observation {
	observer: IntersectionObserver,
	connected: Rc<Cell<bool>>,
}
impl Observation {
	#[must_use]
	pub fn is_connected(&self) -> bool {
		self.connected.get()
	}

	/// Observes `target` afresh, so its current intersection is reported again even if it didn't change.
	pub fn reobserve(&self, target: &Element) {
		if self.connected.get() {
			self.observer.unobserve(target);
			self.observer.observe(target);
		}
	}

	pub fn disconnect(&self) {
		if self.connected.replace(false) {
			self.observer.disconnect();
			release(OBSERVER);
			trace!("Disconnected IntersectionObserver.");
		}
	}
}

/// A teardown-able flag for async work spawned by a mount.
///
/// Cleared by the mount's cleanup so late results can tell they've been abandoned.
#[derive(Debug, Clone)]
pub struct Liveness(Rc<Cell<bool>>);
impl Liveness {
	#[must_use]
	pub fn new() -> Self {
		Self(Rc::new(Cell::new(true)))
	}

	#[must_use]
	pub fn is_alive(&self) -> bool {
		self.0.get()
	}

	pub fn end(&self) {
		self.0.set(false);
	}
}
impl Default for Liveness {
	fn default() -> Self {
		Self::new()
	}
}
