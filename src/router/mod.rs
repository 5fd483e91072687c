//! Maps `location.pathname` to a component and owns the DOM root it renders into.
//!
//! # Render cycle
//!
//! Each navigation creates a fresh [`RenderSession`] and binds one re-render routine to it.
//! That routine is the only path that touches the DOM, for the first paint as well as for every hook-triggered update:
//!
//! 1. run the component (a failure here leaves the DOM and the active listeners as they were),
//! 2. run the active [`Cleanup`],
//! 3. replace the root's markup,
//! 4. run the route's [`Mount`], or else the [`View`]'s init, and keep the returned [`Cleanup`].

mod path;

pub use path::{match_path, Params, CAPTURE_PREFIX};

use crate::{
	error::RenderError,
	hook::{RenderSession, Rerender},
	render::{render_component, Cleanup, Component, Mount, MountContext, Navigator, RouteContext, View},
	schedule::{Defer, Microtask},
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::{debug, error, info, instrument, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Element, Event, EventTarget};

pub struct Route<E> {
	pub pattern: String,
	pub component: Component<E>,
	pub mount: Option<Mount<E>>,
}
impl<E> Debug for Route<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("pattern", &self.pattern)
			.field("mount", &self.mount.is_some())
			.finish_non_exhaustive()
	}
}

/// Routes in declaration order. The first matching pattern wins.
pub struct RouteTable<E> {
	routes: Vec<Route<E>>,
	not_found: fn() -> String,
	error_view: fn(&RenderError) -> String,
}
impl<E> RouteTable<E> {
	#[must_use]
	pub fn new(not_found: fn() -> String, error_view: fn(&RenderError) -> String) -> Self {
		Self {
			routes: Vec::new(),
			not_found,
			error_view,
		}
	}

	#[must_use]
	pub fn route(mut self, pattern: impl Into<String>, component: Component<E>) -> Self {
		self.routes.push(Route {
			pattern: pattern.into(),
			component,
			mount: None,
		});
		self
	}

	/// Adds a route whose `mount` takes precedence over any init its component returns.
	#[must_use]
	pub fn route_with_mount(mut self, pattern: impl Into<String>, component: Component<E>, mount: impl Fn(&MountContext<'_, E>) -> Cleanup + 'static) -> Self {
		self.routes.push(Route {
			pattern: pattern.into(),
			component,
			mount: Some(Rc::new(mount)),
		});
		self
	}

	#[must_use]
	pub fn resolve(&self, path: &str) -> Option<(&Route<E>, Params)> {
		self.routes
			.iter()
			.find_map(|route| match_path(&route.pattern, path).map(|params| (route, params)))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.routes.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}
}
impl<E> Debug for RouteTable<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(&self.routes).finish()
	}
}

struct RouterState<E> {
	table: RouteTable<E>,
	root: Element,
	env: Rc<E>,
	defer: Rc<dyn Defer>,
	session: RefCell<Option<RenderSession>>,
	cleanup: RefCell<Option<Cleanup>>,
	popstate: RefCell<Option<Closure<dyn FnMut(Event)>>>,
	links: RefCell<Option<Closure<dyn FnMut(Event)>>>,
	commits: Cell<u64>,
}

/// Exclusively owns `root`'s content.
///
/// Cloning yields another handle to the same router.
pub struct Router<E>(Rc<RouterState<E>>);
impl<E> Clone for Router<E> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}
impl<E> Debug for Router<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("table", &self.0.table)
			.field("session", &self.0.session.borrow())
			.field("mounted", &self.0.cleanup.borrow().is_some())
			.field("commits", &self.0.commits.get())
			.finish_non_exhaustive()
	}
}

impl<E: 'static> Router<E> {
	#[must_use]
	pub fn new(root: Element, table: RouteTable<E>, env: Rc<E>) -> Self {
		Self::with_defer(root, table, env, Rc::new(Microtask))
	}

	#[must_use]
	pub fn with_defer(root: Element, table: RouteTable<E>, env: Rc<E>, defer: Rc<dyn Defer>) -> Self {
		Self(Rc::new(RouterState {
			table,
			root,
			env,
			defer,
			session: RefCell::new(None),
			cleanup: RefCell::new(None),
			popstate: RefCell::new(None),
			links: RefCell::new(None),
			commits: Cell::new(0),
		}))
	}

	#[must_use]
	pub fn env(&self) -> &Rc<E> {
		&self.0.env
	}

	#[must_use]
	pub fn root(&self) -> &Element {
		&self.0.root
	}

	/// The session of the currently mounted route instance.
	#[must_use]
	pub fn session(&self) -> Option<RenderSession> {
		self.0.session.borrow().clone()
	}

	/// How often the root's markup was replaced by a component.
	#[must_use]
	pub fn commits(&self) -> u64 {
		self.0.commits.get()
	}

	#[must_use]
	pub fn navigator(&self) -> Navigator {
		let router = Rc::downgrade(&self.0);
		Navigator::new(move |path| match router.upgrade() {
			Some(state) => Router(state).navigate(path),
			None => warn!(path, "Navigation requested after the router was dropped."),
		})
	}

	/// Renders the route matching the current location.
	#[instrument(skip(self))]
	pub fn render_route(&self) {
		let state = &self.0;
		let (path, search) = match current_location() {
			Ok(location) => location,
			Err(error) => return error!("Can't read the current location: {}", error),
		};

		state.teardown();
		let (component, mount, params) = match state.table.resolve(&path) {
			Some((route, params)) => (route.component, route.mount.clone(), params),
			None => {
				info!(path = %path, "No route matched.");
				state.retire_session();
				return state.root.set_inner_html(&(state.table.not_found)());
			}
		};

		if let Err(error) = self.mount_route(component, mount, params, path, search) {
			error!("Failed to render route: {}", error);
			state.retire_session();
			state.teardown();
			state.root.set_inner_html(&(state.table.error_view)(&error));
		}
	}

	fn mount_route(&self, component: Component<E>, mount: Option<Mount<E>>, params: Params, path: String, search: String) -> Result<(), RenderError> {
		let state = &self.0;
		let session = RenderSession::new(Rc::clone(&state.defer));
		if let Some(previous) = state.session.replace(Some(session.clone())) {
			previous.retire();
		}

		let context = RouteContext {
			params,
			path,
			search,
			env: Rc::clone(&state.env),
			navigator: self.navigator(),
		};
		let router = Rc::downgrade(&self.0);
		let rerender: Rerender = Rc::new(move |session: &RenderSession| {
			let state = router.upgrade().ok_or(RenderError::RouterGone)?;
			let view = component(&context, session)?;
			session.finish_render()?;
			state.commit(session, view, mount.as_ref(), &context);
			Ok(())
		});

		session.bind_render(Rc::clone(&rerender));
		render_component(&session, |session| rerender(session))
	}

	/// Goes to `path`, pushing a history entry unless it's the current location.
	///
	/// The route is rendered again either way, which refreshes its data.
	#[instrument(skip(self))]
	pub fn navigate(&self, path: &str) {
		match current_location() {
			Ok((pathname, search)) if format!("{}{}", pathname, search) == path => debug!("Navigating to the current location."),
			_ => {
				if let Err(error) = push_history(path) {
					return error!("Failed to push history entry: {}", error);
				}
			}
		}
		self.render_route();
	}

	/// Re-renders on back/forward navigation and turns clicks on `a[data-link]` inside the root into [`navigate`](`Router::navigate`) calls.
	///
	/// # Errors
	///
	/// Iff there's no `window` or a listener can't be added.
	pub fn listen(&self) -> Result<(), RenderError> {
		let window = web_sys::window().ok_or(RenderError::NoWindow)?;

		let router = Rc::downgrade(&self.0);
		let popstate = Closure::wrap(Box::new(move |_: Event| {
			if let Some(state) = router.upgrade() {
				trace!("popstate");
				Router(state).render_route();
			}
		}) as Box<dyn FnMut(Event)>);
		replace_listener(&window, "popstate", &self.0.popstate, popstate)?;

		let router = Rc::downgrade(&self.0);
		let links = Closure::wrap(Box::new(move |event: Event| {
			if let Some(state) = router.upgrade() {
				Router(state).follow_link(&event);
			}
		}) as Box<dyn FnMut(Event)>);
		replace_listener(&self.0.root, "click", &self.0.links, links)
	}

	fn follow_link(&self, event: &Event) {
		let link = event
			.target()
			.and_then(|target| target.dyn_into::<Element>().ok())
			.and_then(|target| target.closest("a[data-link]").ok().flatten());
		if let Some(href) = link.and_then(|link| link.get_attribute("href")) {
			event.prevent_default();
			self.navigate(&href);
		}
	}

	/// Tears down the mounted route and stops listening for back/forward navigation.
	pub fn unmount(&self) {
		let state = &self.0;
		state.teardown();
		state.retire_session();
		if let Some(closure) = state.popstate.borrow_mut().take() {
			if let Some(window) = web_sys::window() {
				let _ = window.remove_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
			}
		}
		if let Some(closure) = state.links.borrow_mut().take() {
			let _ = state.root.remove_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
		}
	}
}

/// Registers `closure` for `kind` on `target`, removing the one it replaces in `slot`.
fn replace_listener(target: &EventTarget, kind: &str, slot: &RefCell<Option<Closure<dyn FnMut(Event)>>>, closure: Closure<dyn FnMut(Event)>) -> Result<(), RenderError> {
	target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
	if let Some(previous) = slot.replace(Some(closure)) {
		target.remove_event_listener_with_callback(kind, previous.as_ref().unchecked_ref())?;
	}
	Ok(())
}

impl<E> RouterState<E> {
	fn teardown(&self) {
		let cleanup = self.cleanup.borrow_mut().take();
		if let Some(cleanup) = cleanup {
			trace!("Running active cleanup.");
			cleanup.run();
		}
	}

	fn retire_session(&self) {
		if let Some(session) = self.session.borrow_mut().take() {
			session.retire();
		}
	}

	fn is_active(&self, session: &RenderSession) -> bool {
		!session.is_retired()
	}

	fn commit(&self, session: &RenderSession, view: View<E>, mount: Option<&Mount<E>>, context: &RouteContext<E>) {
		let (markup, init) = view.into_parts();
		self.teardown();
		self.root.set_inner_html(&markup);
		self.commits.set(self.commits.get() + 1);
		if cfg!(feature = "dangerous-logging") {
			trace!(path = %context.path, markup = %markup, "Committed markup.");
		} else {
			debug!(path = %context.path, bytes = markup.len(), "Committed markup.");
		}

		let mount_context = MountContext { route: context, root: &self.root };
		let cleanup = match (mount, init) {
			(Some(mount), _) => mount(&mount_context),
			(None, Some(init)) => init(&mount_context),
			(None, None) => return,
		};

		// The mount may have navigated away synchronously.
		if self.is_active(session) {
			*self.cleanup.borrow_mut() = Some(cleanup);
		} else {
			cleanup.run();
		}
	}
}

fn current_location() -> Result<(String, String), RenderError> {
	let location = web_sys::window().ok_or(RenderError::NoWindow)?.location();
	Ok((location.pathname()?, location.search()?))
}

fn push_history(path: &str) -> Result<(), RenderError> {
	let history = web_sys::window().ok_or(RenderError::NoWindow)?.history()?;
	history.push_state_with_url(&JsValue::NULL, "", Some(path))?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn first(_: &RouteContext<()>, _: &RenderSession) -> Result<View<()>, RenderError> {
		Ok(View::Markup(String::from("first")))
	}

	fn second(_: &RouteContext<()>, _: &RenderSession) -> Result<View<()>, RenderError> {
		Ok(View::Markup(String::from("second")))
	}

	fn not_found() -> String {
		String::from("not found")
	}

	fn error_view(error: &RenderError) -> String {
		error.to_string()
	}

	#[test]
	fn first_declared_route_wins() {
		let table = RouteTable::new(not_found, error_view)
			.route("/products/new", first)
			.route("/products/:id", second);

		let (route, params) = table.resolve("/products/new").unwrap();
		assert_eq!(route.pattern, "/products/new");
		assert!(params.is_empty());

		let (route, params) = table.resolve("/products/7").unwrap();
		assert_eq!(route.pattern, "/products/:id");
		assert_eq!(params.get("id"), Some("7"));

		let table = RouteTable::new(not_found, error_view)
			.route("/products/:id", second)
			.route("/products/new", first);
		assert_eq!(table.resolve("/products/new").unwrap().0.pattern, "/products/:id");
	}

	#[test]
	fn unmatched_path_resolves_to_nothing() {
		let table = RouteTable::new(not_found, error_view).route("/", first).route("/products/:id", second);
		assert!(table.resolve("/products/7/reviews").is_none());
		assert!(table.resolve("/cart").is_none());
		assert_eq!(table.len(), 2);
	}

	#[test]
	fn mount_is_kept_on_the_route() {
		let table = RouteTable::new(not_found, error_view).route_with_mount("/", first, |_| Cleanup::noop());
		assert!(table.resolve("/").unwrap().0.mount.is_some());
	}
}
