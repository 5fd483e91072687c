//! Component output, mount/cleanup handles and the contexts passed to both.

use crate::{error::RenderError, hook::RenderSession, router::Params};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use web_sys::Element;

/// Renders markup for the current route. Runs once per render pass.
pub type Component<E> = fn(&RouteContext<E>, &RenderSession) -> Result<View<E>, RenderError>;

/// Wires listeners after the markup was injected. Route-level, reused across renders.
pub type Mount<E> = Rc<dyn Fn(&MountContext<'_, E>) -> Cleanup>;

/// Wires listeners for one specific render. Returned alongside the markup that it belongs to.
pub type Init<E> = Box<dyn FnOnce(&MountContext<'_, E>) -> Cleanup>;

/// What a [`Component`] produces: markup, optionally with an [`Init`].
pub enum View<E> {
	Markup(String),
	WithInit { markup: String, init: Init<E> },
}
impl<E> View<E> {
	pub fn with_init(markup: impl Into<String>, init: impl FnOnce(&MountContext<'_, E>) -> Cleanup + 'static) -> Self {
		Self::WithInit {
			markup: markup.into(),
			init: Box::new(init),
		}
	}

	#[must_use]
	pub fn into_parts(self) -> (String, Option<Init<E>>) {
		match self {
			View::Markup(markup) => (markup, None),
			View::WithInit { markup, init } => (markup, Some(init)),
		}
	}
}
impl<E> From<String> for View<E> {
	fn from(markup: String) -> Self {
		Self::Markup(markup)
	}
}
impl<E> Debug for View<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			View::Markup(markup) => f.debug_tuple("Markup").field(&markup.len()).finish(),
			View::WithInit { markup, .. } => f.debug_struct("WithInit").field("markup", &markup.len()).finish_non_exhaustive(),
		}
	}
}

/// Tears down what a mount wired up. Runs at most once.
#[must_use = "dropping a `Cleanup` without running it leaks its listeners"]
pub struct Cleanup(Option<Box<dyn FnOnce()>>);
impl Cleanup {
	pub fn new(teardown: impl FnOnce() + 'static) -> Self {
		Self(Some(Box::new(teardown)))
	}

	pub fn noop() -> Self {
		Self(None)
	}

	pub fn run(mut self) {
		if let Some(teardown) = self.0.take() {
			teardown();
		}
	}
}
impl Default for Cleanup {
	fn default() -> Self {
		Self::noop()
	}
}
impl Debug for Cleanup {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Cleanup").field(&self.0.is_some()).finish()
	}
}

/// Navigates the router that rendered the current page.
#[derive(Clone)]
pub struct Navigator(Rc<dyn Fn(&str)>);
impl Navigator {
	pub fn new(navigate: impl Fn(&str) + 'static) -> Self {
		Self(Rc::new(navigate))
	}

	pub fn navigate(&self, path: &str) {
		(self.0)(path);
	}
}
impl Debug for Navigator {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str("Navigator")
	}
}

/// What a component knows about the route it renders.
pub struct RouteContext<E> {
	pub params: Params,
	pub path: String,
	/// The query string including its leading `?`, or empty.
	pub search: String,
	pub env: Rc<E>,
	pub navigator: Navigator,
}
impl<E> Debug for RouteContext<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteContext")
			.field("params", &self.params)
			.field("path", &self.path)
			.field("search", &self.search)
			.finish_non_exhaustive()
	}
}

/// What a mount receives: the route and the element holding the injected markup.
pub struct MountContext<'a, E> {
	pub route: &'a RouteContext<E>,
	pub root: &'a Element,
}
impl<'a, E> MountContext<'a, E> {
	#[must_use]
	pub fn env(&self) -> &'a E {
		&self.route.env
	}

	#[must_use]
	pub fn navigator(&self) -> &'a Navigator {
		&self.route.navigator
	}
}

/// Prepares `session` and runs `runner` once against it.
///
/// # Errors
///
/// Whatever `runner` fails with.
pub fn render_component<T>(session: &RenderSession, runner: impl FnOnce(&RenderSession) -> Result<T, RenderError>) -> Result<T, RenderError> {
	session.prepare_render();
	runner(session)
}
