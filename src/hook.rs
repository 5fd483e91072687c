//! Hook-style state cells.
//!
//! A [`RenderSession`] owns an arena of state cells that a component addresses by call order:
//! the first [`RenderSession::use_state`] call of a render reads cell 0, the second reads cell 1 and so on.
//! The cursor is reset by [`RenderSession::prepare_render`], which must run before **every** invocation of the component.
//!
//! # Call order
//!
//! A component must call [`use_state`](`RenderSession::use_state`) unconditionally, in the same order and the same number of times on every render.
//! Breaking this is a program error. Debug builds detect a changed call count in [`RenderSession::finish_render`],
//! and a cell read with the wrong type is always reported as [`HookError::SlotTypeMismatch`].
//!
//! # Updates
//!
//! [`Setter`]s write a cell and request a re-render through [`RenderSession::schedule_update`].
//! All requests made within one synchronous turn are coalesced into a single call of the routine registered with [`RenderSession::bind_render`].

use crate::{
	error::{HookError, RenderError},
	schedule::Defer,
};
use core::{
	any::{type_name, Any},
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
	marker::PhantomData,
};
use std::rc::{Rc, Weak};
use tracing::{debug, error, instrument, trace, warn};

/// The routine a scheduled update runs. It receives the session it was bound to.
pub type Rerender = Rc<dyn Fn(&RenderSession) -> Result<(), RenderError>>;

struct SessionState {
	cells: RefCell<Vec<Box<dyn Any>>>,
	cursor: Cell<usize>,
	previous_count: Cell<Option<usize>>,
	prepared: Cell<bool>,
	scheduled: Cell<bool>,
	retired: Cell<bool>,
	passes: Cell<u64>,
	rerender: RefCell<Option<Rerender>>,
	defer: Rc<dyn Defer>,
}

/// The state arena and cursor of one mounted component instance.
///
/// Cloning is cheap and yields another handle to the same session.
#[derive(Clone)]
pub struct RenderSession(Rc<SessionState>);
impl Debug for RenderSession {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderSession")
			.field("cells", &self.0.cells.borrow().len())
			.field("cursor", &self.0.cursor.get())
			.field("prepared", &self.0.prepared.get())
			.field("scheduled", &self.0.scheduled.get())
			.field("retired", &self.0.retired.get())
			.finish()
	}
}

impl RenderSession {
	#[must_use]
	pub fn new(defer: Rc<dyn Defer>) -> Self {
		Self(Rc::new(SessionState {
			cells: RefCell::default(),
			cursor: Cell::new(0),
			previous_count: Cell::new(None),
			prepared: Cell::new(false),
			scheduled: Cell::new(false),
			retired: Cell::new(false),
			passes: Cell::new(0),
			rerender: RefCell::new(None),
			defer,
		}))
	}

	/// Resets the hook cursor and marks the session as owning the upcoming hook calls.
	pub fn prepare_render(&self) {
		self.0.cursor.set(0);
		self.0.prepared.set(true);
		self.0.passes.set(self.0.passes.get() + 1);
		trace!(pass = self.0.passes.get(), "Prepared render session.");
	}

	/// Registers the routine that scheduled updates invoke.
	pub fn bind_render(&self, rerender: Rerender) {
		*self.0.rerender.borrow_mut() = Some(rerender);
	}

	#[must_use]
	pub fn is_prepared(&self) -> bool {
		self.0.prepared.get()
	}

	/// Whether an update is queued but hasn't run yet.
	#[must_use]
	pub fn is_scheduled(&self) -> bool {
		self.0.scheduled.get()
	}

	#[must_use]
	pub fn is_retired(&self) -> bool {
		self.0.retired.get()
	}

	/// How many times [`prepare_render`](`RenderSession::prepare_render`) ran.
	#[must_use]
	pub fn passes(&self) -> u64 {
		self.0.passes.get()
	}

	/// Reads the next state cell, seeding it with `initial()` if this is its first use.
	///
	/// # Errors
	///
	/// - [`HookError::NotPrepared`] if [`prepare_render`](`RenderSession::prepare_render`) hasn't run (or a render failed since).
	/// - [`HookError::SlotTypeMismatch`] if the cell was seeded with another type.
	pub fn use_state<T>(&self, initial: impl FnOnce() -> T) -> Result<(T, Setter<T>), HookError>
	where
		T: Clone + PartialEq + 'static,
	{
		let state = &self.0;
		if !state.prepared.get() {
			return Err(HookError::NotPrepared);
		}

		let index = state.cursor.get();
		if index == state.cells.borrow().len() {
			let seed = initial();
			state.cells.borrow_mut().push(Box::new(seed));
		}

		let value = state.cells.borrow()[index]
			.downcast_ref::<T>()
			.cloned()
			.ok_or(HookError::SlotTypeMismatch { index, expected: type_name::<T>() })?;
		state.cursor.set(index + 1);

		Ok((
			value,
			Setter {
				session: Rc::downgrade(&self.0),
				index,
				_value: PhantomData,
			},
		))
	}

	/// Ends a render pass, checking the call-order invariant in debug builds.
	///
	/// # Errors
	///
	/// [`HookError::CallCountChanged`] if this pass used a different number of cells than the previous one.
	pub fn finish_render(&self) -> Result<(), HookError> {
		let found = self.0.cursor.get();
		match self.0.previous_count.get() {
			Some(expected) if cfg!(debug_assertions) && expected != found => Err(HookError::CallCountChanged { expected, found }),
			_ => {
				self.0.previous_count.set(Some(found));
				Ok(())
			}
		}
	}

	/// Requests one more run of the bound render routine after the current synchronous turn.
	///
	/// Idempotent until the queued run starts.
	#[instrument(skip(self))]
	pub fn schedule_update(&self) {
		let state = &self.0;
		if state.scheduled.get() || state.retired.get() || state.rerender.borrow().is_none() {
			return;
		}
		if !state.prepared.get() {
			return warn!("`prepare_render` must run before an update can be scheduled.");
		}

		state.scheduled.set(true);
		let session = self.clone();
		state.defer.defer(Box::new(move || session.run_scheduled()));
	}

	fn run_scheduled(&self) {
		let state = &self.0;
		state.scheduled.set(false);
		if state.retired.get() {
			return debug!("Skipped a scheduled render for a retired session.");
		}

		let rerender = match state.rerender.borrow().clone() {
			Some(rerender) => rerender,
			None => return,
		};
		self.prepare_render();
		if let Err(error) = rerender(self) {
			error!("Scheduled render failed: {}", error);
			state.prepared.set(false);
		}
	}

	/// Detaches the session from rendering. Queued updates and later writes are dropped.
	pub fn retire(&self) {
		self.0.retired.set(true);
		self.0.prepared.set(false);
		self.0.rerender.borrow_mut().take();
	}
}

/// Writes one state cell of a [`RenderSession`].
///
/// A setter doesn't keep its session alive.
/// Writes through a setter whose session was retired or dropped are discarded, so late async results of an abandoned page can't leak into the next one.
pub struct Setter<T> {
	session: Weak<SessionState>,
	index: usize,
	_value: PhantomData<fn(T) -> T>,
}
impl<T> Clone for Setter<T> {
	fn clone(&self) -> Self {
		Self {
			session: self.session.clone(),
			index: self.index,
			_value: PhantomData,
		}
	}
}
impl<T> Debug for Setter<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Setter").field("index", &self.index).field("type", &type_name::<T>()).finish()
	}
}

impl<T: PartialEq + 'static> Setter<T> {
	/// Replaces the value.
	pub fn set(&self, value: T) {
		self.update(move |_| value);
	}

	/// Derives the next value from the current one.
	///
	/// Nothing is scheduled if the result equals the current value.
	pub fn update(&self, next: impl FnOnce(&T) -> T) {
		let state = match self.session.upgrade() {
			Some(state) => state,
			None => return debug!(index = self.index, "Dropped a state write: the session no longer exists."),
		};
		if state.retired.get() {
			return debug!(index = self.index, "Dropped a state write: the session was retired.");
		}
		if !state.prepared.get() {
			return error!(index = self.index, "State setter used outside of a prepared render session. The write was dropped.");
		}

		let candidate = {
			let cells = state.cells.borrow();
			match cells.get(self.index).and_then(|cell| cell.downcast_ref::<T>()) {
				Some(current) => {
					let candidate = next(current);
					if candidate == *current {
						return trace!(index = self.index, "State unchanged, skipping update.");
					}
					candidate
				}
				None => return error!(index = self.index, expected = type_name::<T>(), "State setter doesn't match its cell."),
			}
		};

		if let Some(cell) = state.cells.borrow_mut().get_mut(self.index) {
			*cell = Box::new(candidate);
		}
		RenderSession(state).schedule_update();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schedule::manual::ManualQueue;

	type Seen = Rc<RefCell<Vec<(i32, String)>>>;

	/// A two-cell component: `(count, label)`.
	fn component(session: &RenderSession, seen: &Seen) -> Result<(Setter<i32>, Setter<String>), RenderError> {
		let (count, set_count) = session.use_state(|| 0)?;
		let (label, set_label) = session.use_state(|| String::from("initial"))?;
		session.finish_render()?;
		seen.borrow_mut().push((count, label));
		Ok((set_count, set_label))
	}

	fn mount() -> (RenderSession, ManualQueue, Seen, Setter<i32>, Setter<String>) {
		let queue = ManualQueue::default();
		let session = RenderSession::new(Rc::new(queue.clone()));
		let seen = Seen::default();

		let rerender_seen = Rc::clone(&seen);
		session.bind_render(Rc::new(move |session: &RenderSession| component(session, &rerender_seen).map(drop)));
		session.prepare_render();
		let (set_count, set_label) = component(&session, &seen).unwrap();
		(session, queue, seen, set_count, set_label)
	}

	#[test]
	fn seeds_once_then_ignores_initial() {
		let (_session, queue, seen, set_count, _) = mount();
		set_count.set(5);
		assert_eq!(queue.flush(), 1);
		assert_eq!(seen.borrow().last(), Some(&(5, String::from("initial"))));
	}

	#[test]
	fn identical_write_schedules_nothing() {
		let (session, queue, seen, set_count, set_label) = mount();
		set_count.set(0);
		set_label.set(String::from("initial"));
		set_count.update(|count| *count);
		assert_eq!(queue.pending(), 0);
		assert!(!session.is_scheduled());
		assert_eq!(seen.borrow().len(), 1);
	}

	#[test]
	fn writes_in_one_turn_coalesce_into_one_render() {
		let (session, queue, seen, set_count, set_label) = mount();
		set_count.set(1);
		set_count.set(2);
		set_label.set(String::from("second"));
		set_count.set(3);
		assert_eq!(queue.pending(), 1);

		assert_eq!(queue.flush(), 1);
		assert_eq!(*seen.borrow(), vec![(0, String::from("initial")), (3, String::from("second"))]);
		assert_eq!(session.passes(), 2);
	}

	#[test]
	fn updater_sees_previous_value() {
		let (_session, queue, seen, set_count, _) = mount();
		set_count.update(|count| count + 1);
		set_count.update(|count| count + 1);
		queue.flush();
		assert_eq!(seen.borrow().last().map(|(count, _)| *count), Some(2));
	}

	#[test]
	fn use_state_requires_prepare() {
		let session = RenderSession::new(Rc::new(ManualQueue::default()));
		assert_eq!(session.use_state(|| 1).map(|(value, _)| value), Err(HookError::NotPrepared));
	}

	#[test]
	fn failed_render_unprepares_and_drops_later_writes() {
		let (session, queue, seen, set_count, _) = mount();
		session.bind_render(Rc::new(|_: &RenderSession| Err(RenderError::MissingParam("id"))));

		set_count.set(1);
		queue.flush();
		assert!(!session.is_prepared());

		set_count.set(2);
		assert_eq!(queue.pending(), 0);
		assert_eq!(seen.borrow().len(), 1);
	}

	#[test]
	fn retired_session_drops_writes() {
		let (session, queue, seen, set_count, _) = mount();
		set_count.set(1);
		session.retire();
		assert_eq!(queue.flush(), 1);
		assert_eq!(seen.borrow().len(), 1);

		set_count.set(2);
		assert_eq!(queue.pending(), 0);
	}

	#[test]
	fn dropped_session_drops_writes() {
		let (session, queue, _seen, set_count, _) = mount();
		drop(session);
		set_count.set(1);
		assert_eq!(queue.pending(), 0);
	}

	#[test]
	fn mismatched_slot_type_is_reported() {
		let session = RenderSession::new(Rc::new(ManualQueue::default()));
		session.prepare_render();
		session.use_state(|| 1_i32).unwrap();

		session.prepare_render();
		assert_eq!(
			session.use_state(String::new).map(|(value, _)| value),
			Err(HookError::SlotTypeMismatch { index: 0, expected: type_name::<String>() })
		);
	}

	#[cfg(debug_assertions)]
	#[test]
	fn changed_call_count_is_reported() {
		let session = RenderSession::new(Rc::new(ManualQueue::default()));
		session.prepare_render();
		session.use_state(|| 1).unwrap();
		session.use_state(|| 2).unwrap();
		session.finish_render().unwrap();

		session.prepare_render();
		session.use_state(|| 1).unwrap();
		assert_eq!(session.finish_render(), Err(HookError::CallCountChanged { expected: 2, found: 1 }));
	}
}
