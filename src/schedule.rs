//! Deferral of coalesced re-renders.

/// Runs a task after the current synchronous turn has finished.
pub trait Defer {
	fn defer(&self, task: Box<dyn FnOnce()>);
}

/// Defers onto the JavaScript microtask queue, which drains before the browser handles the next event or paints.
#[derive(Debug, Default, Clone, Copy)]
pub struct Microtask;
impl Defer for Microtask {
	fn defer(&self, task: Box<dyn FnOnce()>) {
		wasm_bindgen_futures::spawn_local(async move { task() });
	}
}
