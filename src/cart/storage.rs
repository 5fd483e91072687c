//! Durable string storage for the cart snapshot.

use crate::error::StorageError;
use hashbrown::HashMap;
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

pub trait Storage {
	/// # Errors
	///
	/// Iff the storage can't be read.
	fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

	/// # Errors
	///
	/// Iff the value couldn't be stored, for example because the quota is exceeded.
	fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// `window.localStorage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;
impl LocalStorage {
	fn storage() -> Result<web_sys::Storage, StorageError> {
		web_sys::window().ok_or(StorageError::Unavailable)?.local_storage()?.ok_or(StorageError::Unavailable)
	}
}
impl Storage for LocalStorage {
	fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
		Ok(Self::storage()?.get_item(key)?)
	}

	fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
		Ok(Self::storage()?.set_item(key, value)?)
	}
}

/// In-memory storage. Clones share their contents.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
	entries: Rc<RefCell<HashMap<String, String>>>,
	saves: Rc<Cell<usize>>,
	read_only: Rc<Cell<bool>>,
}
impl MemoryStorage {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_entry(key: &str, value: &str) -> Self {
		let storage = Self::new();
		storage.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
		storage
	}

	/// How many successful [`save`](`Storage::save`) calls were made.
	#[must_use]
	pub fn saves(&self) -> usize {
		self.saves.get()
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<String> {
		self.entries.borrow().get(key).cloned()
	}

	/// Makes every following [`save`](`Storage::save`) fail, like an exceeded quota.
	pub fn set_read_only(&self, read_only: bool) {
		self.read_only.set(read_only);
	}
}
impl Storage for MemoryStorage {
	fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
		Ok(self.get(key))
	}

	fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
		if self.read_only.get() {
			return Err(StorageError::Unavailable);
		}
		self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
		self.saves.set(self.saves.get() + 1);
		Ok(())
	}
}
