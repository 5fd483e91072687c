//! Reference counts of live registrations, keyed by kind.

use core::{borrow::Borrow, hash::Hash};
use hashbrown::HashMap;
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

/// Counts registrations per key and forgets keys whose count dropped back to zero.
#[derive(Debug, Clone)]
pub struct Ledger<K, C = u32>(HashMap<K, C>)
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero + Copy;
impl<K, C> Default for Ledger<K, C>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero + Copy,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K, C> Ledger<K, C>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero + Copy,
{
	#[must_use]
	pub fn new() -> Self {
		Self(HashMap::new())
	}

	/// # Errors
	///
	/// Iff the count for `key` would overflow. The count is unchanged in that case.
	pub fn increment(&mut self, key: K) -> Result<C, CountError> {
		let count = self.0.entry(key).or_insert_with(C::zero);
		*count = count.checked_add(&C::one()).ok_or(CountError::Saturated)?;
		Ok(*count)
	}

	/// # Errors
	///
	/// Iff `key` has no live registrations, which means a teardown ran twice.
	pub fn decrement<Q>(&mut self, key: &Q) -> Result<C, CountError>
	where
		K: Borrow<Q>,
		Q: ?Sized + Hash + Eq,
	{
		let count = self.0.get_mut(key).ok_or(CountError::Unbalanced)?;
		*count = count.checked_sub(&C::one()).ok_or(CountError::Unbalanced)?;
		Ok(*count)
	}

	#[must_use]
	pub fn count<Q>(&self, key: &Q) -> C
	where
		K: Borrow<Q>,
		Q: ?Sized + Hash + Eq,
	{
		self.0.get(key).copied().unwrap_or_else(C::zero)
	}

	#[must_use]
	pub fn total(&self) -> C {
		self.0.values().fold(C::zero(), |total, count| total.checked_add(count).unwrap_or(total))
	}

	/// Removes settled (zero) entries, returning how many were removed.
	pub fn prune(&mut self) -> usize {
		let before = self.0.len();
		self.0.retain(|_, count| !count.is_zero());
		before - self.0.len()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountError {
	Saturated,
	Unbalanced,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_and_prunes() {
		let mut ledger = Ledger::<&str>::new();
		assert_eq!(ledger.increment("click"), Ok(1));
		assert_eq!(ledger.increment("click"), Ok(2));
		assert_eq!(ledger.increment("change"), Ok(1));
		assert_eq!(ledger.total(), 3);

		assert_eq!(ledger.decrement("change"), Ok(0));
		assert_eq!(ledger.count("change"), 0);
		assert_eq!(ledger.prune(), 1);
		assert_eq!(ledger.len(), 1);
	}

	#[test]
	fn unbalanced_decrement_is_an_error() {
		let mut ledger = Ledger::<&str>::new();
		assert_eq!(ledger.decrement("click"), Err(CountError::Unbalanced));
		ledger.increment("click").unwrap();
		ledger.decrement("click").unwrap();
		assert_eq!(ledger.decrement("click"), Err(CountError::Unbalanced));
	}

	#[test]
	fn saturation_leaves_count_intact() {
		let mut ledger = Ledger::<&str, u8>::new();
		for _ in 0..u8::MAX {
			ledger.increment("scroll").unwrap();
		}
		assert_eq!(ledger.increment("scroll"), Err(CountError::Saturated));
		assert_eq!(ledger.count("scroll"), u8::MAX);
	}
}
