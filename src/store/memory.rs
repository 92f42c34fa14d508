//! Thread-safe in-memory [`TokenStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CompareAndSwapOutcome, StoreFuture, TokenStore},
};

type Slot = Arc<RwLock<Option<Credential>>>;

/// Process-local store; the credential lives as long as the process does.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Creates a store seeded with `credential`.
	pub fn with_credential(credential: Credential) -> Self {
		Self(Arc::new(RwLock::new(Some(credential))))
	}

	/// Synchronous snapshot of the stored credential.
	pub fn snapshot(&self) -> Option<Credential> {
		self.0.read().clone()
	}

	fn rotate_now(
		slot: &Slot,
		expected_refresh: &str,
		replacement: Credential,
	) -> CompareAndSwapOutcome {
		let mut guard = slot.write();
		let outcome = super::compare_refresh(guard.as_ref(), expected_refresh);

		if matches!(outcome, CompareAndSwapOutcome::Updated) {
			*guard = Some(replacement);
		}

		outcome
	}
}
impl TokenStore for MemoryStore {
	fn fetch(&self) -> StoreFuture<'_, Option<Credential>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(credential);

			Ok(())
		})
	}

	fn rotate<'a>(
		&'a self,
		expected_refresh: &'a str,
		replacement: Credential,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move { Ok(Self::rotate_now(&self.0, expected_refresh, replacement)) })
	}

	fn clear(&self) -> StoreFuture<'_, Option<Credential>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.write().take()) })
	}

	fn clear_if<'a>(
		&'a self,
		expected_refresh: &'a str,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move {
			let mut guard = self.0.write();
			let outcome = super::compare_refresh(guard.as_ref(), expected_refresh);

			if matches!(outcome, CompareAndSwapOutcome::Updated) {
				*guard = None;
			}

			Ok(outcome)
		})
	}
}
