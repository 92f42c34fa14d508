//! Storage contracts and built-in store implementations for the session credential.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend holding the single active credential of a session.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Fetches the stored credential, if any.
	fn fetch(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Persists or replaces the credential.
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Replaces the credential only if its refresh token still equals `expected_refresh`.
	///
	/// The gateway calls this after a successful refresh so a logout or a fresh login that
	/// raced the refresh call is never overwritten.
	fn rotate<'a>(
		&'a self,
		expected_refresh: &'a str,
		replacement: Credential,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;

	/// Removes the credential, returning the previous value.
	fn clear(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Removes the credential only if its refresh token still equals `expected_refresh`.
	///
	/// The gateway calls this after a failed refresh, so a login that completed while the
	/// refresh call was in flight survives the failure.
	fn clear_if<'a>(
		&'a self,
		expected_refresh: &'a str,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;
}

/// Result of a refresh-token compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The refresh secret matched the expected value and the credential was replaced.
	Updated,
	/// A credential exists but carries a different refresh token.
	RefreshMismatch,
	/// No credential is stored.
	Missing,
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

fn compare_refresh(current: Option<&Credential>, expected: &str) -> CompareAndSwapOutcome {
	match current {
		Some(credential) if credential.refresh_token.expose() == expected =>
			CompareAndSwapOutcome::Updated,
		Some(_) => CompareAndSwapOutcome::RefreshMismatch,
		None => CompareAndSwapOutcome::Missing,
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_gateway_error_with_source() {
		let store_error = StoreError::Backend { message: "keychain locked".into() };
		let gateway_error: Error = store_error.clone().into();

		assert!(matches!(gateway_error, Error::Storage(_)));
		assert!(gateway_error.to_string().contains("keychain locked"));

		let source = StdError::source(&gateway_error)
			.expect("Gateway error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn compare_refresh_distinguishes_all_outcomes() {
		let credential = Credential::new("access", "refresh-1");

		assert_eq!(compare_refresh(Some(&credential), "refresh-1"), CompareAndSwapOutcome::Updated);
		assert_eq!(
			compare_refresh(Some(&credential), "refresh-0"),
			CompareAndSwapOutcome::RefreshMismatch
		);
		assert_eq!(compare_refresh(None, "refresh-1"), CompareAndSwapOutcome::Missing);
	}
}
