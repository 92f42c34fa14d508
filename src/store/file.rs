//! File-backed [`TokenStore`] so a session survives process restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CompareAndSwapOutcome, StoreError, StoreFuture, TokenStore},
};

/// Persists the credential to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Option<Credential>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading an existing credential.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Option<Credential>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: Option<&Credential>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(&contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize credential snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn fetch(&self) -> StoreFuture<'_, Option<Credential>> {
		Box::pin(async move { Ok(self.inner.read().clone()) })
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			self.persist_locked(Some(&credential))?;
			*guard = Some(credential);

			Ok(())
		})
	}

	fn rotate<'a>(
		&'a self,
		expected_refresh: &'a str,
		replacement: Credential,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let outcome = super::compare_refresh(guard.as_ref(), expected_refresh);

			if matches!(outcome, CompareAndSwapOutcome::Updated) {
				self.persist_locked(Some(&replacement))?;
				*guard = Some(replacement);
			}

			Ok(outcome)
		})
	}

	fn clear(&self) -> StoreFuture<'_, Option<Credential>> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			if guard.is_some() {
				self.persist_locked(None)?;
			}

			Ok(guard.take())
		})
	}

	fn clear_if<'a>(
		&'a self,
		expected_refresh: &'a str,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let outcome = super::compare_refresh(guard.as_ref(), expected_refresh);

			if matches!(outcome, CompareAndSwapOutcome::Updated) {
				self.persist_locked(None)?;
				*guard = None;
			}

			Ok(outcome)
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"auth_gateway_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn save_rotate_and_clear_survive_reopen() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let credential = Credential::new("access-1", "refresh-1");

		rt.block_on(store.save(credential.clone())).expect("Failed to save fixture credential.");

		let outcome = rt
			.block_on(store.rotate("refresh-1", Credential::new("access-2", "refresh-1")))
			.expect("Failed to rotate fixture credential.");

		assert_eq!(outcome, CompareAndSwapOutcome::Updated);
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.fetch())
			.expect("Failed to fetch fixture credential from file store.")
			.expect("File store lost the credential after reopen.");

		assert_eq!(fetched.access_token.expose(), "access-2");

		let cleared = rt.block_on(reopened.clear()).expect("Failed to clear file store.");

		assert!(cleared.is_some());

		let reopened = FileStore::open(&path).expect("Failed to reopen cleared file store.");

		assert!(
			rt.block_on(reopened.fetch()).expect("Failed to fetch from cleared store.").is_none()
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn empty_file_opens_as_signed_out_and_corrupt_file_is_rejected() {
		let path = temp_path();

		fs::write(&path, b"").expect("Failed to write empty snapshot fixture.");

		let store = FileStore::open(&path).expect("Empty snapshot should open as signed out.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		assert!(rt.block_on(store.fetch()).expect("Failed to fetch from empty store.").is_none());

		fs::write(&path, b"{\"access_token\":").expect("Failed to write corrupt snapshot fixture.");

		let err = FileStore::open(&path).expect_err("Corrupt snapshot should be rejected.");

		assert!(matches!(err, StoreError::Serialization { .. }));
		assert!(err.to_string().contains(&path.display().to_string()));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn clear_if_keeps_a_newer_credential_on_disk() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(Credential::new("access-new", "refresh-new")))
			.expect("Failed to save fixture credential.");

		let outcome = rt
			.block_on(store.clear_if("refresh-old"))
			.expect("Conditional clear should report, not fail.");

		assert_eq!(outcome, CompareAndSwapOutcome::RefreshMismatch);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let outcome = rt
			.block_on(reopened.clear_if("refresh-new"))
			.expect("Conditional clear should succeed for the stored token.");

		assert_eq!(outcome, CompareAndSwapOutcome::Updated);

		let reopened = FileStore::open(&path).expect("Failed to reopen cleared file store.");

		assert!(rt.block_on(reopened.fetch()).expect("Failed to fetch cleared store.").is_none());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
