//! The access/refresh token pair held for an authenticated session.

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, claims},
};

/// Access + refresh token pair for one authenticated session.
///
/// Created on login, replaced on each successful refresh, and cleared on logout or when a
/// refresh fails for good.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Short-lived token attached to outbound requests.
	pub access_token: TokenSecret,
	/// Longer-lived token used solely to mint new access tokens.
	pub refresh_token: TokenSecret,
	/// Instant the pair was issued by login.
	pub issued_at: OffsetDateTime,
	/// Instant of the most recent successful refresh.
	pub refreshed_at: Option<OffsetDateTime>,
}
impl Credential {
	/// Creates a freshly issued credential pair.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			issued_at: OffsetDateTime::now_utc(),
			refreshed_at: None,
		}
	}

	/// Overrides the issue instant.
	pub fn with_issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = instant;

		self
	}

	/// Returns the credential that results from a refresh.
	///
	/// The refresh token is kept unless the refresh endpoint rotated it.
	pub fn refreshed(
		&self,
		access_token: TokenSecret,
		rotated_refresh: Option<TokenSecret>,
		instant: OffsetDateTime,
	) -> Self {
		Self {
			access_token,
			refresh_token: rotated_refresh.unwrap_or_else(|| self.refresh_token.clone()),
			issued_at: self.issued_at,
			refreshed_at: Some(instant),
		}
	}

	/// Expiry of the access token when it is a JWT carrying `exp`.
	pub fn access_expires_at(&self) -> Option<OffsetDateTime> {
		claims::token_expires_at(&self.access_token)
	}

	/// Returns `true` if the access token is known to be expired at `instant`.
	pub fn is_access_expired_at(&self, instant: OffsetDateTime) -> bool {
		claims::is_token_expired_at(&self.access_token, instant)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("refreshed_at", &self.refreshed_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn refresh_keeps_refresh_token_unless_rotated() {
		let issued = macros::datetime!(2025-11-10 12:00 UTC);
		let refreshed_at = issued + Duration::minutes(15);
		let credential = Credential::new("access-1", "refresh-1").with_issued_at(issued);
		let kept = credential.refreshed(TokenSecret::new("access-2"), None, refreshed_at);

		assert_eq!(kept.access_token.expose(), "access-2");
		assert_eq!(kept.refresh_token.expose(), "refresh-1");
		assert_eq!(kept.issued_at, issued);
		assert_eq!(kept.refreshed_at, Some(refreshed_at));

		let rotated = credential.refreshed(
			TokenSecret::new("access-3"),
			Some(TokenSecret::new("refresh-2")),
			refreshed_at,
		);

		assert_eq!(rotated.refresh_token.expose(), "refresh-2");
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let rendered = format!("{:?}", Credential::new("access-secret", "refresh-secret"));

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
		assert!(rendered.contains("<redacted>"));
	}
}
