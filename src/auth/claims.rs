//! Best-effort inspection of JWT access tokens.
//!
//! Access tokens stay opaque to the gateway's refresh protocol; these helpers only let
//! applications decide whether to refresh proactively. Tokens that are not JWTs (or whose
//! payload cannot be decoded) report no expiry and count as expired.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Registered claims read from a JWT payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AccessClaims {
	/// Expiry, seconds since the Unix epoch.
	#[serde(default)]
	pub exp: Option<i64>,
	/// Issued-at, seconds since the Unix epoch.
	#[serde(default)]
	pub iat: Option<i64>,
	/// Subject identifier.
	#[serde(default)]
	pub sub: Option<String>,
}
impl AccessClaims {
	/// Decodes the payload segment of a JWT, returning `None` for anything else.
	pub fn decode(token: &TokenSecret) -> Option<Self> {
		let payload = token.expose().split('.').nth(1)?;
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;

		serde_json::from_slice(&bytes).ok()
	}

	/// Expiry instant, when the `exp` claim is present and in range.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.exp?).ok()
	}
}

/// Returns the access token's expiry instant, if it can be read.
pub fn token_expires_at(token: &TokenSecret) -> Option<OffsetDateTime> {
	AccessClaims::decode(token)?.expires_at()
}

/// Returns `true` if the token expired before `instant` or its expiry cannot be read.
pub fn is_token_expired_at(token: &TokenSecret, instant: OffsetDateTime) -> bool {
	token_expires_at(token).is_none_or(|expires_at| expires_at < instant)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn jwt(payload: &str) -> TokenSecret {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
		let body = URL_SAFE_NO_PAD.encode(payload.as_bytes());

		TokenSecret::new(format!("{header}.{body}.signature"))
	}

	#[test]
	fn reads_expiry_from_jwt_payload() {
		let token = jwt(r#"{"exp":1700000000,"sub":"user-1"}"#);
		let claims = AccessClaims::decode(&token).expect("JWT payload should decode.");

		assert_eq!(claims.sub.as_deref(), Some("user-1"));
		assert_eq!(token_expires_at(&token), Some(macros::datetime!(2023-11-14 22:13:20 UTC)));
		assert!(is_token_expired_at(&token, macros::datetime!(2024-01-01 00:00 UTC)));
		assert!(!is_token_expired_at(&token, macros::datetime!(2023-01-01 00:00 UTC)));
	}

	#[test]
	fn opaque_tokens_count_as_expired() {
		let token = TokenSecret::new("opaque-access-token");

		assert_eq!(AccessClaims::decode(&token), None);
		assert_eq!(token_expires_at(&token), None);
		assert!(is_token_expired_at(&token, OffsetDateTime::UNIX_EPOCH));
	}

	#[test]
	fn payload_without_exp_has_no_expiry() {
		let token = jwt(r#"{"sub":"user-2"}"#);

		assert_eq!(token_expires_at(&token), None);
		assert!(is_token_expired_at(&token, OffsetDateTime::UNIX_EPOCH));
	}
}
