//! Gateway configuration: API base URL, request timeout, default headers, and auth endpoints.
//!
//! [`GatewayConfig`] values are immutable once built. Use [`GatewayConfig::builder`] (or
//! [`GatewayConfig::from_env`]) so the base URL and endpoint paths are validated before a
//! gateway ever issues a request.

pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Relative paths of the authentication endpoints exposed by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
	/// `POST {refreshToken} -> {token}` endpoint.
	pub refresh: String,
	/// `POST {email, password, rememberMe} -> {user, token, refreshToken}` endpoint.
	pub login: String,
	/// Best-effort `POST {refreshToken}` logout notification endpoint.
	pub logout: String,
	/// `GET -> user` endpoint returning the authenticated user.
	pub me: String,
	/// `POST {email}` endpoint requesting a password-reset e-mail.
	pub forgot_password: String,
	/// `POST {token, password}` endpoint completing a password reset.
	pub reset_password: String,
	/// `POST {currentPassword, newPassword}` endpoint for signed-in password changes.
	pub change_password: String,
	/// `POST {token}` endpoint confirming an e-mail address.
	pub verify_email: String,
	/// `POST` endpoint re-sending the verification e-mail.
	pub resend_verification: String,
}
impl Default for AuthEndpoints {
	fn default() -> Self {
		Self {
			refresh: "/auth/refresh".into(),
			login: "/auth/login".into(),
			logout: "/auth/logout".into(),
			me: "/auth/me".into(),
			forgot_password: "/auth/forgot-password".into(),
			reset_password: "/auth/reset-password".into(),
			change_password: "/auth/change-password".into(),
			verify_email: "/auth/verify-email".into(),
			resend_verification: "/auth/resend-verification".into(),
		}
	}
}

/// Immutable gateway configuration.
///
/// Deserialization goes through [`GatewayConfigBuilder`], so a deserialized configuration is
/// validated exactly like a built one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GatewayConfigBuilder")]
pub struct GatewayConfig {
	/// Base URL every request path is appended to.
	pub base_url: Url,
	/// Per-request deadline applied by the transport.
	pub timeout: Duration,
	/// Headers sent with every request unless the request overrides them.
	pub default_headers: BTreeMap<String, String>,
	/// Authentication endpoint paths.
	pub endpoints: AuthEndpoints,
}
impl GatewayConfig {
	/// Base URL used when none is configured.
	pub const DEFAULT_BASE_URL: &'static str = "http://localhost:3001/api";
	/// Environment variable overriding the base URL.
	pub const ENV_BASE_URL: &'static str = "AUTH_GATEWAY_BASE_URL";
	/// Environment variable overriding the timeout, in milliseconds.
	pub const ENV_TIMEOUT_MS: &'static str = "AUTH_GATEWAY_TIMEOUT_MS";
	/// Request timeout used when none is configured.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(10);

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Builds a configuration from `AUTH_GATEWAY_BASE_URL` and `AUTH_GATEWAY_TIMEOUT_MS`,
	/// falling back to the defaults for unset variables.
	pub fn from_env() -> Result<Self, GatewayConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Same as [`GatewayConfig::from_env`], reading variables through `lookup`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let raw_url = lookup(Self::ENV_BASE_URL).unwrap_or_else(|| Self::DEFAULT_BASE_URL.into());
		let base_url = Url::parse(&raw_url)
			.map_err(|source| GatewayConfigError::InvalidBaseUrl { value: raw_url, source })?;
		let mut builder = Self::builder(base_url);

		if let Some(raw) = lookup(Self::ENV_TIMEOUT_MS) {
			let millis = raw
				.trim()
				.parse::<i64>()
				.map_err(|_| GatewayConfigError::InvalidTimeout { value: raw.clone() })?;

			builder = builder.timeout(Duration::milliseconds(millis));
		}

		builder.build()
	}

	/// Resolves a request path (and optional query pairs) against the base URL.
	///
	/// Paths are appended to the base path, so `/users` under `http://host/api` resolves to
	/// `http://host/api/users`.
	pub fn resolve(&self, path: &str, query: &[(String, String)]) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let joined = if path.starts_with('/') {
			format!("{base}{path}")
		} else {
			format!("{base}/{path}")
		};
		let mut url = Url::parse(&joined)
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })?;

		if !query.is_empty() {
			url.query_pairs_mut()
				.extend_pairs(query.iter().map(|(key, value)| (key.as_str(), value.as_str())));
		}

		Ok(url)
	}
}
