//! Validating builder for [`GatewayConfig`] and the errors it reports.

// self
use crate::{
	_prelude::*,
	config::{AuthEndpoints, GatewayConfig},
};

/// Errors raised while constructing or validating a [`GatewayConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum GatewayConfigError {
	/// Base URL could not be parsed.
	#[error("Base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Raw value that failed to parse.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL must use HTTP or HTTPS.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry a path (e.g. `mailto:`).
	#[error("Base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Endpoint paths must be absolute paths below the base URL.
	#[error("The {endpoint} endpoint path must start with `/`: {path}.")]
	InvalidEndpointPath {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Path that failed validation.
		path: String,
	},
	/// Timeout must be positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// Timeout override could not be parsed as milliseconds.
	#[error("Request timeout `{value}` is not a whole number of milliseconds.")]
	InvalidTimeout {
		/// Raw value that failed to parse.
		value: String,
	},
	/// Default header names must be non-empty ASCII tokens.
	#[error("Default header name `{name}` is invalid.")]
	InvalidHeaderName {
		/// Header name that failed validation.
		name: String,
	},
}

/// Builder for [`GatewayConfig`] values.
///
/// Also the deserialization shape of [`GatewayConfig`]: omitted fields take the same defaults
/// as [`GatewayConfigBuilder::new`].
#[derive(Debug, Deserialize)]
pub struct GatewayConfigBuilder {
	/// Base URL every request path is appended to.
	pub base_url: Url,
	/// Per-request deadline.
	#[serde(default = "default_timeout")]
	pub timeout: Duration,
	/// Headers sent with every request.
	#[serde(default = "default_headers")]
	pub default_headers: BTreeMap<String, String>,
	/// Authentication endpoint paths.
	#[serde(default)]
	pub endpoints: AuthEndpoints,
}
impl GatewayConfigBuilder {
	/// Creates a new builder seeded with the provided base URL and the defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			timeout: default_timeout(),
			default_headers: default_headers(),
			endpoints: AuthEndpoints::default(),
		}
	}

	/// Overrides the request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Adds or replaces a default header. Names are stored lowercase.
	pub fn default_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.default_headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Removes every default header, including the JSON content type.
	pub fn clear_default_headers(mut self) -> Self {
		self.default_headers.clear();

		self
	}

	/// Sets the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.refresh = path.into();

		self
	}

	/// Sets the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.login = path.into();

		self
	}

	/// Sets the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.logout = path.into();

		self
	}

	/// Sets the current-user endpoint path.
	pub fn me_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.me = path.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, GatewayConfigError> {
		let config = GatewayConfig {
			base_url: self.base_url,
			timeout: self.timeout,
			default_headers: self.default_headers,
			endpoints: self.endpoints,
		};

		config.validate()?;

		Ok(config)
	}
}

impl TryFrom<GatewayConfigBuilder> for GatewayConfig {
	type Error = GatewayConfigError;

	fn try_from(builder: GatewayConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

impl GatewayConfig {
	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), GatewayConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(GatewayConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.base_url.cannot_be_a_base() {
			return Err(GatewayConfigError::CannotBeABase { url: self.base_url.to_string() });
		}
		if !self.timeout.is_positive() {
			return Err(GatewayConfigError::NonPositiveTimeout);
		}

		validate_path("refresh", &self.endpoints.refresh)?;
		validate_path("login", &self.endpoints.login)?;
		validate_path("logout", &self.endpoints.logout)?;
		validate_path("me", &self.endpoints.me)?;
		validate_path("forgot_password", &self.endpoints.forgot_password)?;
		validate_path("reset_password", &self.endpoints.reset_password)?;
		validate_path("change_password", &self.endpoints.change_password)?;
		validate_path("verify_email", &self.endpoints.verify_email)?;
		validate_path("resend_verification", &self.endpoints.resend_verification)?;

		for name in self.default_headers.keys() {
			validate_header_name(name)?;
		}

		Ok(())
	}
}

fn default_timeout() -> Duration {
	GatewayConfig::DEFAULT_TIMEOUT
}

fn default_headers() -> BTreeMap<String, String> {
	BTreeMap::from([("content-type".to_owned(), "application/json".to_owned())])
}

fn validate_path(endpoint: &'static str, path: &str) -> Result<(), GatewayConfigError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(GatewayConfigError::InvalidEndpointPath { endpoint, path: path.to_owned() })
	}
}

fn validate_header_name(name: &str) -> Result<(), GatewayConfigError> {
	let valid = !name.is_empty()
		&& name.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));

	if valid {
		Ok(())
	} else {
		Err(GatewayConfigError::InvalidHeaderName { name: name.to_owned() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse base URL fixture.")
	}

	#[test]
	fn builder_rejects_unsupported_base_urls() {
		let err = GatewayConfig::builder(url("ftp://example.com/api"))
			.build()
			.expect_err("Builder should reject non-HTTP schemes.");

		assert!(matches!(err, GatewayConfigError::UnsupportedScheme { .. }));
	}

	#[test]
	fn builder_rejects_relative_endpoint_paths_and_zero_timeout() {
		let err = GatewayConfig::builder(url("https://example.com/api"))
			.refresh_path("auth/refresh")
			.build()
			.expect_err("Builder should reject relative endpoint paths.");

		assert_eq!(
			err,
			GatewayConfigError::InvalidEndpointPath {
				endpoint: "refresh",
				path: "auth/refresh".into()
			}
		);

		let err = GatewayConfig::builder(url("https://example.com/api"))
			.timeout(Duration::ZERO)
			.build()
			.expect_err("Builder should reject a zero timeout.");

		assert_eq!(err, GatewayConfigError::NonPositiveTimeout);
	}

	#[test]
	fn builder_normalizes_header_names() {
		let config = GatewayConfig::builder(url("https://example.com/api"))
			.default_header("X-Client", "crm-panel")
			.login_path("/session")
			.build()
			.expect("Builder should accept valid overrides.");

		assert_eq!(config.default_headers.get("x-client").map(String::as_str), Some("crm-panel"));
		assert_eq!(config.endpoints.login, "/session");

		let err = GatewayConfig::builder(url("https://example.com/api"))
			.default_header("bad header", "value")
			.build()
			.expect_err("Builder should reject header names with spaces.");

		assert!(matches!(err, GatewayConfigError::InvalidHeaderName { .. }));
	}
}
