//! Gateway-level error types shared by the transport, the refresh coordinator, and stores.
//!
//! Callers see three outcomes for a failed call: [`NetworkError`] when no response arrived,
//! [`ServerError`] when the API answered with a non-authorization failure, and [`AuthError`]
//! once the single-flight refresh protocol could not recover an authorization failure.

// self
use crate::{_prelude::*, classify::FailureDetails, config::GatewayConfigError, store::StoreError};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// No response was received from the API.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// The API answered with a failure status that is not an authorization failure.
	#[error(transparent)]
	Server(#[from] ServerError),
	/// Authorization failure that the refresh protocol could not resolve.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// A successful response carried a body that did not match the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),
}
impl Error {
	/// HTTP status attached to the failure, when a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Server(e) => Some(e.status),
			Self::Auth(e) => e.status,
			Self::Decode(e) => Some(e.status),
			_ => None,
		}
	}

	/// Stable error code in the API's `SCREAMING_SNAKE_CASE` convention.
	pub fn code(&self) -> &str {
		match self {
			Self::Network(_) => NetworkError::CODE,
			Self::Server(e) => &e.code,
			Self::Auth(e) => &e.code,
			Self::Config(_) => "REQUEST_ERROR",
			Self::Storage(_) => "STORAGE_ERROR",
			Self::Decode(_) => "DECODE_ERROR",
		}
	}

	/// Returns `true` for failures that require the user to authenticate again.
	pub fn is_auth(&self) -> bool {
		matches!(self, Self::Auth(_))
	}
}
impl From<GatewayConfigError> for Error {
	fn from(e: GatewayConfigError) -> Self {
		Self::Config(e.into())
	}
}

/// Request was dispatched but no response was received.
#[derive(Debug, ThisError)]
#[error("Network error while calling {path}; please check your connection.")]
pub struct NetworkError {
	/// Request path that failed.
	pub path: String,
	/// Transport failure reported by the underlying client.
	#[source]
	pub source: TransportError,
}
impl NetworkError {
	/// Error code reported for every network failure.
	pub const CODE: &'static str = "NETWORK_ERROR";

	/// Wraps a transport failure for the provided request path.
	pub fn new(path: impl Into<String>, source: TransportError) -> Self {
		Self { path: path.into(), source }
	}
}

/// Response received with a failure status that is not an authorization failure.
#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("Server responded with HTTP {status}: {message}")]
pub struct ServerError {
	/// HTTP status code.
	pub status: u16,
	/// API-supplied error code, or `HTTP_<status>`.
	pub code: String,
	/// API-supplied message, or `HTTP <status> Error`.
	pub message: String,
	/// JSON error body, when the API returned an object.
	pub details: Option<serde_json::Value>,
	/// Retry-After hint from the response, if supplied.
	pub retry_after: Option<Duration>,
}
impl ServerError {
	/// Builds a server error from classified failure details.
	pub fn from_details(
		status: u16,
		details: FailureDetails,
		retry_after: Option<Duration>,
	) -> Self {
		Self {
			status,
			code: details.code,
			message: details.message,
			details: details.details,
			retry_after,
		}
	}
}

/// Reasons an authorization failure could not be resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthErrorKind {
	/// The request was already retried once with a refreshed token and was rejected again.
	RetryRejected,
	/// The refresh endpoint rejected the refresh token or could not be reached.
	RefreshFailed,
	/// No refresh token is stored, so no refresh can be attempted.
	MissingRefreshToken,
	/// Credentials were cleared (logout) while the refresh was running.
	SessionCleared,
	/// The task running the refresh was dropped before the refresh finished.
	RefreshInterrupted,
}
impl AuthErrorKind {
	/// Returns the default error code for the kind.
	pub const fn code(self) -> &'static str {
		match self {
			Self::RetryRejected => "AUTH_RETRY_REJECTED",
			Self::RefreshFailed => "REFRESH_FAILED",
			Self::MissingRefreshToken => "NO_REFRESH_TOKEN",
			Self::SessionCleared => "SESSION_CLEARED",
			Self::RefreshInterrupted => "REFRESH_INTERRUPTED",
		}
	}
}

/// Authorization failure that remained unresolved after at most one refresh attempt.
///
/// The error is `Clone` because a failed refresh rejects every queued caller with the same
/// value.
#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("Authorization failed: {message}")]
pub struct AuthError {
	/// Why the failure could not be resolved.
	pub kind: AuthErrorKind,
	/// Downstream HTTP status, when a response was received.
	pub status: Option<u16>,
	/// Downstream error code, or the kind's default code.
	pub code: String,
	/// Human-readable message.
	pub message: String,
}
impl AuthError {
	/// Creates an error of the given kind with the kind's default code.
	pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
		Self { kind, status: None, code: kind.code().into(), message: message.into() }
	}

	/// Attaches the downstream status code.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	/// A request marked as retried was rejected again.
	pub fn retry_rejected(status: u16, details: FailureDetails) -> Self {
		Self {
			kind: AuthErrorKind::RetryRejected,
			status: Some(status),
			code: details.code,
			message: details.message,
		}
	}

	/// The refresh endpoint answered with a failure status.
	pub fn refresh_rejected(status: u16, details: &FailureDetails) -> Self {
		Self::new(
			AuthErrorKind::RefreshFailed,
			format!("token refresh was rejected: {}", details.message),
		)
		.with_status(status)
	}

	/// The refresh call failed without a usable response.
	pub fn refresh_failed(reason: impl Display) -> Self {
		Self::new(AuthErrorKind::RefreshFailed, format!("token refresh failed: {reason}"))
	}

	/// No refresh token is available.
	pub fn missing_refresh_token() -> Self {
		Self::new(AuthErrorKind::MissingRefreshToken, "no refresh token is available")
	}

	/// Credentials were cleared while a refresh was running.
	pub fn session_cleared() -> Self {
		Self::new(AuthErrorKind::SessionCleared, "the session was cleared during token refresh")
	}

	/// The refresher was dropped before it finished.
	pub fn refresh_interrupted() -> Self {
		Self::new(
			AuthErrorKind::RefreshInterrupted,
			"the token refresh was abandoned before it completed",
		)
	}
}
impl From<StoreError> for AuthError {
	fn from(e: StoreError) -> Self {
		Self::refresh_failed(e)
	}
}

/// Configuration and request construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Gateway configuration failed validation.
	#[error(transparent)]
	Gateway(#[from] GatewayConfigError),
	/// Request path could not be resolved against the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	BodyEncode(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Successful response body could not be decoded.
#[derive(Debug, ThisError)]
#[error("Response body (HTTP {status}) could not be decoded at `{}`.", .source.path())]
pub struct DecodeError {
	/// Structured parsing failure, including the JSON path that failed.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
	/// HTTP status of the response.
	pub status: u16,
}

/// Transport-level failures (no response received).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request deadline elapsed before a response arrived.
	#[error("Request timed out before a response arrived.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
