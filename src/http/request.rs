//! Request values: what callers hand to the gateway and what the gateway hands to transports.

// self
use crate::{_prelude::*, error::ConfigError, http::MultipartForm};

/// HTTP methods used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical uppercase method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// A call issued through the gateway, relative to the configured base URL.
///
/// Bodies are buffered so a request parked behind a token refresh can be replayed with the same
/// bytes. The retry marker is set by the gateway once a request has been replayed with a
/// refreshed token; a marked request that fails authorization again is never refreshed for.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiRequest {
	/// Request method.
	pub method: Method,
	/// Path appended to the base URL (e.g. `/users/42`).
	pub path: String,
	/// Query pairs appended to the URL.
	pub query: Vec<(String, String)>,
	/// Request headers, keyed by lowercase name.
	pub headers: BTreeMap<String, String>,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
	retried: bool,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: BTreeMap::new(),
			body: None,
			retried: false,
		}
	}

	/// `GET` request for the provided path.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// `POST` request for the provided path.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// `PUT` request for the provided path.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// `PATCH` request for the provided path.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// `DELETE` request for the provided path.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Adds or replaces a header. Names are stored lowercase.
	pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Sets a raw body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `body` as JSON and sets the JSON content type.
	pub fn json<B>(self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body).map_err(ConfigError::BodyEncode)?;

		Ok(self.header("content-type", "application/json").body(bytes))
	}

	/// Encodes `form` as the body and sets its `multipart/form-data` content type.
	pub fn multipart(self, form: &MultipartForm) -> Self {
		self.header("content-type", form.content_type()).body(form.encode())
	}

	/// Returns `true` once the request has been replayed after a token refresh.
	pub fn is_retry(&self) -> bool {
		self.retried
	}

	/// Marks the request as a retry attempt.
	pub fn into_retry(mut self) -> Self {
		self.retried = true;

		self
	}
}
impl Debug for ApiRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiRequest")
			.field("method", &self.method)
			.field("path", &self.path)
			.field("query", &self.query)
			.field("headers", &RedactedHeaders(&self.headers))
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.field("retried", &self.retried)
			.finish()
	}
}

/// Fully resolved request handed to a [`Transport`](crate::http::Transport).
#[derive(Clone, PartialEq, Eq)]
pub struct OutboundRequest {
	/// Request method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Merged headers (defaults, request overrides, then `authorization`).
	pub headers: BTreeMap<String, String>,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
}
impl OutboundRequest {
	/// Returns the bearer token attached to the request, if any.
	pub fn bearer(&self) -> Option<&str> {
		self.headers.get("authorization")?.strip_prefix("Bearer ")
	}
}
impl Debug for OutboundRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OutboundRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &RedactedHeaders(&self.headers))
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

struct RedactedHeaders<'a>(&'a BTreeMap<String, String>);
impl Debug for RedactedHeaders<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_map()
			.entries(self.0.iter().map(|(name, value)| {
				let shown = if name == "authorization" { "<redacted>" } else { value.as_str() };

				(name, shown)
			}))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn json_body_sets_content_type() {
		let request = ApiRequest::post("/users")
			.json(&serde_json::json!({ "email": "ada@example.com" }))
			.expect("JSON body should encode.");

		assert_eq!(
			request.headers.get("content-type").map(String::as_str),
			Some("application/json")
		);
		assert_eq!(request.body.as_deref(), Some(br#"{"email":"ada@example.com"}"#.as_slice()));
		assert!(!request.is_retry());
		assert!(request.into_retry().is_retry());
	}

	#[test]
	fn multipart_body_replaces_the_json_content_type() {
		let form = MultipartForm::new().text("folder", "q3");
		let request = ApiRequest::post("/files")
			.header("content-type", "application/json")
			.multipart(&form);

		assert_eq!(request.headers.get("content-type"), Some(&form.content_type()));
		assert_eq!(request.body, Some(form.encode()));
	}

	#[test]
	fn debug_output_redacts_authorization() {
		let request = ApiRequest::get("/auth/me").header("Authorization", "Bearer secret-token");
		let rendered = format!("{request:?}");

		assert!(!rendered.contains("secret-token"));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn outbound_bearer_strips_scheme() {
		let mut headers = BTreeMap::new();

		headers.insert("authorization".into(), "Bearer T2".into());

		let outbound = OutboundRequest {
			method: Method::Get,
			url: Url::parse("http://localhost/api/a").expect("URL fixture should parse."),
			headers,
			body: None,
		};

		assert_eq!(outbound.bearer(), Some("T2"));
	}
}
