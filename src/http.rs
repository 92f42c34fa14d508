//! Transport primitives for gateway calls.
//!
//! The module exposes [`Transport`], the gateway's only dependency on an HTTP stack, along with
//! the request/response values that cross it. Implementations receive a fully resolved
//! [`OutboundRequest`] (absolute URL, merged headers, bearer credential already attached) and
//! report either the response, whatever its status, or a [`TransportError`] when nothing came
//! back.

pub mod multipart;
pub mod request;
pub mod response;

pub use multipart::*;
pub use request::*;
pub use response::*;

// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`Transport::issue`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP clients capable of executing gateway requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back many gateway
/// clones, and the futures they return must be `Send` so callers can move gateway futures
/// across executor threads.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Issues the request, returning any received response unchanged.
	///
	/// Failure statuses are not errors at this layer; only the absence of a response is.
	fn issue(&self, request: OutboundRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	timeout: Option<std::time::Duration>,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, timeout: None }
	}

	/// Applies a per-request deadline on top of the client's own settings.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout.unsigned_abs());

		self
	}

	/// Returns the wrapped client.
	pub fn client(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn issue(&self, request: OutboundRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let OutboundRequest { method, url, headers, body } = request;
			let mut builder = self.client.request(reqwest_method(method), url);

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(timeout) = self.timeout {
				builder = builder.timeout(timeout);
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: Method) -> reqwest::Method {
	match method {
		Method::Get => reqwest::Method::GET,
		Method::Post => reqwest::Method::POST,
		Method::Put => reqwest::Method::PUT,
		Method::Patch => reqwest::Method::PATCH,
		Method::Delete => reqwest::Method::DELETE,
	}
}
