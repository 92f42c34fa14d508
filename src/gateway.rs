//! The authenticated request gateway.
//!
//! [`Gateway`] attaches the stored access token to every call, turns authorization failures into
//! at most one token refresh shared by every concurrent caller, and wakes the parked callers in
//! arrival order so each replays its own request with the refreshed token.

pub mod metrics;

mod queue;
mod refresh;

pub use metrics::GatewayMetrics;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	classify::{DefaultResponseClassifier, ResponseClass, ResponseClassifier},
	config::GatewayConfig,
	error::{AuthError, NetworkError, ServerError},
	http::{ApiRequest, ApiResponse, MultipartForm, OutboundRequest, Transport},
	obs::{self, GatewayOp, OpOutcome, OpSpan},
	session::{SessionListener, SessionTerminated},
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Authenticated request gateway.
///
/// Clones share the transport, the token store, the listeners, and the refresh state, so a
/// refresh started through one clone is joined by calls made through any other.
pub struct Gateway<T>
where
	T: ?Sized + Transport,
{
	/// Transport used for every outbound call, including the refresh call.
	pub transport: Arc<T>,
	/// Store holding the session credential.
	pub store: Arc<dyn TokenStore>,
	/// Classifier deciding which responses count as authorization failures.
	pub classifier: Arc<dyn ResponseClassifier>,
	/// Base URL, timeout, default headers, and auth endpoint paths.
	pub config: GatewayConfig,
	/// Shared counters for the refresh protocol.
	pub metrics: Arc<GatewayMetrics>,
	listeners: Arc<RwLock<Vec<Arc<dyn SessionListener>>>>,
	flight: Arc<Mutex<queue::Flight>>,
}
impl<T> Gateway<T>
where
	T: ?Sized + Transport,
{
	/// Creates a gateway over the caller-provided transport.
	pub fn with_transport(
		config: GatewayConfig,
		store: Arc<dyn TokenStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			classifier: Arc::new(DefaultResponseClassifier),
			config,
			metrics: Default::default(),
			listeners: Default::default(),
			flight: Default::default(),
		}
	}

	/// Replaces the response classifier.
	pub fn with_classifier(mut self, classifier: Arc<dyn ResponseClassifier>) -> Self {
		self.classifier = classifier;

		self
	}

	/// Registers a listener notified when a failed refresh terminates the session.
	pub fn with_session_listener(self, listener: impl 'static + SessionListener) -> Self {
		self.listeners.write().push(Arc::new(listener));

		self
	}

	/// Returns `true` while a token refresh is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.flight.lock().is_refreshing()
	}

	/// Number of callers currently parked behind the in-flight refresh.
	pub fn queued_len(&self) -> usize {
		self.flight.lock().queued_len()
	}

	/// Sends a request with the stored access token.
	///
	/// Successful responses are returned unchanged. An authorization failure on a request that
	/// has not been retried yet joins (or starts) the single in-flight refresh and is replayed
	/// once with the refreshed token; any other failure is returned as is.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const OP: GatewayOp = GatewayOp::Send;

		let span = OpSpan::new(OP, "send");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span.instrument(self.send_inner(request)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(OP, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(OP, OpOutcome::Failure),
		}

		result
	}

	/// `GET`s `path` and decodes the JSON body.
	pub async fn get_json<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send(ApiRequest::get(path)).await?.json()
	}

	/// `POST`s `body` as JSON and decodes the JSON response.
	pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		let request = ApiRequest::post(path).json(body)?;

		self.send(request).await?.json()
	}

	/// `PUT`s `body` as JSON and decodes the JSON response.
	pub async fn put_json<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		let request = ApiRequest::put(path).json(body)?;

		self.send(request).await?.json()
	}

	/// `PATCH`es `body` as JSON and decodes the JSON response.
	pub async fn patch_json<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		let request = ApiRequest::patch(path).json(body)?;

		self.send(request).await?.json()
	}

	/// `DELETE`s `path`, returning the raw response.
	pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
		self.send(ApiRequest::delete(path)).await
	}

	/// `POST`s `form` as `multipart/form-data` and decodes the JSON response.
	///
	/// The form is encoded once up front, so a replay after a token refresh sends the same bytes.
	pub async fn upload_file<R>(&self, path: &str, form: &MultipartForm) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send(ApiRequest::post(path).multipart(form)).await?.json()
	}

	async fn send_inner(&self, request: ApiRequest) -> Result<ApiResponse> {
		let access = self.access_token().await?;

		match self.exchange(&request, access.as_ref()).await? {
			Exchange::Complete(response) => Ok(response),
			Exchange::Unauthorized(response) if request.is_retry() =>
				Err(self.retry_rejected(&response).into()),
			Exchange::Unauthorized(_) => self.recover(request.into_retry()).await,
		}
	}

	/// Issues `request` once and classifies the response.
	async fn exchange(
		&self,
		request: &ApiRequest,
		access: Option<&TokenSecret>,
	) -> Result<Exchange> {
		let response = self.dispatch(request, access).await?;

		match self.classifier.classify(&response) {
			ResponseClass::Success => Ok(Exchange::Complete(response)),
			ResponseClass::AuthorizationFailure => Ok(Exchange::Unauthorized(response)),
			ResponseClass::Failure => Err(self.server_error(&response).into()),
		}
	}

	/// Resolves the URL, merges headers, and hands the request to the transport.
	///
	/// Header precedence is defaults, then request headers, then the bearer token (when one is
	/// supplied).
	pub(crate) async fn dispatch(
		&self,
		request: &ApiRequest,
		access: Option<&TokenSecret>,
	) -> Result<ApiResponse> {
		let url = self.config.resolve(&request.path, &request.query)?;
		let mut headers = self.config.default_headers.clone();

		headers.extend(request.headers.iter().map(|(name, value)| (name.clone(), value.clone())));

		if let Some(access) = access {
			headers.insert("authorization".into(), access.bearer());
		}

		let outbound =
			OutboundRequest { method: request.method, url, headers, body: request.body.clone() };

		self.transport
			.issue(outbound)
			.await
			.map_err(|source| NetworkError::new(request.path.as_str(), source).into())
	}

	async fn access_token(&self) -> Result<Option<TokenSecret>> {
		Ok(self.store.fetch().await?.map(|credential| credential.access_token))
	}

	fn server_error(&self, response: &ApiResponse) -> ServerError {
		ServerError::from_details(
			response.status,
			self.classifier.describe_failure(response),
			response.retry_after(),
		)
	}

	fn retry_rejected(&self, response: &ApiResponse) -> AuthError {
		AuthError::retry_rejected(response.status, self.classifier.describe_failure(response))
	}

	fn notify_session_terminated(&self, error: &AuthError) {
		let _span = OpSpan::new(GatewayOp::Refresh, "notify_session_terminated").entered();
		let event = SessionTerminated { error: error.clone(), at: OffsetDateTime::now_utc() };
		let listeners = self.listeners.read().clone();

		self.metrics.record_session_termination();

		for listener in listeners {
			listener.on_session_terminated(&event);
		}
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway backed by a reqwest client honoring the configured timeout.
	pub fn new(config: GatewayConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(ConfigError::from)?;
		let transport = ReqwestTransport::with_client(client).with_timeout(config.timeout);

		Ok(Self::with_transport(config, store, transport))
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			classifier: self.classifier.clone(),
			config: self.config.clone(),
			metrics: self.metrics.clone(),
			listeners: self.listeners.clone(),
			flight: self.flight.clone(),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("metrics", &self.metrics)
			.field("listeners", &self.listeners.read().len())
			.field("flight", &*self.flight.lock())
			.finish()
	}
}

enum Exchange {
	Complete(ApiResponse),
	Unauthorized(ApiResponse),
}
