//! Shared fixtures for gateway integration tests: a scripted in-process transport that records
//! every call it receives, plus helpers that wire it into a gateway.

#![allow(dead_code)]

// std
use std::{
	collections::BTreeMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use parking_lot::Mutex;
use tokio::sync::Notify;
// self
use auth_gateway::{
	auth::Credential,
	config::GatewayConfig,
	error::TransportError,
	gateway::Gateway,
	http::{ApiResponse, Method, OutboundRequest, Transport, TransportFuture},
	session::SessionTerminated,
	store::{MemoryStore, TokenStore},
	url::Url,
};

pub const BASE_URL: &str = "http://gateway.test/api";
pub const BASE_PATH: &str = "/api";
pub const REFRESH_PATH: &str = "/auth/refresh";

/// One request observed by [`ScriptedTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
	pub method: Method,
	pub path: String,
	pub bearer: Option<String>,
	pub body: Option<serde_json::Value>,
}

/// How the refresh endpoint answers.
#[derive(Clone, Debug)]
pub enum RefreshScript {
	Grant { token: String, refresh_token: Option<String> },
	Reject(u16),
}

/// Fixed answer for one path, overriding the bearer check.
#[derive(Clone, Debug)]
pub enum Override {
	AlwaysUnauthorized,
	Offline,
	Status(u16, serde_json::Value),
}

/// In-process API double.
///
/// Protected paths answer 200 for the valid token and 401 otherwise, after yielding once so that
/// concurrent callers all dispatch before any of them observes a response. The refresh endpoint
/// can be gated so tests decide when an in-flight refresh resolves.
pub struct ScriptedTransport {
	valid_token: String,
	refresh: Mutex<RefreshScript>,
	overrides: Mutex<BTreeMap<String, Override>>,
	gate: Option<Arc<Notify>>,
	calls: Mutex<Vec<Call>>,
}
impl ScriptedTransport {
	pub fn new(valid_token: &str) -> Self {
		Self {
			valid_token: valid_token.into(),
			refresh: Mutex::new(RefreshScript::Grant {
				token: valid_token.into(),
				refresh_token: None,
			}),
			overrides: Default::default(),
			gate: None,
			calls: Default::default(),
		}
	}

	/// Holds refresh responses until [`ScriptedTransport::open_gate`] is called.
	pub fn gated(mut self) -> Self {
		self.gate = Some(Arc::new(Notify::new()));

		self
	}

	pub fn with_refresh(self, script: RefreshScript) -> Self {
		*self.refresh.lock() = script;

		self
	}

	pub fn with_override(self, path: &str, answer: Override) -> Self {
		self.overrides.lock().insert(path.into(), answer);

		self
	}

	pub fn open_gate(&self) {
		if let Some(gate) = &self.gate {
			gate.notify_one();
		}
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	pub fn summaries(&self) -> Vec<(Method, String, Option<String>)> {
		self.calls
			.lock()
			.iter()
			.map(|call| (call.method, call.path.clone(), call.bearer.clone()))
			.collect()
	}

	pub fn refresh_calls(&self) -> usize {
		self.calls.lock().iter().filter(|call| call.path == REFRESH_PATH).count()
	}

	fn unauthorized() -> ApiResponse {
		ApiResponse::new(401)
			.with_json(&serde_json::json!({ "message": "Token expired", "code": "TOKEN_EXPIRED" }))
	}
}
impl Transport for ScriptedTransport {
	fn issue(&self, request: OutboundRequest) -> TransportFuture<'_> {
		let path = request.url.path().trim_start_matches(BASE_PATH).to_owned();
		let bearer = request.bearer().map(str::to_owned);
		let body = request.body.as_deref().and_then(|bytes| serde_json::from_slice(bytes).ok());

		self.calls.lock().push(Call {
			method: request.method,
			path: path.clone(),
			bearer: bearer.clone(),
			body,
		});

		Box::pin(async move {
			if path == REFRESH_PATH {
				if let Some(gate) = &self.gate {
					gate.notified().await;
				}

				let script = self.refresh.lock().clone();

				return Ok(match script {
					RefreshScript::Grant { token, refresh_token } => {
						let mut body = serde_json::json!({ "token": token });

						if let Some(refresh_token) = refresh_token {
							body["refreshToken"] = serde_json::json!(refresh_token);
						}

						ApiResponse::new(200).with_json(&body)
					},
					RefreshScript::Reject(status) =>
						ApiResponse::new(status).with_json(&serde_json::json!({
							"message": "Invalid refresh token",
							"code": "INVALID_TOKEN",
						})),
				});
			}

			tokio::task::yield_now().await;

			let answer = self.overrides.lock().get(&path).cloned();

			match answer {
				Some(Override::AlwaysUnauthorized) => Ok(Self::unauthorized()),
				Some(Override::Offline) => Err(TransportError::network(std::io::Error::new(
					std::io::ErrorKind::ConnectionRefused,
					"connection refused",
				))),
				Some(Override::Status(status, body)) =>
					Ok(ApiResponse::new(status).with_json(&body)),
				None if bearer.as_deref() == Some(self.valid_token.as_str()) =>
					Ok(ApiResponse::new(200).with_json(&serde_json::json!({ "path": path }))),
				None => Ok(Self::unauthorized()),
			}
		})
	}
}

/// Counts session-terminated notifications.
#[derive(Clone, Debug, Default)]
pub struct TerminationCounter(Arc<AtomicUsize>);
impl TerminationCounter {
	pub fn count(&self) -> usize {
		self.0.load(Ordering::SeqCst)
	}

	pub fn listener(&self) -> impl Fn(&SessionTerminated) + Send + Sync + 'static {
		let count = self.0.clone();

		move |_: &SessionTerminated| {
			count.fetch_add(1, Ordering::SeqCst);
		}
	}
}

pub fn config() -> GatewayConfig {
	GatewayConfig::builder(Url::parse(BASE_URL).expect("Base URL fixture should parse."))
		.build()
		.expect("Gateway config fixture should build.")
}

pub fn store_with(access: &str, refresh: &str) -> Arc<MemoryStore> {
	Arc::new(MemoryStore::with_credential(Credential::new(access, refresh)))
}

pub fn gateway(
	transport: &Arc<ScriptedTransport>,
	store: &Arc<MemoryStore>,
	terminations: &TerminationCounter,
) -> Gateway<ScriptedTransport> {
	let store: Arc<dyn TokenStore> = store.clone();

	Gateway::with_transport(config(), store, transport.clone())
		.with_session_listener(terminations.listener())
}
