//! Demonstrates a full session against a mock API: login, a request whose access token has
//! expired, the transparent refresh and replay, and logout.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use auth_gateway::{
	config::GatewayConfig,
	gateway::ReqwestGateway,
	session::LoginCredentials,
	store::{MemoryStore, TokenStore},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let user = json!({
		"id": "u-1",
		"email": "demo@example.com",
		"firstName": "Demo",
		"lastName": "User",
		"role": "user",
		"isActive": true,
		"createdAt": "2025-01-01T00:00:00Z",
		"updatedAt": "2025-01-01T00:00:00Z",
	});
	let user_for_login = user.clone();
	let _login = server
		.mock_async(move |when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200).json_body(json!({
				"user": user_for_login,
				"token": "demo-access-1",
				"refreshToken": "demo-refresh",
			}));
		})
		.await;
	let _expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/reports").header("authorization", "Bearer demo-access-1");
			then.status(401)
				.json_body(json!({ "message": "Token expired", "code": "TOKEN_EXPIRED" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).json_body(json!({ "token": "demo-access-2" }));
		})
		.await;
	let _reports = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/reports").header("authorization", "Bearer demo-access-2");
			then.status(200).json_body(json!({ "data": [{ "id": "r-1" }, { "id": "r-2" }] }));
		})
		.await;
	let _logout = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/logout");
			then.status(204);
		})
		.await;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let config = GatewayConfig::builder(Url::parse(&server.url("/api"))?).build()?;
	let gateway = ReqwestGateway::new(config, store)?.with_session_listener(
		|event: &auth_gateway::session::SessionTerminated| {
			eprintln!("Session terminated: {}.", event.error);
		},
	);
	let signed_in = gateway.login(&LoginCredentials::new("demo@example.com", "demo")).await?;

	println!("Signed in as {}.", signed_in.display_name());

	let reports = gateway.get_json::<serde_json::Value>("/reports").await?;

	println!("Fetched reports after refresh: {reports}.");

	refresh.assert_async().await;
	gateway.logout().await?;

	println!("Signed out; authenticated = {}.", gateway.is_authenticated().await?);

	Ok(())
}
