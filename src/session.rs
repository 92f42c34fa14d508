//! Session lifecycle on top of the gateway: login, logout, current user, and restore, plus the
//! password and e-mail verification flows of the account API.
//!
//! Login and logout talk to the authentication endpoints directly and never enter the refresh
//! protocol: a rejected login is an ordinary server error, and logout clears the stored
//! credential before it notifies the API, so a failing notification can never keep a session
//! alive.

pub mod account;

pub use account::*;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::{AuthError, ServerError},
	gateway::Gateway,
	http::{ApiRequest, Transport},
	obs::{self, GatewayOp, OpOutcome, OpSpan},
};

/// Receives the session-terminated signal raised after a failed refresh.
///
/// The gateway calls every registered listener exactly once per failed refresh cycle, after
/// the stored credential has been cleared and every parked caller has been rejected.
pub trait SessionListener: Send + Sync {
	/// Handles the termination event.
	fn on_session_terminated(&self, event: &SessionTerminated);
}
impl<F> SessionListener for F
where
	F: Fn(&SessionTerminated) + Send + Sync,
{
	fn on_session_terminated(&self, event: &SessionTerminated) {
		self(event)
	}
}

/// Emitted when a failed refresh ends the session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionTerminated {
	/// Failure that every pending caller was rejected with.
	pub error: AuthError,
	/// Instant the session was terminated.
	pub at: OffsetDateTime,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutBody<'a> {
	refresh_token: &'a str,
}

#[derive(Serialize)]
struct ForgotPasswordBody<'a> {
	email: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordBody<'a> {
	token: &'a str,
	password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordBody<'a> {
	current_password: &'a str,
	new_password: &'a str,
}

#[derive(Serialize)]
struct VerifyEmailBody<'a> {
	token: &'a str,
}

impl<T> Gateway<T>
where
	T: ?Sized + Transport,
{
	/// Signs in and stores the issued credential.
	pub async fn login(&self, credentials: &LoginCredentials) -> Result<User> {
		const OP: GatewayOp = GatewayOp::Login;

		let span = OpSpan::new(OP, "login");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request =
					ApiRequest::post(self.config.endpoints.login.as_str()).json(credentials)?;
				let response = self.dispatch(&request, None).await?;

				if !response.is_success() {
					return Err(ServerError::from_details(
						response.status,
						self.classifier.describe_failure(&response),
						response.retry_after(),
					)
					.into());
				}

				let grant = response.json::<LoginGrant>()?;
				let credential = Credential {
					access_token: grant.token,
					refresh_token: grant.refresh_token,
					issued_at: OffsetDateTime::now_utc(),
					refreshed_at: None,
				};

				self.store.save(credential).await?;

				Ok(grant.user)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(OP, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(OP, OpOutcome::Failure),
		}

		result
	}

	/// Clears the stored credential, then notifies the API on a best-effort basis.
	///
	/// Only a store failure is reported; a failing logout call is logged and ignored.
	pub async fn logout(&self) -> Result<()> {
		const OP: GatewayOp = GatewayOp::Logout;

		let span = OpSpan::new(OP, "logout");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let Some(previous) = self.store.clear().await? else {
					return Ok(());
				};
				let request = ApiRequest::post(self.config.endpoints.logout.as_str())
					.json(&LogoutBody { refresh_token: previous.refresh_token.expose() })?;
				let notified = match self.dispatch(&request, Some(&previous.access_token)).await {
					Ok(response) if !response.is_success() => Err(ServerError::from_details(
						response.status,
						self.classifier.describe_failure(&response),
						None,
					)
					.into()),
					other => other.map(drop),
				};

				if let Err(e) = notified {
					obs::warn_swallowed(OP, &e);
				}

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(OP, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(OP, OpOutcome::Failure),
		}

		result
	}

	/// Fetches the authenticated user through the gateway (refreshing if needed).
	pub async fn current_user(&self) -> Result<User> {
		self.get_json(self.config.endpoints.me.as_str()).await
	}

	/// Validates a stored credential on start-up.
	///
	/// Returns the user when the stored session is still usable. Any gateway failure clears the
	/// store and yields `None`; only store failures are returned as errors.
	pub async fn restore(&self) -> Result<Option<User>> {
		if self.store.fetch().await?.is_none() {
			return Ok(None);
		}

		match self.current_user().await {
			Ok(user) => Ok(Some(user)),
			Err(e) => {
				obs::warn_swallowed(GatewayOp::Send, &e);
				self.store.clear().await?;

				Ok(None)
			},
		}
	}

	/// Returns `true` when a credential is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.store.fetch().await?.is_some())
	}

	/// Asks the API to e-mail a password-reset link to `email`.
	pub async fn forgot_password(&self, email: &str) -> Result<()> {
		let request = ApiRequest::post(self.config.endpoints.forgot_password.as_str())
			.json(&ForgotPasswordBody { email })?;

		self.send(request).await.map(drop)
	}

	/// Completes a password reset with the token from the reset e-mail.
	pub async fn reset_password(&self, token: &str, password: &str) -> Result<()> {
		let request = ApiRequest::post(self.config.endpoints.reset_password.as_str())
			.json(&ResetPasswordBody { token, password })?;

		self.send(request).await.map(drop)
	}

	/// Changes the signed-in account's password.
	///
	/// Runs through the refresh protocol like any authenticated call.
	pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<()> {
		let request = ApiRequest::post(self.config.endpoints.change_password.as_str())
			.json(&ChangePasswordBody { current_password, new_password })?;

		self.send(request).await.map(drop)
	}

	/// Confirms an e-mail address with the token from the verification e-mail.
	pub async fn verify_email(&self, token: &str) -> Result<()> {
		let request = ApiRequest::post(self.config.endpoints.verify_email.as_str())
			.json(&VerifyEmailBody { token })?;

		self.send(request).await.map(drop)
	}

	/// Asks the API to send the verification e-mail again.
	pub async fn resend_verification_email(&self) -> Result<()> {
		self.send(ApiRequest::post(self.config.endpoints.resend_verification.as_str()))
			.await
			.map(drop)
	}
}
