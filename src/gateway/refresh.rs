//! Single-flight token refresh and replay of the requests parked behind it.
//!
//! The first caller to observe an authorization failure while the gateway is idle becomes the
//! refresher. It calls the refresh endpoint, rotates the stored credential through
//! [`TokenStore::rotate`](crate::store::TokenStore::rotate), and hands the new token to every
//! parked caller in arrival order. Each caller then replays its own request on its own task,
//! the refresher first. A failed refresh rejects every parked caller with the same
//! [`AuthError`], clears the credential it tried to refresh, and notifies the session listeners
//! once.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	error::{AuthError, AuthErrorKind},
	gateway::{
		Exchange, Gateway,
		queue::{self, Admission, RefreshGuard},
	},
	http::{ApiRequest, ApiResponse, Transport},
	obs::{self, GatewayOp, OpOutcome, OpSpan},
	store::CompareAndSwapOutcome,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
	refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshGrant {
	token: TokenSecret,
	#[serde(default)]
	refresh_token: Option<TokenSecret>,
}

/// What a failed refresh means for the stored session.
enum FailedRefresh {
	/// The credential that failed was cleared; listeners must be told.
	Terminated(AuthError),
	/// The session already ended elsewhere (logout); callers are rejected quietly.
	Rejected(AuthError),
	/// A login completed while the refresh was in flight; its access token is used instead.
	Superseded(TokenSecret),
}

impl<T> Gateway<T>
where
	T: ?Sized + Transport,
{
	/// Refreshes the access token, joining the in-flight refresh when there is one.
	///
	/// Callers that refresh proactively (for example when
	/// [`Credential::is_access_expired_at`] reports an expired token) go through the same
	/// single-flight protocol as requests that failed authorization, so the refresh endpoint is
	/// never called twice concurrently.
	pub async fn refresh_session(&self) -> Result<TokenSecret> {
		match queue::admit(&self.flight, &self.metrics) {
			Admission::Lead(guard) => Ok(self.lead_refresh(guard).await?),
			Admission::Wait(handle) => match handle.wait().await {
				Some(delivered) => Ok(delivered?),
				// The refresher was dropped mid-refresh; fall back to whatever is stored now.
				None => Ok(self.access_token().await?.ok_or_else(AuthError::refresh_interrupted)?),
			},
		}
	}

	/// Recovers a request that failed authorization; `request` is already marked as retried.
	///
	/// The request is replayed exactly once, by its own caller, with the token the refresh
	/// produced.
	pub(crate) async fn recover(&self, request: ApiRequest) -> Result<ApiResponse> {
		let token = self.refresh_session().await?;

		self.replay(&request, &token).await
	}

	/// Runs the refresh as the refresher, then settles the flight.
	///
	/// Every parked caller receives the same outcome, in arrival order. Listeners are notified
	/// only after all of them have been resolved.
	async fn lead_refresh(&self, guard: RefreshGuard) -> Result<TokenSecret, AuthError> {
		const OP: GatewayOp = GatewayOp::Refresh;

		let span = OpSpan::new(OP, "lead_refresh");

		obs::record_op_outcome(OP, OpOutcome::Attempt);
		self.metrics.record_refresh_attempt();

		let (sent, outcome) = span.instrument(self.run_refresh()).await;
		let (outcome, terminated) = match outcome {
			Ok(token) => {
				self.metrics.record_refresh_success();
				obs::record_op_outcome(OP, OpOutcome::Success);

				(Ok(token), false)
			},
			Err(err) => {
				self.metrics.record_refresh_failure();
				obs::record_op_outcome(OP, OpOutcome::Failure);

				match span.instrument(self.settle_failure(sent.as_deref(), err)).await {
					FailedRefresh::Terminated(err) => (Err(err), true),
					FailedRefresh::Rejected(err) => (Err(err), false),
					FailedRefresh::Superseded(token) => (Ok(token), false),
				}
			},
		};

		for pending in guard.settle() {
			let _ = pending.continuation.send(outcome.clone());
		}

		if let (true, Err(err)) = (terminated, &outcome) {
			self.notify_session_terminated(err);
		}

		outcome
	}

	/// Calls the refresh endpoint and rotates the stored credential.
	///
	/// Also returns the refresh token that was sent, so a failure can be matched against the
	/// credential stored by the time it arrives.
	async fn run_refresh(&self) -> (Option<String>, Result<TokenSecret, AuthError>) {
		let current = match self.store.fetch().await {
			Ok(current) =>
				current.filter(|credential| !credential.refresh_token.expose().is_empty()),
			Err(e) => return (None, Err(e.into())),
		};
		let Some(current) = current else {
			return (None, Err(AuthError::missing_refresh_token()));
		};
		let sent = current.refresh_token.expose().to_owned();
		let outcome = self.exchange_refresh(&current, &sent).await;

		(Some(sent), outcome)
	}

	async fn exchange_refresh(
		&self,
		current: &Credential,
		sent: &str,
	) -> Result<TokenSecret, AuthError> {
		let request = ApiRequest::post(self.config.endpoints.refresh.as_str())
			.json(&RefreshBody { refresh_token: sent })
			.map_err(AuthError::refresh_failed)?;
		let response = self.dispatch(&request, None).await.map_err(AuthError::refresh_failed)?;

		if !response.is_success() {
			return Err(AuthError::refresh_rejected(
				response.status,
				&self.classifier.describe_failure(&response),
			));
		}

		let grant = response.json::<RefreshGrant>().map_err(AuthError::refresh_failed)?;
		let replacement =
			current.refreshed(grant.token, grant.refresh_token, OffsetDateTime::now_utc());
		let access = replacement.access_token.clone();

		match self.store.rotate(sent, replacement).await? {
			CompareAndSwapOutcome::Updated => Ok(access),
			// A newer login replaced the credential; its access token wins.
			CompareAndSwapOutcome::RefreshMismatch => self
				.store
				.fetch()
				.await?
				.map(|credential| credential.access_token)
				.ok_or_else(AuthError::session_cleared),
			CompareAndSwapOutcome::Missing => Err(AuthError::session_cleared()),
		}
	}

	/// Clears the credential that failed to refresh, unless the session moved on meanwhile.
	async fn settle_failure(&self, sent: Option<&str>, err: AuthError) -> FailedRefresh {
		if err.kind == AuthErrorKind::SessionCleared {
			return FailedRefresh::Rejected(err);
		}

		let Some(sent) = sent else {
			// No usable credential was stored, so there is no newer login to keep.
			if let Err(e) = self.store.clear().await {
				obs::warn_swallowed(GatewayOp::Refresh, &e);
			}

			return FailedRefresh::Terminated(err);
		};

		match self.store.clear_if(sent).await {
			Ok(CompareAndSwapOutcome::Updated) => FailedRefresh::Terminated(err),
			Ok(CompareAndSwapOutcome::RefreshMismatch) => match self.store.fetch().await {
				Ok(Some(credential)) => FailedRefresh::Superseded(credential.access_token),
				Ok(None) => FailedRefresh::Rejected(err),
				Err(e) => {
					obs::warn_swallowed(GatewayOp::Refresh, &e);

					FailedRefresh::Rejected(err)
				},
			},
			Ok(CompareAndSwapOutcome::Missing) => FailedRefresh::Rejected(err),
			Err(e) => {
				obs::warn_swallowed(GatewayOp::Refresh, &e);

				FailedRefresh::Terminated(err)
			},
		}
	}

	/// Replays a retried request with the refreshed token.
	async fn replay(&self, request: &ApiRequest, token: &TokenSecret) -> Result<ApiResponse> {
		const OP: GatewayOp = GatewayOp::Replay;

		self.metrics.record_replay();

		let result = match self.exchange(request, Some(token)).await {
			Ok(Exchange::Complete(response)) => Ok(response),
			Ok(Exchange::Unauthorized(response)) => Err(self.retry_rejected(&response).into()),
			Err(e) => Err(e),
		};

		match &result {
			Ok(_) => obs::record_op_outcome(OP, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(OP, OpOutcome::Failure),
		}

		result
	}
}
