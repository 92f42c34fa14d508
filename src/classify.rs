//! Response classification hooks.
//!
//! The gateway never inspects status codes directly; it asks a [`ResponseClassifier`] whether a
//! response succeeded, failed authorization (and may be recovered by a token refresh), or failed
//! for any other reason. Implementations work on crate-owned [`ApiResponse`] values so they stay
//! independent of the transport in use.

// self
use crate::{_prelude::*, http::ApiResponse};

/// How the gateway should treat a received response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseClass {
	/// Return the response to the caller unchanged.
	Success,
	/// Credentials were rejected; the refresh protocol may recover the call.
	AuthorizationFailure,
	/// Any other failure; surfaced to the caller as a server error.
	Failure,
}

/// Error fields extracted from a failed response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureDetails {
	/// API error code, or `HTTP_<status>`.
	pub code: String,
	/// API error message, or `HTTP <status> Error`.
	pub message: String,
	/// JSON error body, when the API returned an object.
	pub details: Option<serde_json::Value>,
}
impl FailureDetails {
	/// Fallback details used when the body carries nothing useful.
	pub fn for_status(status: u16) -> Self {
		Self {
			code: format!("HTTP_{status}"),
			message: format!("HTTP {status} Error"),
			details: None,
		}
	}
}

/// Strategy hook deciding how responses are classified.
///
/// Override [`ResponseClassifier::describe_failure`] only when the API reports errors in a
/// shape other than `{ "message": .., "code": .. }`.
pub trait ResponseClassifier: Send + Sync {
	/// Classifies a received response.
	fn classify(&self, response: &ApiResponse) -> ResponseClass;

	/// Extracts error fields from a failed response.
	fn describe_failure(&self, response: &ApiResponse) -> FailureDetails {
		let mut details = FailureDetails::for_status(response.status);
		let Ok(body) = serde_json::from_slice::<serde_json::Value>(&response.body) else {
			return details;
		};
		let Some(object) = body.as_object() else {
			return details;
		};

		if let Some(message) = object.get("message").and_then(serde_json::Value::as_str) {
			details.message = message.to_owned();
		}
		if let Some(code) = object.get("code").and_then(serde_json::Value::as_str) {
			details.code = code.to_owned();
		}

		details.details = Some(body);

		details
	}
}

/// Classifier used when callers do not supply one: 2xx succeed, 401 fails authorization, and
/// everything else is a plain failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultResponseClassifier;
impl ResponseClassifier for DefaultResponseClassifier {
	fn classify(&self, response: &ApiResponse) -> ResponseClass {
		match response.status {
			200..=299 => ResponseClass::Success,
			401 => ResponseClass::AuthorizationFailure,
			_ => ResponseClass::Failure,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_classifier_only_treats_401_as_authorization_failure() {
		let classifier = DefaultResponseClassifier;

		assert_eq!(classifier.classify(&ApiResponse::new(204)), ResponseClass::Success);
		assert_eq!(
			classifier.classify(&ApiResponse::new(401)),
			ResponseClass::AuthorizationFailure
		);
		assert_eq!(classifier.classify(&ApiResponse::new(403)), ResponseClass::Failure);
		assert_eq!(classifier.classify(&ApiResponse::new(500)), ResponseClass::Failure);
	}

	#[test]
	fn failure_details_prefer_body_fields() {
		let response = ApiResponse::new(422).with_json(&serde_json::json!({
			"message": "Email already taken",
			"code": "VALIDATION_ERROR",
			"field": "email",
		}));
		let details = DefaultResponseClassifier.describe_failure(&response);

		assert_eq!(details.code, "VALIDATION_ERROR");
		assert_eq!(details.message, "Email already taken");
		assert_eq!(
			details.details.as_ref().and_then(|body| body.get("field")),
			Some(&serde_json::json!("email"))
		);
	}

	#[test]
	fn failure_details_fall_back_to_status() {
		let response = ApiResponse::new(502).with_body("Bad Gateway");
		let details = DefaultResponseClassifier.describe_failure(&response);

		assert_eq!(details, FailureDetails::for_status(502));
		assert_eq!(details.code, "HTTP_502");
		assert_eq!(details.message, "HTTP 502 Error");
	}
}
