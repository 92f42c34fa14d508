//! Response values returned by transports and surfaced to callers.

// crates.io
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::DecodeError};

/// Response received from the API.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers, keyed by lowercase name.
	pub headers: BTreeMap<String, String>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates an empty response with the provided status.
	pub fn new(status: u16) -> Self {
		Self { status, ..Default::default() }
	}

	/// Adds a header. Names are stored lowercase.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Sets a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Sets a JSON body and content type.
	pub fn with_json(self, value: &serde_json::Value) -> Self {
		self.with_header("content-type", "application/json").with_body(value.to_string())
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Case-insensitive header lookup.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Parses the `Retry-After` header (delta seconds or an RFC 2822 date).
	pub fn retry_after(&self) -> Option<Duration> {
		let raw = self.header("retry-after")?.trim();

		if let Ok(secs) = raw.parse::<u32>() {
			return Some(Duration::seconds(secs.into()));
		}
		if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
			let delta = moment - OffsetDateTime::now_utc();

			if delta.is_positive() {
				return Some(delta);
			}
		}

		None
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError { source, status: self.status }.into())
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[derive(Debug, Deserialize)]
	struct Page {
		#[allow(dead_code)]
		data: Vec<Row>,
	}

	#[derive(Debug, Deserialize)]
	struct Row {
		#[allow(dead_code)]
		id: String,
	}

	#[test]
	fn retry_after_accepts_delta_seconds() {
		let response = ApiResponse::new(429).with_header("Retry-After", "30");

		assert_eq!(response.retry_after(), Some(Duration::seconds(30)));
		assert_eq!(ApiResponse::new(429).with_header("retry-after", "soon").retry_after(), None);
	}

	#[test]
	fn json_errors_report_the_failing_path() {
		let response = ApiResponse::new(200)
			.with_json(&serde_json::json!({ "data": [{ "id": "1" }, { "id": 2 }] }));
		let err = response.json::<Page>().expect_err("Numeric id should fail to decode.");

		match err {
			Error::Decode(decode) => {
				assert_eq!(decode.status, 200);
				assert_eq!(decode.source.path().to_string(), "data[1].id");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn header_lookup_is_case_insensitive() {
		let response = ApiResponse::new(200).with_header("Content-Type", "application/json");

		assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
		assert!(response.is_success());
		assert!(!ApiResponse::new(401).is_success());
	}
}
