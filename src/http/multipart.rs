//! Buffered `multipart/form-data` bodies.
//!
//! Streaming forms cannot be sent twice, but a request that fails authorization is replayed
//! after the token refresh. Forms are therefore encoded into memory up front so the replay
//! carries the same bytes.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

/// One form field.
#[derive(Clone, PartialEq, Eq)]
pub struct FormPart {
	/// Field name.
	pub name: String,
	/// File name reported for file parts.
	pub file_name: Option<String>,
	/// Content type reported for file parts.
	pub content_type: Option<String>,
	/// Raw field value.
	pub data: Vec<u8>,
}
impl Debug for FormPart {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FormPart")
			.field("name", &self.name)
			.field("file_name", &self.file_name)
			.field("content_type", &self.content_type)
			.field("data_len", &self.data.len())
			.finish()
	}
}

/// `multipart/form-data` body under construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartForm {
	boundary: String,
	parts: Vec<FormPart>,
}
impl MultipartForm {
	const BOUNDARY_LEN: usize = 32;

	/// Creates an empty form with a random boundary.
	pub fn new() -> Self {
		let suffix = rand::rng()
			.sample_iter(Alphanumeric)
			.take(Self::BOUNDARY_LEN)
			.map(char::from)
			.collect::<String>();

		Self { boundary: format!("auth-gateway-{suffix}"), parts: Vec::new() }
	}

	/// Adds a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts.push(FormPart {
			name: name.into(),
			file_name: None,
			content_type: None,
			data: value.into().into_bytes(),
		});

		self
	}

	/// Adds a file field.
	pub fn file(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		content_type: impl Into<String>,
		data: impl Into<Vec<u8>>,
	) -> Self {
		self.parts.push(FormPart {
			name: name.into(),
			file_name: Some(file_name.into()),
			content_type: Some(content_type.into()),
			data: data.into(),
		});

		self
	}

	/// Boundary separating the parts.
	pub fn boundary(&self) -> &str {
		&self.boundary
	}

	/// Fields added so far, in order.
	pub fn parts(&self) -> &[FormPart] {
		&self.parts
	}

	/// `Content-Type` header value announcing this form's boundary.
	pub fn content_type(&self) -> String {
		format!("multipart/form-data; boundary={}", self.boundary)
	}

	/// Encodes the form.
	pub fn encode(&self) -> Vec<u8> {
		let mut body = Vec::new();

		for part in &self.parts {
			body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
			body.extend_from_slice(
				format!("Content-Disposition: form-data; name=\"{}\"", escape(&part.name))
					.as_bytes(),
			);

			if let Some(file_name) = &part.file_name {
				body.extend_from_slice(format!("; filename=\"{}\"", escape(file_name)).as_bytes());
			}

			body.extend_from_slice(b"\r\n");

			if let Some(content_type) = &part.content_type {
				body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
			}

			body.extend_from_slice(b"\r\n");
			body.extend_from_slice(&part.data);
			body.extend_from_slice(b"\r\n");
		}

		body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

		body
	}
}
impl Default for MultipartForm {
	fn default() -> Self {
		Self::new()
	}
}

fn escape(value: &str) -> String {
	value.replace('\\', "\\\\").replace('"', "\\\"").replace(['\r', '\n'], " ")
}
