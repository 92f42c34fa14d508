//! Account payloads exchanged with the authentication endpoints.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Role granted to an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
	/// Full administrative access.
	Admin,
	/// Team management access.
	Manager,
	/// Regular account.
	User,
}

/// Authenticated account profile returned by login and the current-user endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// Account identifier.
	pub id: String,
	/// Login e-mail address.
	pub email: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Granted role.
	pub role: UserRole,
	/// Avatar URL, if any.
	#[serde(default)]
	pub avatar: Option<String>,
	/// Whether the account may sign in.
	pub is_active: bool,
	/// Creation timestamp as reported by the API.
	pub created_at: String,
	/// Last update timestamp as reported by the API.
	pub updated_at: String,
}
impl User {
	/// `first_name last_name`, trimmed.
	pub fn display_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name).trim().to_owned()
	}
}

/// Login form submitted to the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
	/// Login e-mail address.
	pub email: String,
	/// Account password.
	pub password: String,
	/// Requests a longer-lived refresh token.
	#[serde(default)]
	pub remember_me: bool,
}
impl LoginCredentials {
	/// Creates a login form without "remember me".
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into(), remember_me: false }
	}

	/// Sets the "remember me" flag.
	pub fn remember_me(mut self, remember_me: bool) -> Self {
		self.remember_me = remember_me;

		self
	}
}
impl Debug for LoginCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginCredentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("remember_me", &self.remember_me)
			.finish()
	}
}

/// Successful login response body.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginGrant {
	pub(crate) user: User,
	pub(crate) token: TokenSecret,
	pub(crate) refresh_token: TokenSecret,
}
