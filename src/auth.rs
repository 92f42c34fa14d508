//! Credential models: redacted secrets, the access/refresh pair, and access-token claims.

pub mod claims;
pub mod credential;
pub mod secret;

pub use claims::*;
pub use credential::*;
pub use secret::*;
