//! Verified identity claims and the local user records they map onto.

// self
use crate::{_prelude::*, auth::UserId};

/// Claim set extracted from a provider identity token after full verification.
///
/// Ephemeral: produced and consumed within one callback invocation, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedClaims {
	/// Provider-scoped subject identifier.
	pub subject: String,
	/// Email address, when the provider shared one.
	pub email: Option<String>,
	/// Display name, when the provider shared one.
	pub name: Option<String>,
	/// Avatar URL, when the provider shared one.
	pub picture: Option<String>,
	/// Issuer string the token was verified against.
	pub issuer: String,
	/// Audience the token was verified against.
	pub audience: String,
	/// Expiry instant carried by the token.
	pub expires_at: OffsetDateTime,
}

/// Profile fields forwarded into the user directory on every login.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Email address, when known.
	pub email: Option<String>,
	/// Display name, when known.
	pub name: Option<String>,
	/// Avatar URL, when known.
	pub picture: Option<String>,
}
impl From<&VerifiedClaims> for UserProfile {
	fn from(claims: &VerifiedClaims) -> Self {
		Self {
			email: claims.email.clone(),
			name: claims.name.clone(),
			picture: claims.picture.clone(),
		}
	}
}

/// Durable local user record returned by the directory upsert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
	/// Durable local identifier, stable across repeat logins.
	pub id: UserId,
	/// Email address, when known.
	pub email: Option<String>,
	/// Display name, when known.
	pub name: Option<String>,
	/// Avatar URL, when known.
	pub picture: Option<String>,
}
impl LocalUser {
	/// Best-effort display name: name, then email, then a fixed fallback.
	pub fn display_name(&self) -> String {
		self.name
			.clone()
			.or_else(|| self.email.clone())
			.unwrap_or_else(|| "User".to_owned())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn display_name_falls_back_through_email() {
		let base = LocalUser {
			id: UserId::new("u1").expect("User fixture should be valid."),
			email: Some("who@example.com".into()),
			name: None,
			picture: None,
		};

		assert_eq!(base.display_name(), "who@example.com");

		let named = LocalUser { name: Some("Who".into()), ..base.clone() };

		assert_eq!(named.display_name(), "Who");

		let anonymous = LocalUser { email: None, ..base };

		assert_eq!(anonymous.display_name(), "User");
	}
}
