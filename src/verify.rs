//! Provider identity-token verification.
//!
//! Checks run cheapest-first: structural decode, audience, issuer, expiry, then key resolution
//! and the RSA signature. Key fetches only happen for tokens that already passed every local
//! check.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, Validation, decode, decode_header, errors::ErrorKind};
// self
use crate::{_prelude::*, auth::VerifiedClaims, error::VerifyError, keys::KeyResolver};

/// Accepted clock skew when checking identity-token expiry.
pub const CLOCK_SKEW: Duration = Duration::seconds(30);

#[derive(Debug, Deserialize)]
struct IdTokenPayload {
	aud: String,
	iss: String,
	exp: i64,
	sub: String,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	picture: Option<String>,
}

/// Verifies provider identity tokens against one provider's audience, issuers, and key set.
#[derive(Clone, Debug)]
pub struct IdTokenVerifier {
	resolver: KeyResolver,
	audience: String,
	issuers: Vec<String>,
}
impl IdTokenVerifier {
	/// Creates a verifier for the given audience and canonical issuer strings.
	pub fn new(resolver: KeyResolver, audience: String, issuers: Vec<String>) -> Self {
		Self { resolver, audience, issuers }
	}

	/// Fully verifies `id_token` and extracts its identity claims.
	pub async fn verify(&self, id_token: &str) -> Result<VerifiedClaims> {
		let header = decode_header(id_token).map_err(|_| VerifyError::InvalidToken)?;
		let payload = Self::peek_payload(id_token)?;

		if payload.aud != self.audience {
			return Err(VerifyError::AudienceMismatch.into());
		}
		if !self.issuers.contains(&payload.iss) {
			return Err(VerifyError::IssuerMismatch.into());
		}

		let now = OffsetDateTime::now_utc().unix_timestamp();

		if payload.exp.saturating_add(CLOCK_SKEW.whole_seconds()) < now {
			return Err(VerifyError::TokenExpired.into());
		}

		let kid = header.kid.ok_or(VerifyError::InvalidToken)?;
		let key = self.resolver.resolve(&kid).await?;
		let mut validation = Validation::new(Algorithm::RS256);

		validation.set_audience(&[&self.audience]);
		validation.set_issuer(&self.issuers);
		validation.leeway = CLOCK_SKEW.whole_seconds() as u64;

		let verified = decode::<IdTokenPayload>(id_token, &key, &validation)
			.map_err(|e| match e.kind() {
				ErrorKind::ExpiredSignature => VerifyError::TokenExpired,
				ErrorKind::InvalidAudience => VerifyError::AudienceMismatch,
				ErrorKind::InvalidIssuer => VerifyError::IssuerMismatch,
				_ => VerifyError::SignatureInvalid,
			})?
			.claims;
		let expires_at = OffsetDateTime::from_unix_timestamp(verified.exp)
			.map_err(|_| VerifyError::InvalidToken)?;

		Ok(VerifiedClaims {
			subject: verified.sub,
			email: verified.email,
			name: verified.name,
			picture: verified.picture,
			issuer: verified.iss,
			audience: verified.aud,
			expires_at,
		})
	}

	// Decodes the payload segment without verifying the signature. Only used to order the local
	// claim checks ahead of key resolution; nothing is trusted until `decode` passes.
	fn peek_payload(id_token: &str) -> Result<IdTokenPayload, VerifyError> {
		let mut segments = id_token.split('.');
		let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
			(Some(_), Some(payload), Some(_), None) => payload,
			_ => return Err(VerifyError::InvalidToken),
		};
		let raw = URL_SAFE_NO_PAD.decode(payload).map_err(|_| VerifyError::InvalidToken)?;

		serde_json::from_slice(&raw).map_err(|_| VerifyError::InvalidToken)
	}
}
