//! Internal session tokens: HS256-signed access and refresh JWTs.

// crates.io
use jsonwebtoken::{
	Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
// self
use crate::{
	_prelude::*,
	auth::{SessionId, UserId},
	config::SigningSecret,
};

/// Access-token lifetime.
pub const ACCESS_TTL: Duration = Duration::minutes(15);
/// Refresh-token lifetime.
pub const REFRESH_TTL: Duration = Duration::days(30);

/// Which of the two internal token kinds a JWT claims to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
	/// Short-lived token presented on API calls.
	Access,
	/// Long-lived token redeemable for new access tokens.
	Refresh,
}
impl TokenUse {
	/// Claim value for this token kind.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Access => "access",
			Self::Refresh => "refresh",
		}
	}
}

/// Claims carried by internal session tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
	/// Local user id.
	pub sub: UserId,
	/// Session id, shared by the access/refresh pair.
	pub sid: SessionId,
	/// Token kind; checked so a refresh token can never pass as an access token.
	pub typ: TokenUse,
	/// Issued-at, seconds since the epoch.
	pub iat: i64,
	/// Expiry, seconds since the epoch.
	pub exp: i64,
}

/// Internal session-token failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SessionTokenError {
	/// The token's signature is valid but it has expired.
	#[error("Session token has expired.")]
	Expired,
	/// The token is malformed or its signature does not verify.
	#[error("Session token is invalid.")]
	Invalid,
	/// The token verifies but is of the other kind.
	#[error("Session token is not a(n) {} token.", expected.as_str())]
	WrongUse {
		/// Kind the caller required.
		expected: TokenUse,
	},
	/// Token signing failed.
	#[error("Session token could not be signed.")]
	Signing,
}

/// Signs and verifies the internal access/refresh token pair.
#[derive(Clone)]
pub struct SessionIssuer {
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
}
impl SessionIssuer {
	/// Derives signing material from the configured secret.
	pub fn new(secret: &SigningSecret) -> Self {
		Self {
			encoding_key: EncodingKey::from_secret(secret.expose()),
			decoding_key: DecodingKey::from_secret(secret.expose()),
		}
	}

	/// Signs a fresh access token for `(user, session)`.
	pub fn sign_access(
		&self,
		user: &UserId,
		session: &SessionId,
	) -> Result<String, SessionTokenError> {
		self.sign(user, session, TokenUse::Access, ACCESS_TTL)
	}

	/// Signs a fresh refresh token for `(user, session)`.
	pub fn sign_refresh(
		&self,
		user: &UserId,
		session: &SessionId,
	) -> Result<String, SessionTokenError> {
		self.sign(user, session, TokenUse::Refresh, REFRESH_TTL)
	}

	/// Verifies signature, expiry, and token kind, returning the embedded claims.
	pub fn verify(
		&self,
		token: &str,
		expected: TokenUse,
	) -> Result<SessionClaims, SessionTokenError> {
		let mut validation = Validation::new(Algorithm::HS256);

		validation.validate_aud = false;

		let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
			.map_err(|e| match e.kind() {
				ErrorKind::ExpiredSignature => SessionTokenError::Expired,
				_ => SessionTokenError::Invalid,
			})?
			.claims;

		if claims.typ != expected {
			return Err(SessionTokenError::WrongUse { expected });
		}

		Ok(claims)
	}

	fn sign(
		&self,
		user: &UserId,
		session: &SessionId,
		typ: TokenUse,
		ttl: Duration,
	) -> Result<String, SessionTokenError> {
		let now = OffsetDateTime::now_utc();
		let claims = SessionClaims {
			sub: user.clone(),
			sid: session.clone(),
			typ,
			iat: now.unix_timestamp(),
			exp: (now + ttl).unix_timestamp(),
		};

		encode(&Header::default(), &claims, &self.encoding_key)
			.map_err(|_| SessionTokenError::Signing)
	}
}
impl Debug for SessionIssuer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionIssuer").finish_non_exhaustive()
	}
}
