//! Crate-level error types shared across flows, verification, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical handoff error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Authentication failure in one of the single-use or session vaults.
	#[error(transparent)]
	Denied(#[from] DeniedError),
	/// User directory (upsert) failure.
	#[error(transparent)]
	Directory(#[from] DirectoryError),
	/// Internal session-token failure.
	#[error(transparent)]
	Session(#[from] crate::session::SessionTokenError),
	/// Temporary upstream failure.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Identity-token verification failure.
	#[error(transparent)]
	Verify(#[from] VerifyError),

	/// A required request parameter was absent or empty.
	#[error("Request is missing the required `{name}` parameter.")]
	MissingParameter {
		/// Parameter name expected by the flow.
		name: &'static str,
	},
	/// Provider rejected the authorization-code exchange.
	#[error("Token endpoint rejected the code exchange: {reason}.")]
	ExchangeRejected {
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
}
impl From<crate::provider::ProviderDescriptorError> for Error {
	fn from(e: crate::provider::ProviderDescriptorError) -> Self {
		Self::Config(ConfigError::Descriptor(e))
	}
}

/// Configuration and validation failures raised by the handoff.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Provider client id was not supplied.
	#[error("Provider client id is missing.")]
	MissingClientId,
	/// Redirect URI was not supplied.
	#[error("Provider redirect URI is missing.")]
	MissingRedirectUri,
	/// Deep-link target was not supplied.
	#[error("Deep-link target is missing.")]
	MissingDeepLink,
	/// Signing secret was not supplied in a production deployment.
	#[error("Internal signing secret is required outside development mode.")]
	MissingSigningSecret,
	/// Signing secret is below the minimum length.
	#[error("Internal signing secret must be at least {min} bytes.")]
	WeakSigningSecret {
		/// Minimum permitted secret length in bytes.
		min: usize,
	},
	/// Deep-link target failed validation.
	#[error("Deep-link target is invalid: {reason}.")]
	InvalidDeepLink {
		/// Which deep-link rule failed.
		reason: &'static str,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Provider endpoint URL was rejected by the OAuth client.
	#[error("Provider endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},

	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Token endpoint response omitted the identity token.
	#[error("Token endpoint response is missing id_token.")]
	MissingIdToken,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Replay and single-use vault failures; authentication errors, not system errors.
///
/// Each of these consumes the offending record where one exists, so a repeated attempt with the
/// same stale value keeps failing identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum DeniedError {
	/// No pending login matches the returned `state` value.
	#[error("Authorization state was not found.")]
	StateNotFound,
	/// The pending login outlived its time-to-live before the callback arrived.
	#[error("Authorization state has expired.")]
	StateExpired,
	/// No one-time token matches the presented value.
	#[error("One-time token is invalid.")]
	InvalidOtt,
	/// The one-time token outlived its time-to-live before `finish` consumed it.
	#[error("One-time token has expired.")]
	OttExpired,
	/// The refresh token is not tracked by the refresh vault.
	#[error("Refresh token is not recognized.")]
	InvalidRefresh,
	/// The refresh token failed signature or expiry verification.
	#[error("Refresh token has expired.")]
	RefreshExpired,
}

/// Identity-token verification failures; treated as potential attacks or misconfiguration.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum VerifyError {
	/// Token is not structurally decodable (header + payload).
	#[error("Identity token is malformed.")]
	InvalidToken,
	/// Token `aud` does not match the configured client id.
	#[error("Identity token audience does not match the configured client id.")]
	AudienceMismatch,
	/// Token `iss` is not one of the provider's canonical issuer strings.
	#[error("Identity token issuer is not recognized.")]
	IssuerMismatch,
	/// Token `exp` is more than the permitted clock skew in the past.
	#[error("Identity token has expired.")]
	TokenExpired,
	/// Signature verification against the resolved provider key failed.
	#[error("Identity token signature verification failed.")]
	SignatureInvalid,
	/// The provider's current key set does not contain the requested key id.
	#[error("Signing key `{kid}` was not found in the provider key set.")]
	KeyNotFound {
		/// Key id requested by the token header.
		kid: String,
	},
	/// The provider key exists but its RSA components could not be imported.
	#[error("Signing key `{kid}` contains invalid key material.")]
	MalformedKey {
		/// Key id of the unusable key.
		kid: String,
	},
}

/// User directory failures surfaced by [`UserDirectory`](crate::directory::UserDirectory).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DirectoryError {
	/// Backend-level failure during the upsert.
	#[error("User upsert failed: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Temporary upstream failure variants.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or crate-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Key-set endpoint returned a failure or an undecodable body.
	#[error("Key-set endpoint returned an unexpected response: {message}.")]
	KeySetFetch {
		/// Human-readable error payload.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn denied_errors_read_as_authentication_failures() {
		assert_eq!(DeniedError::StateNotFound.to_string(), "Authorization state was not found.");
		assert_eq!(DeniedError::InvalidOtt.to_string(), "One-time token is invalid.");
		assert!(matches!(Error::from(DeniedError::OttExpired), Error::Denied(_)));
	}

	#[test]
	fn verify_errors_never_embed_token_material() {
		let err = VerifyError::KeyNotFound { kid: "kid-1".into() };

		assert_eq!(err.to_string(), "Signing key `kid-1` was not found in the provider key set.");
		assert!(matches!(Error::from(err), Error::Verify(_)));
	}
}
