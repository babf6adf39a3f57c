//! High-level login-handoff operations.

pub mod grant;
pub mod login;
pub mod pkce;

pub use grant::*;
pub use login::*;
pub use pkce::*;

// self
use crate::{
	_prelude::*,
	config::HandoffConfig,
	directory::UserDirectory,
	http::ExchangeTransport,
	keys::{KeyResolver, KeySetClient},
	oauth::TransportErrorMapper,
	provider::ProviderDescriptor,
	session::{SessionClaims, SessionIssuer, TokenUse},
	store::HandoffStore,
	verify::IdTokenVerifier,
};
#[cfg(feature = "reqwest")]
use crate::{
	http::ReqwestExchange,
	keys::ReqwestKeySetClient,
	oauth::ReqwestTransportErrorMapper,
};

#[cfg(feature = "reqwest")]
/// Handoff specialized for the crate's default reqwest transport stack.
pub type ReqwestHandoff = Handoff<ReqwestExchange, ReqwestTransportErrorMapper>;

/// Coordinates the login handoff against a single provider.
///
/// The handoff owns the HTTP transport, vault store, user directory, provider descriptor, and
/// internal token issuer so individual operations can focus on flow-specific logic (PKCE
/// handshakes, identity verification, one-time-token minting, session refresh).
#[derive(Clone)]
pub struct Handoff<C, M>
where
	C: ?Sized + ExchangeTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP transport used for every token-endpoint request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Vault store holding pending logins, one-time tokens, and refresh records.
	pub store: Arc<dyn HandoffStore>,
	/// Directory mapping provider identities onto local user records.
	pub directory: Arc<dyn UserDirectory>,
	/// Provider descriptor defining endpoints and issuers.
	pub descriptor: ProviderDescriptor,
	/// Validated handoff configuration.
	pub config: HandoffConfig,
	verifier: IdTokenVerifier,
	issuer: SessionIssuer,
}
impl<C, M> Handoff<C, M>
where
	C: ?Sized + ExchangeTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a handoff that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn HandoffStore>,
		directory: Arc<dyn UserDirectory>,
		key_client: Arc<dyn KeySetClient>,
		descriptor: ProviderDescriptor,
		config: HandoffConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let resolver = KeyResolver::new(key_client, descriptor.endpoints.jwks.clone());
		let verifier = IdTokenVerifier::new(
			resolver,
			config.client_id.clone(),
			descriptor.issuers.clone(),
		);
		let issuer = SessionIssuer::new(&config.signing_secret);

		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			directory,
			descriptor,
			config,
			verifier,
			issuer,
		}
	}

	/// Verifies an internal access token presented on an API call.
	pub fn verify_access(&self, token: &str) -> Result<SessionClaims> {
		Ok(self.issuer.verify(token, TokenUse::Access)?)
	}

	pub(crate) fn verifier(&self) -> &IdTokenVerifier {
		&self.verifier
	}

	pub(crate) fn issuer(&self) -> &SessionIssuer {
		&self.issuer
	}
}
#[cfg(feature = "reqwest")]
impl Handoff<ReqwestExchange, ReqwestTransportErrorMapper> {
	/// Creates a handoff with its own reqwest-backed transport and key-set client.
	pub fn new(
		store: Arc<dyn HandoffStore>,
		directory: Arc<dyn UserDirectory>,
		descriptor: ProviderDescriptor,
		config: HandoffConfig,
	) -> Self {
		Self::with_http_client(
			store,
			directory,
			Arc::new(ReqwestKeySetClient::default()),
			descriptor,
			config,
			ReqwestExchange::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for Handoff<C, M>
where
	C: ?Sized + ExchangeTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Handoff")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.config.client_id)
			.field("client_secret_set", &self.config.client_secret.is_some())
			.field("mode", &self.config.mode)
			.finish()
	}
}
