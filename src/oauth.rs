//! Internal OAuth client facade around the authorization-code exchange.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, ExtraTokenFields, HttpClientError, PkceCodeVerifier, RedirectUrl,
	RequestTokenError, StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::HandoffConfig,
	error::{ConfigError, TransientError, TransportError},
	http::{ExchangeTransport, ResponseTrace, ResponseTraceSlot},
	provider::ProviderDescriptor,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestExchange;

/// Extra token-endpoint response fields carrying the provider identity token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdTokenFields {
	/// Signed identity token, present for `openid`-scoped exchanges.
	#[serde(default)]
	pub id_token: Option<String>,
}
impl ExtraTokenFields for IdTokenFields {}

type IdTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;
type ConfiguredExchangeClient = Client<
	BasicErrorResponse,
	IdTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Maps HTTP transport failures into handoff [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a handoff error.
	fn map_transport_error(&self, trace: Option<&ResponseTrace>, error: HttpClientError<E>)
	-> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		trace: Option<&ResponseTrace>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(trace, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(trace, message),
			_ => map_unknown_transport_error(trace),
		}
	}
}

/// Tokens returned by a successful authorization-code exchange.
#[derive(Clone, Debug)]
pub struct ProviderTokenSet {
	/// Provider access token; unused by the handoff but surfaced for callers.
	pub access_token: TokenSecret,
	/// Provider refresh token, when one was granted. Deliberately not persisted.
	pub refresh_token: Option<TokenSecret>,
	/// Signed identity token to be verified.
	pub id_token: String,
	/// Provider access-token lifetime.
	pub expires_in: Duration,
}

pub(crate) struct ExchangeFacade<C, M>
where
	C: ?Sized + ExchangeTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredExchangeClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> ExchangeFacade<C, M>
where
	C: ?Sized + ExchangeTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_parts(
		descriptor: &ProviderDescriptor,
		config: &HandoffConfig,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let redirect_url = RedirectUrl::new(config.redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let mut oauth_client = Client::new(ClientId::new(config.client_id.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url)
			// Providers accepting `client_secret_post` also accept PKCE-only public clients.
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = &config.client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.clone()));
		}

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	pub(crate) async fn exchange_authorization_code(
		&self,
		code: &str,
		pkce_verifier: &str,
	) -> Result<ProviderTokenSet> {
		let trace = ResponseTraceSlot::default();
		let handle = self.http_client.with_trace(trace.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_owned()))
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(trace.take(), err, self.error_mapper.as_ref()))?;
		let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
		let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		if expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}

		let id_token =
			response.extra_fields().id_token.clone().ok_or(ConfigError::MissingIdToken)?;

		Ok(ProviderTokenSet {
			access_token: TokenSecret::new(response.access_token().secret().clone()),
			refresh_token: response
				.refresh_token()
				.map(|token| TokenSecret::new(token.secret().clone())),
			id_token,
			expires_in: Duration::seconds(expires_in),
		})
	}
}

fn map_request_error<E, M>(
	trace: Option<ResponseTrace>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let trace_ref = trace.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response),
		RequestTokenError::Request(error) => mapper.map_transport_error(trace_ref, error),
		RequestTokenError::Parse(error, _body) =>
			TransientError::TokenResponseParse { source: error, status: trace_status(trace_ref) }
				.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message: format!("Token endpoint returned an unexpected response: {message}."),
			status: trace_status(trace_ref),
			retry_after: trace_retry_after(trace_ref),
		}
		.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse) -> Error {
	let reason = if let Some(description) = response.error_description() {
		description.clone()
	} else {
		response.error().as_ref().to_owned()
	};

	Error::ExchangeRejected { reason }
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(trace: Option<&ResponseTrace>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "Request timed out while calling the token endpoint.".into(),
			status: trace_status(trace).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: trace_retry_after(trace),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn map_generic_transport_error(trace: Option<&ResponseTrace>, message: impl Display) -> Error {
	TransientError::TokenEndpoint {
		message: format!("HTTP client error occurred while calling the token endpoint: {message}."),
		status: trace_status(trace),
		retry_after: trace_retry_after(trace),
	}
	.into()
}

fn map_unknown_transport_error(trace: Option<&ResponseTrace>) -> Error {
	TransientError::TokenEndpoint {
		message: "HTTP client error occurred while calling the token endpoint.".into(),
		status: trace_status(trace),
		retry_after: trace_retry_after(trace),
	}
	.into()
}

fn trace_status(trace: Option<&ResponseTrace>) -> Option<u16> {
	trace.and_then(|value| value.status)
}

fn trace_retry_after(trace: Option<&ResponseTrace>) -> Option<Duration> {
	trace.and_then(|value| value.retry_after)
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::ProviderId,
		config::{DeepLinkTarget, SigningSecret},
	};

	fn fixture() -> (ProviderDescriptor, HandoffConfig) {
		let descriptor = ProviderDescriptor::builder(ProviderId::new("test-provider").unwrap())
			.authorization_endpoint("https://example.com/oauth2/authorize")
			.unwrap()
			.token_endpoint("https://example.com/oauth2/token")
			.unwrap()
			.jwks_endpoint("https://example.com/oauth2/jwks")
			.unwrap()
			.issuer("https://example.com")
			.build()
			.expect("Failed to build provider descriptor.");
		let config = HandoffConfig::builder()
			.client_id("client-id")
			.redirect_uri(Url::parse("https://example.com/callback").unwrap())
			.deep_link(DeepLinkTarget::parse("myapp://auth-callback").unwrap())
			.signing_secret(SigningSecret::new(vec![1_u8; 32]).unwrap())
			.build()
			.expect("Failed to build configuration.");

		(descriptor, config)
	}

	#[test]
	fn builds_confidential_client() {
		let (descriptor, mut config) = fixture();

		config.client_secret = Some("secret".into());

		let result = <ExchangeFacade<ReqwestExchange, ReqwestTransportErrorMapper>>::from_parts(
			&descriptor,
			&config,
			Arc::new(ReqwestExchange::default()),
			Arc::new(ReqwestTransportErrorMapper),
		);

		assert!(result.is_ok());
	}

	#[test]
	fn builds_public_pkce_client_without_secret() {
		let (descriptor, config) = fixture();
		let result = <ExchangeFacade<ReqwestExchange, ReqwestTransportErrorMapper>>::from_parts(
			&descriptor,
			&config,
			Arc::new(ReqwestExchange::default()),
			Arc::new(ReqwestTransportErrorMapper),
		);

		assert!(result.is_ok());
	}

	#[test]
	fn server_error_responses_surface_the_description() {
		let payload = serde_json::json!({
			"error": "invalid_grant",
			"error_description": "Code was already redeemed."
		});
		let response: BasicErrorResponse =
			serde_json::from_value(payload).expect("Error fixture should deserialize.");
		let mapped = map_server_response_error(response);

		assert!(matches!(
			mapped,
			Error::ExchangeRejected { ref reason } if reason == "Code was already redeemed."
		));
	}
}
