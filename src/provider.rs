//! Federated identity provider descriptors.

// self
use crate::{_prelude::*, auth::ProviderId};

/// Errors raised while assembling a provider descriptor.
#[derive(Debug, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint was not supplied.
	#[error("Provider authorization endpoint is missing.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint was not supplied.
	#[error("Provider token endpoint is missing.")]
	MissingTokenEndpoint,
	/// Key-set endpoint was not supplied.
	#[error("Provider key-set endpoint is missing.")]
	MissingKeySetEndpoint,
	/// No canonical issuer strings were supplied.
	#[error("Provider must declare at least one issuer.")]
	NoIssuers,
	/// An endpoint does not use HTTPS.
	#[error("Provider {endpoint} endpoint must use HTTPS, got `{url}`.")]
	InsecureEndpoint {
		/// Which endpoint failed the check.
		endpoint: &'static str,
		/// The offending URL.
		url: Url,
	},
	/// An endpoint URL could not be parsed.
	#[error(transparent)]
	InvalidUrl(#[from] url::ParseError),
}

/// HTTPS endpoints of one provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the browser is sent to.
	pub authorization: Url,
	/// Token endpoint the code exchange posts to.
	pub token: Url,
	/// JWKS endpoint publishing the provider's current signing keys.
	pub jwks: Url,
}

/// Static description of one federated identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDescriptor {
	/// Provider identifier, used to namespace directory records.
	pub id: ProviderId,
	/// The provider's HTTPS endpoints.
	pub endpoints: ProviderEndpoints,
	/// Canonical issuer strings accepted in identity tokens.
	pub issuers: Vec<String>,
}
impl ProviderDescriptor {
	/// Creates a descriptor builder for the given provider id.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder {
			id,
			authorization: None,
			token: None,
			jwks: None,
			issuers: Vec::new(),
		}
	}

	/// Google's published endpoints and issuer strings.
	///
	/// Google issues `iss` both with and without the scheme prefix, so both spellings are
	/// accepted.
	pub fn google() -> Result<Self, ProviderDescriptorError> {
		Self::builder(ProviderId::unchecked("google"))
			.authorization_endpoint("https://accounts.google.com/o/oauth2/v2/auth")?
			.token_endpoint("https://oauth2.googleapis.com/token")?
			.jwks_endpoint("https://www.googleapis.com/oauth2/v3/certs")?
			.issuer("accounts.google.com")
			.issuer("https://accounts.google.com")
			.build()
	}
}

/// Builder validating a [`ProviderDescriptor`].
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	id: ProviderId,
	authorization: Option<Url>,
	token: Option<Url>,
	jwks: Option<Url>,
	issuers: Vec<String>,
}
impl ProviderDescriptorBuilder {
	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(
		mut self,
		url: impl AsRef<str>,
	) -> Result<Self, ProviderDescriptorError> {
		self.authorization = Some(Url::parse(url.as_ref())?);

		Ok(self)
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: impl AsRef<str>) -> Result<Self, ProviderDescriptorError> {
		self.token = Some(Url::parse(url.as_ref())?);

		Ok(self)
	}

	/// Sets the key-set endpoint.
	pub fn jwks_endpoint(mut self, url: impl AsRef<str>) -> Result<Self, ProviderDescriptorError> {
		self.jwks = Some(Url::parse(url.as_ref())?);

		Ok(self)
	}

	/// Adds a canonical issuer string.
	pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
		self.issuers.push(issuer.into());

		self
	}

	/// Validates the assembled descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let descriptor = self.assemble()?;

		for (endpoint, url) in [
			("authorization", &descriptor.endpoints.authorization),
			("token", &descriptor.endpoints.token),
			("key-set", &descriptor.endpoints.jwks),
		] {
			if url.scheme() != "https" {
				return Err(ProviderDescriptorError::InsecureEndpoint {
					endpoint,
					url: url.clone(),
				});
			}
		}

		Ok(descriptor)
	}

	fn assemble(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization =
			self.authorization.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let jwks = self.jwks.ok_or(ProviderDescriptorError::MissingKeySetEndpoint)?;

		if self.issuers.is_empty() {
			return Err(ProviderDescriptorError::NoIssuers);
		}

		Ok(ProviderDescriptor {
			id: self.id,
			endpoints: ProviderEndpoints { authorization, token, jwks },
			issuers: self.issuers,
		})
	}
}
