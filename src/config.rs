//! Handoff configuration, signing-secret policy, and deep-link targets.

// crates.io
use rand::Rng;
// self
use crate::{_prelude::*, error::ConfigError};

/// Minimum byte length accepted for an internal signing secret.
pub const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Deployment mode governing the fail-closed secret policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
	/// Local development; a missing signing secret is replaced with an ephemeral one.
	#[default]
	Development,
	/// Production; a missing or weak signing secret refuses to start.
	Production,
}

/// Secret used to sign and verify internal session tokens.
///
/// An ephemeral secret invalidates all outstanding sessions on restart, which is why it is only
/// permitted in development mode.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);
impl SigningSecret {
	/// Accepts caller-provided secret material, enforcing the minimum length.
	pub fn new(material: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
		let material = material.into();

		if material.len() < MIN_SIGNING_SECRET_LEN {
			return Err(ConfigError::WeakSigningSecret { min: MIN_SIGNING_SECRET_LEN });
		}

		Ok(Self(material))
	}

	/// Generates a random secret valid for the current process only.
	pub fn ephemeral() -> Self {
		let mut material = [0_u8; MIN_SIGNING_SECRET_LEN];

		rand::rng().fill(&mut material);

		Self(material.to_vec())
	}

	/// Returns the raw secret bytes. Callers must avoid logging this value.
	pub fn expose(&self) -> &[u8] {
		&self.0
	}
}
impl Debug for SigningSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningSecret").field(&"<redacted>").finish()
	}
}

/// Destination a completed browser login is handed back to, e.g. `myapp://auth-callback`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeepLinkTarget {
	scheme: String,
	path: String,
}
impl DeepLinkTarget {
	/// Parses and validates a `scheme://path` deep-link target.
	pub fn parse(target: impl AsRef<str>) -> Result<Self, ConfigError> {
		let target = target.as_ref();
		let (scheme, path) = target
			.split_once("://")
			.ok_or(ConfigError::InvalidDeepLink { reason: "expected `scheme://path`" })?;

		if scheme.is_empty()
			|| !scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
			|| !scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
		{
			return Err(ConfigError::InvalidDeepLink { reason: "invalid scheme" });
		}
		if path.is_empty() {
			return Err(ConfigError::InvalidDeepLink { reason: "empty path" });
		}

		Ok(Self { scheme: scheme.to_owned(), path: path.to_owned() })
	}

	/// Renders the deep link carrying the given one-time token.
	pub fn uri(&self, ott: &str) -> Result<Url, ConfigError> {
		let mut url = Url::parse(&format!("{}://{}", self.scheme, self.path))
			.map_err(|_| ConfigError::InvalidDeepLink { reason: "unparsable target" })?;

		url.query_pairs_mut().append_pair("ott", ott);

		Ok(url)
	}

	/// Scheme component of the target.
	pub fn scheme(&self) -> &str {
		&self.scheme
	}
}

/// Fully validated handoff configuration.
#[derive(Clone, Debug)]
pub struct HandoffConfig {
	/// OAuth client id registered with the provider; doubles as the expected token audience.
	pub client_id: String,
	/// OAuth client secret, absent for public clients.
	pub client_secret: Option<String>,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Deep-link target carrying the one-time token back into the native application.
	pub deep_link: DeepLinkTarget,
	/// Secret for internal session tokens.
	pub signing_secret: SigningSecret,
	/// Deployment mode the secret policy was evaluated under.
	pub mode: DeploymentMode,
}
impl HandoffConfig {
	/// Creates a configuration builder.
	pub fn builder() -> HandoffConfigBuilder {
		HandoffConfigBuilder::default()
	}
}

/// Builder enforcing the fail-closed configuration policy.
#[derive(Debug, Default)]
pub struct HandoffConfigBuilder {
	client_id: Option<String>,
	client_secret: Option<String>,
	redirect_uri: Option<Url>,
	deep_link: Option<DeepLinkTarget>,
	signing_secret: Option<SigningSecret>,
	mode: DeploymentMode,
}
impl HandoffConfigBuilder {
	/// Sets the OAuth client id.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the OAuth client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = Some(client_secret.into());

		self
	}

	/// Sets the redirect URI registered with the provider.
	pub fn redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Sets the deep-link target.
	pub fn deep_link(mut self, deep_link: DeepLinkTarget) -> Self {
		self.deep_link = Some(deep_link);

		self
	}

	/// Sets the internal signing secret.
	pub fn signing_secret(mut self, signing_secret: SigningSecret) -> Self {
		self.signing_secret = Some(signing_secret);

		self
	}

	/// Sets the deployment mode.
	pub fn mode(mut self, mode: DeploymentMode) -> Self {
		self.mode = mode;

		self
	}

	/// Validates the assembled configuration.
	///
	/// In production mode a missing signing secret is a hard error; in development mode an
	/// ephemeral secret is generated instead.
	pub fn build(self) -> Result<HandoffConfig, ConfigError> {
		let client_id = self.client_id.ok_or(ConfigError::MissingClientId)?;

		if client_id.is_empty() {
			return Err(ConfigError::MissingClientId);
		}

		let redirect_uri = self.redirect_uri.ok_or(ConfigError::MissingRedirectUri)?;
		let deep_link = self.deep_link.ok_or(ConfigError::MissingDeepLink)?;
		let signing_secret = match (self.signing_secret, self.mode) {
			(Some(secret), _) => secret,
			(None, DeploymentMode::Production) => return Err(ConfigError::MissingSigningSecret),
			(None, DeploymentMode::Development) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(
					"No signing secret configured; using an ephemeral one. All sessions will be invalidated on restart."
				);

				SigningSecret::ephemeral()
			},
		};

		Ok(HandoffConfig {
			client_id,
			client_secret: self.client_secret,
			redirect_uri,
			deep_link,
			signing_secret,
			mode: self.mode,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base_builder() -> HandoffConfigBuilder {
		HandoffConfig::builder()
			.client_id("client-1")
			.redirect_uri(Url::parse("https://example.com/callback").unwrap())
			.deep_link(DeepLinkTarget::parse("myapp://auth-callback").unwrap())
	}

	#[test]
	fn production_requires_a_signing_secret() {
		let err = base_builder().mode(DeploymentMode::Production).build().unwrap_err();

		assert!(matches!(err, ConfigError::MissingSigningSecret));
	}

	#[test]
	fn development_generates_an_ephemeral_secret() {
		let config = base_builder().build().expect("Development build should succeed.");

		assert_eq!(config.signing_secret.expose().len(), MIN_SIGNING_SECRET_LEN);
	}

	#[test]
	fn short_secrets_are_rejected_in_any_mode() {
		let err = SigningSecret::new(vec![0_u8; MIN_SIGNING_SECRET_LEN - 1]).unwrap_err();

		assert!(matches!(err, ConfigError::WeakSigningSecret { min: MIN_SIGNING_SECRET_LEN }));
		SigningSecret::new(vec![0_u8; MIN_SIGNING_SECRET_LEN])
			.expect("Exactly the minimum length should succeed.");
	}

	#[test]
	fn deep_link_validation_and_rendering() {
		assert!(DeepLinkTarget::parse("no-separator").is_err());
		assert!(DeepLinkTarget::parse("://path").is_err());
		assert!(DeepLinkTarget::parse("1app://path").is_err());
		assert!(DeepLinkTarget::parse("myapp://").is_err());

		let target = DeepLinkTarget::parse("myapp://auth-callback").unwrap();
		let uri = target.uri("tok&en=x").unwrap();

		assert_eq!(uri.scheme(), "myapp");
		assert_eq!(uri.query(), Some("ott=tok%26en%3Dx"));
	}

	#[test]
	fn signing_secret_debug_is_redacted() {
		let secret = SigningSecret::ephemeral();

		assert_eq!(format!("{secret:?}"), "SigningSecret(\"<redacted>\")");
	}
}
