// self
use oauth2_handoff::{
	auth::ProviderId,
	config::{DeepLinkTarget, DeploymentMode, HandoffConfig, MIN_SIGNING_SECRET_LEN, SigningSecret},
	error::ConfigError,
	provider::{ProviderDescriptor, ProviderDescriptorBuilder, ProviderDescriptorError},
};
// crates.io
use url::Url;

fn builder(id: &str) -> ProviderDescriptorBuilder {
	ProviderDescriptor::builder(
		ProviderId::new(id).expect("Provider identifier should be valid."),
	)
}

#[test]
fn descriptor_rejects_insecure_endpoints() {
	let err = builder("mock")
		.authorization_endpoint("https://example.com/auth")
		.unwrap()
		.token_endpoint("http://example.com/token")
		.unwrap()
		.jwks_endpoint("https://example.com/jwks")
		.unwrap()
		.issuer("https://example.com")
		.build()
		.expect_err("Descriptor builder should reject insecure token endpoints.");

	assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "token", .. }));
}

#[test]
fn descriptor_requires_every_endpoint_and_an_issuer() {
	let err = builder("mock")
		.token_endpoint("https://example.com/token")
		.unwrap()
		.jwks_endpoint("https://example.com/jwks")
		.unwrap()
		.issuer("https://example.com")
		.build()
		.expect_err("A missing authorization endpoint should be rejected.");

	assert!(matches!(err, ProviderDescriptorError::MissingAuthorizationEndpoint));

	let err = builder("mock")
		.authorization_endpoint("https://example.com/auth")
		.unwrap()
		.token_endpoint("https://example.com/token")
		.unwrap()
		.jwks_endpoint("https://example.com/jwks")
		.unwrap()
		.build()
		.expect_err("A descriptor without issuers should be rejected.");

	assert!(matches!(err, ProviderDescriptorError::NoIssuers));
}

#[test]
fn google_preset_matches_published_endpoints() {
	let google = ProviderDescriptor::google().expect("Google preset should build.");

	assert_eq!(google.id.as_ref(), "google");
	assert_eq!(
		google.endpoints.authorization.as_str(),
		"https://accounts.google.com/o/oauth2/v2/auth"
	);
	assert_eq!(google.endpoints.token.as_str(), "https://oauth2.googleapis.com/token");
	assert_eq!(google.endpoints.jwks.as_str(), "https://www.googleapis.com/oauth2/v3/certs");
	assert!(google.issuers.contains(&"accounts.google.com".to_owned()));
	assert!(google.issuers.contains(&"https://accounts.google.com".to_owned()));
}

fn config_builder() -> oauth2_handoff::config::HandoffConfigBuilder {
	HandoffConfig::builder()
		.client_id("client-1")
		.redirect_uri(
			Url::parse("https://app.example.com/callback")
				.expect("Redirect URI should parse successfully."),
		)
		.deep_link(
			DeepLinkTarget::parse("myapp://auth-callback")
				.expect("Deep-link target should be valid."),
		)
}

#[test]
fn production_configs_fail_closed_on_secrets() {
	let err = config_builder()
		.mode(DeploymentMode::Production)
		.build()
		.expect_err("Production mode must refuse to run without a signing secret.");

	assert!(matches!(err, ConfigError::MissingSigningSecret));

	let err = SigningSecret::new(vec![0_u8; MIN_SIGNING_SECRET_LEN - 1])
		.expect_err("Short secrets must be rejected.");

	assert!(matches!(err, ConfigError::WeakSigningSecret { .. }));

	config_builder()
		.mode(DeploymentMode::Production)
		.signing_secret(
			SigningSecret::new(vec![0_u8; MIN_SIGNING_SECRET_LEN])
				.expect("A minimum-length secret should be accepted."),
		)
		.build()
		.expect("A production config with a strong secret should build.");
}

#[test]
fn development_configs_get_ephemeral_secrets() {
	let config = config_builder()
		.build()
		.expect("Development mode should substitute an ephemeral secret.");

	assert_eq!(config.mode, DeploymentMode::Development);
	assert_eq!(config.signing_secret.expose().len(), MIN_SIGNING_SECRET_LEN);
}

#[test]
fn every_required_config_field_is_enforced() {
	let err = HandoffConfig::builder().build().expect_err("An empty builder must fail.");

	assert!(matches!(err, ConfigError::MissingClientId));

	let err = HandoffConfig::builder()
		.client_id("client-1")
		.build()
		.expect_err("A missing redirect URI must fail.");

	assert!(matches!(err, ConfigError::MissingRedirectUri));

	let err = HandoffConfig::builder()
		.client_id("client-1")
		.redirect_uri(Url::parse("https://app.example.com/callback").unwrap())
		.build()
		.expect_err("A missing deep link must fail.");

	assert!(matches!(err, ConfigError::MissingDeepLink));
}

#[test]
fn deep_links_escape_token_material() {
	let target = DeepLinkTarget::parse("myapp://auth-callback").expect("Target should parse.");
	let uri = target.uri("a b&c=d").expect("Rendering should succeed.");

	assert_eq!(uri.scheme(), "myapp");
	assert_eq!(uri.query(), Some("ott=a+b%26c%3Dd"));

	for bad in ["plain-path", "://missing-scheme", "0app://path", "app://"] {
		assert!(DeepLinkTarget::parse(bad).is_err(), "{bad:?} should be rejected");
	}
}
