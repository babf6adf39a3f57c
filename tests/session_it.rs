#![cfg(feature = "reqwest")]

// self
use oauth2_handoff::{
	_preludet::*,
	auth::{ProviderId, SessionId, TokenSecret, UserId},
	config::{DeepLinkTarget, HandoffConfig, SigningSecret},
	error::DeniedError,
	provider::ProviderDescriptor,
	session::TokenUse,
	store::{Expiring, HandoffStore, OTT_TTL, OttRecord, PendingLogin, RefreshRecord},
};

fn build_descriptor() -> ProviderDescriptor {
	ProviderDescriptor::builder(
		ProviderId::new("offline-idp").expect("Provider identifier should be valid."),
	)
	.authorization_endpoint("https://idp.example/authorize")
	.expect("Authorization endpoint should parse successfully.")
	.token_endpoint("https://idp.example/token")
	.expect("Token endpoint should parse successfully.")
	.jwks_endpoint("https://idp.example/jwks")
	.expect("Key-set endpoint should parse successfully.")
	.issuer("https://idp.example")
	.build()
	.expect("Provider descriptor should build successfully.")
}

fn build_config() -> HandoffConfig {
	HandoffConfig::builder()
		.client_id("client-session-it")
		.redirect_uri(
			Url::parse("https://app.example.com/callback")
				.expect("Redirect URI should parse successfully."),
		)
		.deep_link(
			DeepLinkTarget::parse("myapp://auth-callback")
				.expect("Deep-link target should be valid."),
		)
		.signing_secret(
			SigningSecret::new(vec![9_u8; 32]).expect("Signing secret should be accepted."),
		)
		.build()
		.expect("Configuration should build successfully.")
}

fn ott_record(user: &str) -> OttRecord {
	OttRecord {
		user_id: UserId::new(user).expect("User fixture should be valid."),
		name: "Ada".to_owned(),
		picture: None,
		created_at: OffsetDateTime::now_utc(),
	}
}

#[tokio::test]
async fn sessions_refresh_until_logged_out() {
	let (handoff, store, _directory) = build_reqwest_test_handoff(build_descriptor(), build_config());

	store.put_ott("ott-1", Expiring::fresh(ott_record("user-7"), OTT_TTL)).await.unwrap();

	let grant = handoff.finish("ott-1").await.expect("Redemption should succeed.");
	let session_claims = handoff
		.verify_access(grant.access_token.expose())
		.expect("The fresh access token should verify.");
	let renewed = handoff
		.refresh(grant.refresh_token.expose())
		.await
		.expect("Refreshing an active session should succeed.");
	let renewed_claims = handoff
		.verify_access(renewed.access_token.expose())
		.expect("The renewed access token should verify.");

	// Renewal preserves both the user and the session identity.
	assert_eq!(renewed_claims.sub, session_claims.sub);
	assert_eq!(renewed_claims.sid, session_claims.sid);
	assert_eq!(renewed_claims.typ, TokenUse::Access);

	handoff.logout(grant.refresh_token.expose()).await.expect("Logout should succeed.");

	let err = handoff
		.refresh(grant.refresh_token.expose())
		.await
		.expect_err("A revoked refresh token must be denied.");

	assert!(matches!(err, Error::Denied(DeniedError::InvalidRefresh)));
}

#[tokio::test]
async fn unknown_refresh_tokens_are_denied_even_if_well_formed() {
	let (handoff, store, _directory) = build_reqwest_test_handoff(build_descriptor(), build_config());

	store.put_ott("ott-1", Expiring::fresh(ott_record("user-7"), OTT_TTL)).await.unwrap();

	let grant = handoff.finish("ott-1").await.expect("Redemption should succeed.");

	// Same signing secret, but the vault never saw this token: build a second handoff over an
	// empty store and present the first handoff's refresh token to it.
	let (stranger, _store, _directory) =
		build_reqwest_test_handoff(build_descriptor(), build_config());
	let err = stranger
		.refresh(grant.refresh_token.expose())
		.await
		.expect_err("The vault is the revocation authority.");

	assert!(matches!(err, Error::Denied(DeniedError::InvalidRefresh)));
}

#[tokio::test]
async fn recorded_tokens_that_fail_verification_are_purged() {
	let (handoff, store, _directory) = build_reqwest_test_handoff(build_descriptor(), build_config());
	let record = RefreshRecord {
		user_id: UserId::new("user-7").expect("User fixture should be valid."),
		session_id: SessionId::new("session-7").expect("Session fixture should be valid."),
		created_at: OffsetDateTime::now_utc(),
	};

	store.record_refresh("not-a-jwt", record).await.unwrap();

	let err = handoff
		.refresh("not-a-jwt")
		.await
		.expect_err("A recorded but unverifiable token must be denied.");

	assert!(matches!(err, Error::Denied(DeniedError::RefreshExpired)));
	// The bad record is gone, so the next attempt fails as unknown rather than expired.
	assert!(store.lookup_refresh("not-a-jwt").await.unwrap().is_none());

	let err = handoff.refresh("not-a-jwt").await.expect_err("The record must not resurface.");

	assert!(matches!(err, Error::Denied(DeniedError::InvalidRefresh)));
}

#[tokio::test]
async fn access_tokens_cannot_be_used_as_refresh_tokens() {
	let (handoff, store, _directory) = build_reqwest_test_handoff(build_descriptor(), build_config());

	store.put_ott("ott-1", Expiring::fresh(ott_record("user-7"), OTT_TTL)).await.unwrap();

	let grant = handoff.finish("ott-1").await.expect("Redemption should succeed.");

	// Force the vault to track the access token, then confirm the kind check still denies it.
	let record = RefreshRecord {
		user_id: UserId::new("user-7").expect("User fixture should be valid."),
		session_id: SessionId::new("session-7").expect("Session fixture should be valid."),
		created_at: OffsetDateTime::now_utc(),
	};

	store.record_refresh(grant.access_token.expose(), record).await.unwrap();

	let err = handoff
		.refresh(grant.access_token.expose())
		.await
		.expect_err("An access token must never act as a refresh token.");

	assert!(matches!(err, Error::Denied(DeniedError::RefreshExpired)));
}

#[tokio::test]
async fn expired_one_time_tokens_are_denied_and_consumed() {
	let (handoff, store, _directory) = build_reqwest_test_handoff(build_descriptor(), build_config());
	let stale = Expiring::with_deadline(
		ott_record("user-7"),
		OffsetDateTime::now_utc() - Duration::seconds(1),
	);

	store.put_ott("ott-stale", stale).await.unwrap();

	let err = handoff.finish("ott-stale").await.expect_err("A stale token must be denied.");

	assert!(matches!(err, Error::Denied(DeniedError::OttExpired)));

	// The expired record was consumed by the failed attempt.
	let err = handoff.finish("ott-stale").await.expect_err("The token must not resurface.");

	assert!(matches!(err, Error::Denied(DeniedError::InvalidOtt)));
}

#[tokio::test]
async fn expired_pending_logins_are_denied_and_consumed() {
	let (handoff, store, _directory) = build_reqwest_test_handoff(build_descriptor(), build_config());
	let stale = Expiring::with_deadline(
		PendingLogin {
			code_verifier: TokenSecret::new("verifier-0000".to_owned()),
			device_id: None,
			created_at: OffsetDateTime::now_utc() - Duration::minutes(6),
		},
		OffsetDateTime::now_utc() - Duration::seconds(1),
	);

	store.put_pending("state-stale", stale).await.unwrap();

	// Both attempts fail before any token-endpoint request, so no mock server is needed.
	let err = handoff
		.callback("code-1", "state-stale")
		.await
		.expect_err("A stale login attempt must be denied.");

	assert!(matches!(err, Error::Denied(DeniedError::StateExpired)));

	// The expired record was consumed, so a replayed state reads as unknown.
	let err = handoff
		.callback("code-1", "state-stale")
		.await
		.expect_err("The state must not resurface.");

	assert!(matches!(err, Error::Denied(DeniedError::StateNotFound)));
}

#[tokio::test]
async fn logout_is_idempotent_and_scoped_to_one_session() {
	let (handoff, store, _directory) = build_reqwest_test_handoff(build_descriptor(), build_config());

	store.put_ott("ott-a", Expiring::fresh(ott_record("user-7"), OTT_TTL)).await.unwrap();
	store.put_ott("ott-b", Expiring::fresh(ott_record("user-7"), OTT_TTL)).await.unwrap();

	let first = handoff.finish("ott-a").await.expect("First redemption should succeed.");
	let second = handoff.finish("ott-b").await.expect("Second redemption should succeed.");

	handoff.logout(first.refresh_token.expose()).await.expect("Logout should succeed.");
	handoff
		.logout(first.refresh_token.expose())
		.await
		.expect("Repeated logout should stay successful.");
	handoff.logout("never-issued").await.expect("Unknown tokens should log out quietly.");

	// The other device's session is untouched.
	handoff
		.refresh(second.refresh_token.expose())
		.await
		.expect("The remaining session should still refresh.");
}

#[tokio::test]
async fn empty_tokens_are_rejected_before_any_lookup() {
	let (handoff, _store, _directory) =
		build_reqwest_test_handoff(build_descriptor(), build_config());

	assert!(matches!(
		handoff.finish("").await.unwrap_err(),
		Error::MissingParameter { name: "ott" }
	));
	assert!(matches!(
		handoff.refresh("").await.unwrap_err(),
		Error::MissingParameter { name: "refresh_token" }
	));
	assert!(matches!(
		handoff.logout("").await.unwrap_err(),
		Error::MissingParameter { name: "refresh_token" }
	));
}
