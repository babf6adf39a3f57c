//! Login initiation and the provider callback.
//!
//! [`Handoff::start`] parks a PKCE verifier under a fresh `state` value and hands back the
//! authorize URL. [`Handoff::callback`] consumes the pending login, exchanges the authorization
//! code, verifies the returned identity token, upserts the local user, and mints the one-time
//! token embedded in the deep link.

// self
use crate::{
	_prelude::*,
	auth::{DeviceId, TokenSecret, UserProfile},
	directory::UserDirectory as _,
	error::DeniedError,
	flows::{Handoff, pkce, pkce::PkcePair},
	http::ExchangeTransport,
	oauth::{ExchangeFacade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{Expiring, HandoffStore as _, OTT_TTL, OttRecord, PendingLogin, STATE_TTL},
};

/// Scopes requested on every login.
const SCOPE: &str = "openid profile email";

/// Handshake material returned by [`Handoff::start`].
#[derive(Clone, Debug)]
pub struct LoginStart {
	/// Fully-formed authorize URL the browser should be sent to.
	pub authorization_url: Url,
	/// Opaque state value that will round-trip via the provider redirect.
	pub state: String,
}

impl<C, M> Handoff<C, M>
where
	C: ?Sized + ExchangeTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Begins a login attempt, parking its PKCE verifier until the callback arrives.
	pub async fn start(&self, device_id: Option<DeviceId>) -> Result<LoginStart> {
		const KIND: FlowKind = FlowKind::Start;

		let span = FlowSpan::new(KIND, "start");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let state = pkce::random_string(pkce::STATE_LEN);
				let pair = PkcePair::generate();
				let pending = PendingLogin {
					code_verifier: TokenSecret::new(pair.verifier.clone()),
					device_id,
					created_at: OffsetDateTime::now_utc(),
				};

				// The verifier must be durable before the browser leaves, or the callback
				// could race a write that never landed.
				self.store.put_pending(&state, Expiring::fresh(pending, STATE_TTL)).await?;

				let authorization_url = self.build_authorize_url(&state, &pair);

				Ok(LoginStart { authorization_url, state })
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Completes a login after the provider redirect, returning the deep link to send the
	/// browser to.
	///
	/// The pending login is consumed whether or not the exchange succeeds, so a replayed
	/// `state` always fails with [`DeniedError::StateNotFound`].
	pub async fn callback(&self, code: &str, state: &str) -> Result<Url> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "callback");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if code.is_empty() {
					return Err(Error::MissingParameter { name: "code" });
				}
				if state.is_empty() {
					return Err(Error::MissingParameter { name: "state" });
				}

				let pending =
					self.store.take_pending(state).await?.ok_or(DeniedError::StateNotFound)?;

				if pending.is_expired_at(OffsetDateTime::now_utc()) {
					return Err(DeniedError::StateExpired.into());
				}

				let facade = <ExchangeFacade<C, M>>::from_parts(
					&self.descriptor,
					&self.config,
					self.http_client.clone(),
					self.transport_mapper.clone(),
				)?;
				let tokens = facade
					.exchange_authorization_code(code, pending.value.code_verifier.expose())
					.await?;
				let claims = self.verifier().verify(&tokens.id_token).await?;
				let profile = UserProfile::from(&claims);
				let user = self
					.directory
					.upsert(&self.descriptor.id, &claims.subject, &profile)
					.await?;
				let ott = pkce::random_string(pkce::OTT_LEN);
				let record = OttRecord {
					user_id: user.id.clone(),
					name: user.display_name(),
					picture: user.picture.clone(),
					created_at: OffsetDateTime::now_utc(),
				};

				self.store.put_ott(&ott, Expiring::fresh(record, OTT_TTL)).await?;

				Ok(self.config.deep_link.uri(&ott)?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	fn build_authorize_url(&self, state: &str, pair: &PkcePair) -> Url {
		let mut url = self.descriptor.endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", &self.config.client_id);
		pairs.append_pair("redirect_uri", self.config.redirect_uri.as_str());
		pairs.append_pair("scope", SCOPE);
		// Offline access plus forced consent keeps providers returning a refresh token on
		// every login, not only the first.
		pairs.append_pair("access_type", "offline");
		pairs.append_pair("prompt", "consent");
		pairs.append_pair("state", state);
		pairs.append_pair("code_challenge", &pair.challenge);
		pairs.append_pair("code_challenge_method", pair.method.as_str());

		drop(pairs);

		url
	}
}
