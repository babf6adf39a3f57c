//! Session grants: one-time-token redemption, refresh, and logout.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenSecret, UserId},
	error::DeniedError,
	flows::{Handoff, pkce},
	http::ExchangeTransport,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{ACCESS_TTL, TokenUse},
	store::{HandoffStore as _, RefreshRecord},
};

const TOKEN_TYPE: &str = "Bearer";

/// User summary embedded in a [`SessionGrant`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionUser {
	/// Local user id.
	pub id: UserId,
	/// Display name resolved during the callback.
	pub name: String,
	/// Avatar URL, when known.
	pub picture: Option<String>,
}

/// Full token pair handed to a device redeeming a one-time token.
#[derive(Clone, Debug, Serialize)]
pub struct SessionGrant {
	/// Short-lived internal access token.
	pub access_token: TokenSecret,
	/// Long-lived internal refresh token.
	pub refresh_token: TokenSecret,
	/// Always `Bearer`.
	pub token_type: &'static str,
	/// Access-token lifetime in seconds.
	pub expires_in: u64,
	/// Owner of the new session.
	pub user: SessionUser,
}

/// Renewed access token returned by [`Handoff::refresh`].
#[derive(Clone, Debug, Serialize)]
pub struct AccessGrant {
	/// Short-lived internal access token.
	pub access_token: TokenSecret,
	/// Always `Bearer`.
	pub token_type: &'static str,
	/// Access-token lifetime in seconds.
	pub expires_in: u64,
}

impl<C, M> Handoff<C, M>
where
	C: ?Sized + ExchangeTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Redeems a one-time token for the internal session pair.
	///
	/// The token is consumed on every attempt, expired or not, so it can never authenticate
	/// twice.
	pub async fn finish(&self, ott: &str) -> Result<SessionGrant> {
		const KIND: FlowKind = FlowKind::Finish;

		let span = FlowSpan::new(KIND, "finish");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if ott.is_empty() {
					return Err(Error::MissingParameter { name: "ott" });
				}

				let record = self.store.take_ott(ott).await?.ok_or(DeniedError::InvalidOtt)?;

				if record.is_expired_at(OffsetDateTime::now_utc()) {
					return Err(DeniedError::OttExpired.into());
				}

				let record = record.value;
				let session = SessionId::unchecked(pkce::random_string(pkce::SESSION_ID_LEN));
				let access = self.issuer().sign_access(&record.user_id, &session)?;
				let refresh = self.issuer().sign_refresh(&record.user_id, &session)?;

				self.store
					.record_refresh(&refresh, RefreshRecord {
						user_id: record.user_id.clone(),
						session_id: session,
						created_at: OffsetDateTime::now_utc(),
					})
					.await?;

				Ok(SessionGrant {
					access_token: TokenSecret::new(access),
					refresh_token: TokenSecret::new(refresh),
					token_type: TOKEN_TYPE,
					expires_in: ACCESS_TTL.whole_seconds() as u64,
					user: SessionUser {
						id: record.user_id,
						name: record.name,
						picture: record.picture,
					},
				})
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Renews the access token for the session a refresh token belongs to.
	///
	/// The refresh vault is the revocation authority: a token absent from the vault is denied
	/// even if its signature would verify. A recorded token that fails verification is removed
	/// from the vault before the denial is returned.
	pub async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if refresh_token.is_empty() {
					return Err(Error::MissingParameter { name: "refresh_token" });
				}

				let record = self
					.store
					.lookup_refresh(refresh_token)
					.await?
					.ok_or(DeniedError::InvalidRefresh)?;

				if self.issuer().verify(refresh_token, TokenUse::Refresh).is_err() {
					self.store.revoke_refresh(refresh_token).await?;

					return Err(DeniedError::RefreshExpired.into());
				}

				let access = self.issuer().sign_access(&record.user_id, &record.session_id)?;

				Ok(AccessGrant {
					access_token: TokenSecret::new(access),
					token_type: TOKEN_TYPE,
					expires_in: ACCESS_TTL.whole_seconds() as u64,
				})
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Revokes a refresh token, ending its session.
	///
	/// Idempotent: revoking an unknown or already-revoked token succeeds quietly so logout
	/// never fails on retry.
	pub async fn logout(&self, refresh_token: &str) -> Result<()> {
		const KIND: FlowKind = FlowKind::Logout;

		let span = FlowSpan::new(KIND, "logout");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if refresh_token.is_empty() {
					return Err(Error::MissingParameter { name: "refresh_token" });
				}

				Ok(self.store.revoke_refresh(refresh_token).await?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
