//! Persistence traits and records for the three handoff vaults.
//!
//! Three keyspaces back the login handoff: pending logins keyed by `state`, one-time tokens keyed
//! by their value, and refresh-token records keyed by the refresh token itself. All reads of
//! single-use records go through `take` operations that remove the record atomically, so a value
//! can never authenticate twice.

pub mod memory;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{DeviceId, SessionId, TokenSecret, UserId},
};

/// How long a pending login waits for its callback.
pub const STATE_TTL: Duration = Duration::minutes(5);
/// How long a one-time token stays redeemable.
pub const OTT_TTL: Duration = Duration::seconds(60);

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Record could not be encoded or decoded.
	#[error("Store serialization failed: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure.
	#[error("Store backend failed: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// A value paired with its expiry deadline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiring<T> {
	/// The stored value.
	pub value: T,
	/// Instant after which the value no longer authenticates.
	pub expires_at: OffsetDateTime,
}
impl<T> Expiring<T> {
	/// Wraps a value expiring `ttl` from now.
	pub fn fresh(value: T, ttl: Duration) -> Self {
		Self { value, expires_at: OffsetDateTime::now_utc() + ttl }
	}

	/// Wraps a value with an explicit deadline.
	pub fn with_deadline(value: T, expires_at: OffsetDateTime) -> Self {
		Self { value, expires_at }
	}

	/// Whether the value has expired as of `instant`.
	///
	/// A value observed exactly at its deadline is still live.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant > self.expires_at
	}
}

/// State parked between redirecting the browser out and the provider calling back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
	/// PKCE code verifier generated at the start of the attempt.
	pub code_verifier: TokenSecret,
	/// Device that initiated the attempt, when one was supplied.
	pub device_id: Option<DeviceId>,
	/// When the attempt began.
	pub created_at: OffsetDateTime,
}

/// Record redeemed by a one-time token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OttRecord {
	/// Local user the completed login resolved to.
	pub user_id: UserId,
	/// Display name resolved during the callback.
	pub name: String,
	/// Avatar URL, when known.
	pub picture: Option<String>,
	/// When the token was minted.
	pub created_at: OffsetDateTime,
}

/// Record tracked per outstanding refresh token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRecord {
	/// Owner of the session.
	pub user_id: UserId,
	/// Session the refresh token belongs to.
	pub session_id: SessionId,
	/// When the session was established.
	pub created_at: OffsetDateTime,
}

/// Storage backend for the three handoff vaults.
pub trait HandoffStore: Send + Sync {
	/// Parks a pending login under its `state` value.
	fn put_pending<'a>(
		&'a self,
		state: &'a str,
		pending: Expiring<PendingLogin>,
	) -> StoreFuture<'a, ()>;

	/// Removes and returns the pending login for `state`, expired or not.
	fn take_pending<'a>(&'a self, state: &'a str) -> StoreFuture<'a, Option<Expiring<PendingLogin>>>;

	/// Parks a redeemed-login record under its one-time token.
	fn put_ott<'a>(&'a self, ott: &'a str, record: Expiring<OttRecord>) -> StoreFuture<'a, ()>;

	/// Removes and returns the record for `ott`, expired or not.
	fn take_ott<'a>(&'a self, ott: &'a str) -> StoreFuture<'a, Option<Expiring<OttRecord>>>;

	/// Records an issued refresh token.
	fn record_refresh<'a>(&'a self, token: &'a str, record: RefreshRecord) -> StoreFuture<'a, ()>;

	/// Looks up a refresh token without consuming it.
	fn lookup_refresh<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<RefreshRecord>>;

	/// Deletes a refresh token record. Succeeds whether or not the record existed.
	fn revoke_refresh<'a>(&'a self, token: &'a str) -> StoreFuture<'a, ()>;
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn deadline_boundary_is_inclusive() {
		let deadline = datetime!(2026-01-01 00:05:00 UTC);
		let pending = Expiring::with_deadline(7_u8, deadline);

		assert!(!pending.is_expired_at(datetime!(2026-01-01 00:04:59 UTC)));
		assert!(!pending.is_expired_at(deadline));
		assert!(pending.is_expired_at(datetime!(2026-01-01 00:05:01 UTC)));
	}

	#[test]
	fn fresh_applies_the_requested_ttl() {
		let now = OffsetDateTime::now_utc();
		let pending = Expiring::fresh((), STATE_TTL);

		assert!(pending.expires_at >= now + STATE_TTL);
		assert!(pending.expires_at <= now + STATE_TTL + Duration::seconds(1));
	}
}
