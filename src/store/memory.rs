//! In-memory store backend.

// self
use crate::{_prelude::*, store::*};

/// Process-local [`HandoffStore`] backed by three hash maps.
///
/// Cloning yields handles onto the same maps.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	pending: Arc<RwLock<HashMap<String, Expiring<PendingLogin>>>>,
	otts: Arc<RwLock<HashMap<String, Expiring<OttRecord>>>>,
	refresh: Arc<RwLock<HashMap<String, RefreshRecord>>>,
}
impl MemoryStore {
	/// Number of refresh-token records currently tracked.
	pub fn refresh_count(&self) -> usize {
		self.refresh.read().len()
	}

	fn put_pending_now(&self, state: &str, pending: Expiring<PendingLogin>) {
		self.pending.write().insert(state.to_owned(), pending);
	}

	fn take_pending_now(&self, state: &str) -> Option<Expiring<PendingLogin>> {
		self.pending.write().remove(state)
	}

	fn put_ott_now(&self, ott: &str, record: Expiring<OttRecord>) {
		self.otts.write().insert(ott.to_owned(), record);
	}

	fn take_ott_now(&self, ott: &str) -> Option<Expiring<OttRecord>> {
		self.otts.write().remove(ott)
	}

	fn record_refresh_now(&self, token: &str, record: RefreshRecord) {
		self.refresh.write().insert(token.to_owned(), record);
	}

	fn lookup_refresh_now(&self, token: &str) -> Option<RefreshRecord> {
		self.refresh.read().get(token).cloned()
	}

	fn revoke_refresh_now(&self, token: &str) {
		self.refresh.write().remove(token);
	}
}
impl HandoffStore for MemoryStore {
	fn put_pending<'a>(
		&'a self,
		state: &'a str,
		pending: Expiring<PendingLogin>,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move { Ok(self.put_pending_now(state, pending)) })
	}

	fn take_pending<'a>(
		&'a self,
		state: &'a str,
	) -> StoreFuture<'a, Option<Expiring<PendingLogin>>> {
		Box::pin(async move { Ok(self.take_pending_now(state)) })
	}

	fn put_ott<'a>(&'a self, ott: &'a str, record: Expiring<OttRecord>) -> StoreFuture<'a, ()> {
		Box::pin(async move { Ok(self.put_ott_now(ott, record)) })
	}

	fn take_ott<'a>(&'a self, ott: &'a str) -> StoreFuture<'a, Option<Expiring<OttRecord>>> {
		Box::pin(async move { Ok(self.take_ott_now(ott)) })
	}

	fn record_refresh<'a>(&'a self, token: &'a str, record: RefreshRecord) -> StoreFuture<'a, ()> {
		Box::pin(async move { Ok(self.record_refresh_now(token, record)) })
	}

	fn lookup_refresh<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<RefreshRecord>> {
		Box::pin(async move { Ok(self.lookup_refresh_now(token)) })
	}

	fn revoke_refresh<'a>(&'a self, token: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move { Ok(self.revoke_refresh_now(token)) })
	}
}
