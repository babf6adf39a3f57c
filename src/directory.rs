//! User directory seam mapping provider identities onto local user records.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{LocalUser, UserId, UserProfile},
	error::DirectoryError,
};

/// Boxed future returned by directory operations.
pub type DirectoryFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, DirectoryError>> + 'a + Send>>;

/// Maps `(provider, subject)` pairs onto durable local user records.
///
/// `upsert` must be idempotent per pair: repeat logins return the same [`UserId`] while profile
/// fields track the latest claims.
pub trait UserDirectory: Send + Sync {
	/// Creates or updates the local record for one provider identity.
	fn upsert<'a>(
		&'a self,
		provider: &'a str,
		subject: &'a str,
		profile: &'a UserProfile,
	) -> DirectoryFuture<'a, LocalUser>;
}

/// Process-local [`UserDirectory`].
#[derive(Debug, Default)]
pub struct MemoryDirectory {
	entries: RwLock<HashMap<(String, String), LocalUser>>,
	next_id: AtomicU64,
}
impl MemoryDirectory {
	/// Number of local users currently tracked.
	pub fn user_count(&self) -> usize {
		self.entries.read().len()
	}

	fn upsert_now(&self, provider: &str, subject: &str, profile: &UserProfile) -> LocalUser {
		let mut entries = self.entries.write();
		let key = (provider.to_owned(), subject.to_owned());

		if let Some(existing) = entries.get_mut(&key) {
			existing.email = profile.email.clone();
			existing.name = profile.name.clone();
			existing.picture = profile.picture.clone();

			return existing.clone();
		}

		let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
		let user = LocalUser {
			id: UserId::unchecked(format!("user-{n}")),
			email: profile.email.clone(),
			name: profile.name.clone(),
			picture: profile.picture.clone(),
		};

		entries.insert(key, user.clone());

		user
	}
}
impl UserDirectory for MemoryDirectory {
	fn upsert<'a>(
		&'a self,
		provider: &'a str,
		subject: &'a str,
		profile: &'a UserProfile,
	) -> DirectoryFuture<'a, LocalUser> {
		Box::pin(async move { Ok(self.upsert_now(provider, subject, profile)) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn upsert_is_idempotent_per_identity() {
		let directory = MemoryDirectory::default();
		let first = directory
			.upsert(
				"google",
				"sub-1",
				&UserProfile { email: Some("a@example.com".into()), ..Default::default() },
			)
			.await
			.unwrap();
		let second = directory
			.upsert(
				"google",
				"sub-1",
				&UserProfile { name: Some("Renamed".into()), ..Default::default() },
			)
			.await
			.unwrap();

		assert_eq!(first.id, second.id);
		assert_eq!(second.name.as_deref(), Some("Renamed"));
		assert_eq!(second.email, None);
		assert_eq!(directory.user_count(), 1);
	}

	#[tokio::test]
	async fn distinct_identities_get_distinct_users() {
		let directory = MemoryDirectory::default();
		let a = directory.upsert("google", "sub-1", &UserProfile::default()).await.unwrap();
		let b = directory.upsert("google", "sub-2", &UserProfile::default()).await.unwrap();
		let c = directory.upsert("other", "sub-1", &UserProfile::default()).await.unwrap();

		assert_ne!(a.id, b.id);
		assert_ne!(a.id, c.id);
		assert_eq!(directory.user_count(), 3);
	}
}
