//! Provider signing-key retrieval and the time-bounded key cache.

// crates.io
use jsonwebtoken::DecodingKey;
// self
use crate::{
	_prelude::*,
	error::{TransientError, VerifyError},
};

/// How long a fetched key set stays fresh.
pub const KEY_TTL: Duration = Duration::minutes(5);

/// Boxed future returned by key-set fetches.
pub type KeyFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Fetches a provider's published key set.
pub trait KeySetClient: Send + Sync {
	/// Retrieves the current key set from `jwks_url`.
	fn fetch<'a>(&'a self, jwks_url: &'a Url) -> KeyFuture<'a, ProviderKeySet>;
}

/// JWKS document published by a provider.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderKeySet {
	/// The provider's currently valid signing keys.
	pub keys: Vec<ProviderKey>,
}

/// One RSA signing key from a provider's key set.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderKey {
	/// Key id referenced by identity-token headers.
	pub kid: String,
	/// RSA modulus, base64url-encoded.
	pub n: String,
	/// RSA public exponent, base64url-encoded.
	pub e: String,
	/// Declared algorithm, when the provider includes one.
	#[serde(default)]
	pub alg: Option<String>,
}

/// [`KeySetClient`] backed by [`reqwest`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestKeySetClient(ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestKeySetClient {
	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl KeySetClient for ReqwestKeySetClient {
	fn fetch<'a>(&'a self, jwks_url: &'a Url) -> KeyFuture<'a, ProviderKeySet> {
		Box::pin(async move {
			let resp = self
				.0
				.get(jwks_url.clone())
				.send()
				.await
				.map_err(crate::error::TransportError::from)?;
			let status = resp.status().as_u16();

			if !resp.status().is_success() {
				return Err(TransientError::KeySetFetch {
					message: format!("status {status}"),
					status: Some(status),
				}
				.into());
			}

			Ok(resp.json::<ProviderKeySet>().await.map_err(|e| TransientError::KeySetFetch {
				message: e.to_string(),
				status: Some(status),
			})?)
		})
	}
}

#[derive(Clone, Debug)]
struct CachedKeySet {
	keys: ProviderKeySet,
	fetched_at: OffsetDateTime,
}

/// Caching resolver from key ids to verification keys.
///
/// Refreshes replace the cached set wholesale. An unknown `kid` against a fresh cache forces one
/// refetch before failing, which covers providers that rotate keys mid-TTL.
#[derive(Clone)]
pub struct KeyResolver {
	client: Arc<dyn KeySetClient>,
	jwks_url: Url,
	cache: Arc<RwLock<Option<CachedKeySet>>>,
}
impl KeyResolver {
	/// Creates a resolver for one provider's key-set endpoint.
	pub fn new(client: Arc<dyn KeySetClient>, jwks_url: Url) -> Self {
		Self { client, jwks_url, cache: Arc::new(RwLock::new(None)) }
	}

	/// Resolves `kid` to a verification key, fetching or refreshing the key set as needed.
	pub async fn resolve(&self, kid: &str) -> Result<DecodingKey> {
		let now = OffsetDateTime::now_utc();
		let cached = self
			.cache
			.read()
			.as_ref()
			.filter(|c| now - c.fetched_at <= KEY_TTL)
			.map(|c| c.keys.clone());
		let (keys, just_fetched) = match cached {
			Some(keys) => (keys, false),
			None => (self.refetch(now).await?, true),
		};

		if let Some(key) = Self::find(&keys, kid) {
			return Self::import(&key, kid);
		}
		// Cached set without the kid: refetch once in case the provider rotated keys.
		if !just_fetched
			&& let Some(key) = Self::find(&self.refetch(now).await?, kid)
		{
			return Self::import(&key, kid);
		}

		Err(VerifyError::KeyNotFound { kid: kid.to_owned() }.into())
	}

	async fn refetch(&self, now: OffsetDateTime) -> Result<ProviderKeySet> {
		let keys = self.client.fetch(&self.jwks_url).await?;

		*self.cache.write() = Some(CachedKeySet { keys: keys.clone(), fetched_at: now });

		Ok(keys)
	}

	fn find(keys: &ProviderKeySet, kid: &str) -> Option<ProviderKey> {
		keys.keys.iter().find(|k| k.kid == kid).cloned()
	}

	fn import(key: &ProviderKey, kid: &str) -> Result<DecodingKey> {
		DecodingKey::from_rsa_components(&key.n, &key.e)
			.map_err(|_| VerifyError::MalformedKey { kid: kid.to_owned() }.into())
	}
}
impl Debug for KeyResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KeyResolver").field("jwks_url", &self.jwks_url.as_str()).finish()
	}
}
