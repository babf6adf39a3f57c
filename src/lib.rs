//! Federated OAuth 2.0 login handoff—PKCE handshakes, provider ID-token verification, and an
//! internal session-token lifecycle that bridges browser-completed logins into native
//! applications via single-use deep-link tokens.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod flows;
pub mod http;
pub mod keys;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod session;
pub mod store;
pub mod verify;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::HandoffConfig,
		directory::{MemoryDirectory, UserDirectory},
		flows::Handoff,
		http::ReqwestExchange,
		keys::{KeySetClient, ReqwestKeySetClient},
		oauth::ReqwestTransportErrorMapper,
		provider::ProviderDescriptor,
		store::{HandoffStore, MemoryStore},
	};

	/// Handoff type alias used by reqwest-backed integration tests.
	pub type ReqwestTestHandoff = Handoff<ReqwestExchange, ReqwestTransportErrorMapper>;

	/// Builds a reqwest client that accepts the self-signed certificates produced by `httpmock`
	/// during tests.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Constructs a [`Handoff`] backed by in-memory store + directory backends and the insecure
	/// reqwest transports used across integration tests.
	pub fn build_reqwest_test_handoff(
		descriptor: ProviderDescriptor,
		config: HandoffConfig,
	) -> (ReqwestTestHandoff, Arc<MemoryStore>, Arc<MemoryDirectory>) {
		let store_backend = Arc::new(MemoryStore::default());
		let directory_backend = Arc::new(MemoryDirectory::default());
		let store: Arc<dyn HandoffStore> = store_backend.clone();
		let directory: Arc<dyn UserDirectory> = directory_backend.clone();
		let key_client: Arc<dyn KeySetClient> =
			Arc::new(ReqwestKeySetClient::with_client(test_reqwest_client()));
		let handoff = Handoff::with_http_client(
			store,
			directory,
			key_client,
			descriptor,
			config,
			ReqwestExchange::with_client(test_reqwest_client()),
			Arc::new(ReqwestTransportErrorMapper),
		);

		(handoff, store_backend, directory_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
// The crate depends on itself in dev mode so integration tests see the `test` feature.
#[cfg(test)] use oauth2_handoff as _;
