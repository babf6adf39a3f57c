//! PKCE material and the random values minted across the handoff.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

pub(crate) const STATE_LEN: usize = 32;
pub(crate) const PKCE_VERIFIER_LEN: usize = 64;
pub(crate) const OTT_LEN: usize = 32;
pub(crate) const SESSION_ID_LEN: usize = 24;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

#[derive(Clone)]
pub(crate) struct PkcePair {
	pub(crate) verifier: String,
	pub(crate) challenge: String,
	pub(crate) method: PkceCodeChallengeMethod,
}
impl PkcePair {
	pub(crate) fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

pub(crate) fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

pub(crate) fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(verifier.as_bytes());
	let digest = hasher.finalize();
	URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashSet;
	// self
	use super::*;

	#[test]
	fn challenge_matches_rfc_7636_appendix_b() {
		// Test vector from RFC 7636 Appendix B.
		let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

		assert_eq!(
			compute_pkce_challenge(verifier),
			"E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cK"
		);
	}

	#[test]
	fn generated_pairs_are_unique_and_sized() {
		let mut verifiers = HashSet::new();

		for _ in 0..64 {
			let pair = PkcePair::generate();

			assert_eq!(pair.verifier.len(), PKCE_VERIFIER_LEN);
			assert_eq!(pair.challenge, compute_pkce_challenge(&pair.verifier));
			assert_eq!(pair.method, PkceCodeChallengeMethod::S256);
			assert!(verifiers.insert(pair.verifier));
		}
	}

	#[test]
	fn random_strings_are_alphanumeric() {
		let value = random_string(STATE_LEN);

		assert_eq!(value.len(), STATE_LEN);
		assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
	}
}
