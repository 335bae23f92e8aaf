//! PKCE verifier and challenge generation (RFC 7636, S256).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

use super::config::OutlookConfig;

/// A PKCE code verifier and its derived S256 challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkcePair {
    /// Hex-encoded random verifier, 64 characters.
    pub verifier: String,
    /// Base64url (unpadded) SHA-256 digest of the verifier.
    pub challenge: String,
}

impl PkcePair {
    /// Generates a fresh verifier from 32 random bytes and derives its
    /// challenge.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let bytes: [u8; 32] = rng.random();
        let verifier: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Derives the S256 challenge for a verifier.
pub fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Builds the authorization URL for the given configuration and challenge.
///
/// `prompt=select_account` forces the account picker so a user signed
/// into the wrong account can switch.
pub fn authorize_url(config: &OutlookConfig, challenge: &str) -> ProviderResult<String> {
    let mut url = Url::parse(&config.authorize_url)
        .map_err(|e| ProviderError::configuration("invalid authorize_url").with_source(e))?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", &config.scopes)
        .append_pair("code_challenge", challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair("prompt", "select_account");
    Ok(url.into())
}
