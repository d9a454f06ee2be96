//! Caller identity.
//!
//! Every service call carries an optional bearer token. An [`IdentityVerifier`]
//! turns it into a user id or rejects it. The shipped verifier checks compact
//! HS256 JSON Web Tokens whose claims are `{"userid": ..., "exp": ...}`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("missing token")]
    Missing,
    #[error("malformed token: {0}")]
    Malformed(&'static str),
    #[error("bad token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Resolves a bearer token to a user id.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<String, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    userid: String,
    exp: i64,
}

/// HS256 token verifier keyed by a shared secret.
#[derive(Clone)]
pub struct HmacTokenVerifier {
    keyed: HmacSha256,
}

impl HmacTokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, hmac::digest::InvalidLength> {
        Ok(Self {
            keyed: HmacSha256::new_from_slice(secret.as_ref())?,
        })
    }

    fn mac(&self) -> HmacSha256 {
        self.keyed.clone()
    }

    /// Issue a token for `user_id` expiring at `exp` (Unix seconds).
    ///
    /// Token issuance belongs to the auth service; this exists for tooling
    /// and tests that need tokens the verifier accepts.
    pub fn sign(&self, user_id: &str, exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD
            .encode(serde_json::json!({ "userid": user_id, "exp": exp }).to_string());
        let signing_input = format!("{header}.{claims}");

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{signing_input}.{signature}")
    }
}

impl IdentityVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> Result<String, IdentityError> {
        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(IdentityError::Malformed("expected three segments"));
        };
        let signing_input = &token[..header.len() + 1 + claims.len()];

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| IdentityError::Malformed("header encoding"))?;
        let header: Header = serde_json::from_slice(&header_bytes)
            .map_err(|_| IdentityError::Malformed("header json"))?;
        if header.alg != "HS256" {
            return Err(IdentityError::Malformed("unsupported alg"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| IdentityError::Malformed("signature encoding"))?;
        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| IdentityError::BadSignature)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|_| IdentityError::Malformed("claims encoding"))?;
        let claims: Claims = serde_json::from_slice(&claims_bytes)
            .map_err(|_| IdentityError::Malformed("claims json"))?;

        if claims.exp <= chrono::Utc::now().timestamp() {
            return Err(IdentityError::Expired);
        }
        if claims.userid.is_empty() {
            return Err(IdentityError::Malformed("empty userid"));
        }
        Ok(claims.userid)
    }
}

/// Check if a token secret is the insecure default.
///
/// Returns `true` if the key appears to be a placeholder that should be changed.
pub fn is_default_secret(secret: &str) -> bool {
    secret.is_empty()
        || secret == super::config::DEFAULT_TOKEN_SECRET
        || secret.contains("default")
        || secret.contains("changeme")
        || secret.len() < 16
}
