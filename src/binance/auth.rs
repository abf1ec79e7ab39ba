//! Request signing for Binance authenticated endpoints
//!
//! Parameters are sorted by key, joined as `key=value` with `&`, and the
//! resulting query string is signed with HMAC-SHA256 using the API secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "BINANCE_API_KEY";

/// Environment variable holding the API secret
pub const API_SECRET_ENV: &str = "BINANCE_API_SECRET";

/// Generate a lowercase hex HMAC-SHA256 signature of `payload`
///
/// # Example
///
/// ```
/// use crossover_trader::binance::auth::sign_payload;
///
/// let signature = sign_payload("symbol=BTCUSDT&timestamp=1", "secret");
/// assert_eq!(signature.len(), 64);
/// ```
pub fn sign_payload(payload: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a signature against the expected value
pub fn verify_signature(payload: &str, secret: &str, signature: &str) -> bool {
    let computed = sign_payload(payload, secret);
    constant_time_eq(computed.as_bytes(), signature.as_bytes())
}

/// Constant-time byte comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Join parameters as `key=value` pairs in byte-wise key order
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// A canonical query string and the signature computed over it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    query: String,
    signature: String,
}

impl SignedRequest {
    /// The exact bytes that were signed
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Query string to transmit: the signed string with `signature` appended last
    pub fn to_query_string(&self) -> String {
        format!("{}&signature={}", self.query, self.signature)
    }
}

impl fmt::Display for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}&signature={}", self.query, self.signature)
    }
}

/// Canonicalize and sign request parameters
///
/// A `BTreeMap<String, _>` iterates in byte-wise key order, so the string
/// built here is the canonical form regardless of insertion order.
pub fn sign(params: &BTreeMap<String, String>, secret: &str) -> SignedRequest {
    let query = canonical_query(params);
    let signature = sign_payload(&query, secret);
    SignedRequest { query, signature }
}

/// API credentials container
///
/// `Debug` is implemented by hand so neither field ever reaches a log line.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Create new credentials from API key and secret
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Create credentials from `BINANCE_API_KEY` and `BINANCE_API_SECRET`
    ///
    /// Returns the name of the first variable that is missing or blank.
    pub fn from_env() -> Result<Self, &'static str> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Credentials::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, &'static str> {
        let read = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(name)
        };
        Ok(Self::new(read(API_KEY_ENV)?, read(API_SECRET_ENV)?))
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign request parameters with this secret
    pub fn sign(&self, params: &BTreeMap<String, String>) -> SignedRequest {
        sign(params, &self.api_secret)
    }
}
