//! Storefront app proxy signatures.
//!
//! The proxy signs every forwarded request: all query parameters except
//! `signature` are sorted by key, rendered as `key=value` with no separator
//! and HMAC-SHA256'd with the app secret. Repeated keys are joined with `,`.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_PARAM: &str = "signature";

/// Render the signed message for a set of query pairs, skipping `signature`.
pub fn signing_message(params: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (k, v) in params {
        if k == SIGNATURE_PARAM {
            continue;
        }
        grouped.entry(k.as_str()).or_default().push(v.as_str());
    }
    grouped
        .into_iter()
        .map(|(k, vs)| format!("{}={}", k, vs.join(",")))
        .collect()
}

/// Lowercase hex HMAC-SHA256 of `message` under `secret`.
pub fn sign(message: &str, secret: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Check `params` against their `signature` entry. Never errors: a missing
/// or malformed signature is simply `false`.
pub fn verify(params: &[(String, String)], secret: &str) -> bool {
    let Some(provided) = params
        .iter()
        .find(|(k, _)| k == SIGNATURE_PARAM)
        .map(|(_, v)| v.as_str())
    else {
        return false;
    };
    if provided.is_empty() {
        return false;
    }
    let computed = sign(&signing_message(params), secret);
    if computed.len() != provided.len() {
        return false;
    }
    computed.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Holds the proxy secret and the development bypass switch.
#[derive(Debug, Clone)]
pub struct ProxyVerifier {
    secret: String,
    skip: bool,
}

impl ProxyVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            skip: false,
        }
    }

    /// Accept every request unverified. Local development only.
    pub fn bypass() -> Self {
        Self {
            secret: String::new(),
            skip: true,
        }
    }

    pub fn is_bypassed(&self) -> bool {
        self.skip
    }

    pub fn verify(&self, params: &[(String, String)]) -> bool {
        self.skip || verify(params, &self.secret)
    }
}
