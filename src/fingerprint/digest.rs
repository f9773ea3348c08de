// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Fingerprint derivation
//!
//! External and internal scripts are identified by their normalized source
//! URL (scheme + host + path, query and fragment stripped); inline scripts
//! by their raw body. The paired size is the byte length of the hashed
//! input, never the remote file's length - re-fingerprinting must never
//! touch the network.

use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::Result;

/// Stable (hash, size) identity of a script
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    /// SHA-256 hex digest of the normalized source or inline body
    pub hash: String,
    /// Byte length of the hashed input
    pub size: u64,
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hash, self.size)
    }
}

/// Normalize a script source URL: strip query string and fragment,
/// keep scheme + host + path.
///
/// This is the single normalizer shared by registration-time, render-time,
/// and DOM-watcher matching. A script blocked in one context must match in
/// every other regardless of query-string noise.
pub fn normalize_source(raw: &str) -> Result<String> {
    let mut url = Url::parse(raw)?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.into())
}

/// Normalize a possibly-relative script source against a base URL
pub fn normalize_source_with_base(raw: &str, base: &Url) -> Result<String> {
    let mut url = base.join(raw)?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.into())
}

/// Fingerprint a script by source URL
pub fn fingerprint_url(raw: &str) -> Result<Fingerprint> {
    let normalized = normalize_source(raw)?;
    Ok(Fingerprint {
        hash: hex_digest(normalized.as_bytes()),
        size: normalized.len() as u64,
    })
}

/// Fingerprint a possibly-relative script source against a base URL
pub fn fingerprint_url_with_base(raw: &str, base: &Url) -> Result<Fingerprint> {
    let normalized = normalize_source_with_base(raw, base)?;
    Ok(Fingerprint {
        hash: hex_digest(normalized.as_bytes()),
        size: normalized.len() as u64,
    })
}

/// Fingerprint an inline script body
pub fn fingerprint_inline(body: &str) -> Fingerprint {
    Fingerprint {
        hash: hex_digest(body.as_bytes()),
        size: body.len() as u64,
    }
}

/// Extract the host of a script source, if it has one
pub fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
