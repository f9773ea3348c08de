// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Page bootstrap payload
//!
//! A JSON blob injected into the page at render time and consumed once by
//! the client-side watcher: the authorized fingerprints it uses to
//! pre-filter reports (no round trip per script per page view) and the
//! declined membership list it blocks against.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::enforce::DeclinedSet;
use crate::error::Result;
use crate::fingerprint::normalize_source;
use crate::registry::ScriptStore;

/// One authorized fingerprint shipped to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedEntry {
    /// Fingerprint hash for src entries; base64 body for inline entries
    pub hash: String,
    /// Fingerprint size
    pub size: u64,
    /// Normalized source URL, absent for inline entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

/// Bootstrap data for the client watcher
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageBootstrap {
    /// Authorized fingerprints, for report pre-filtering
    #[serde(rename = "authorizedScripts")]
    pub authorized: Vec<AuthorizedEntry>,
    /// Declined membership list: normalized sources and base64 inline bodies
    #[serde(rename = "declinedScripts")]
    pub declined: Vec<String>,
}

impl PageBootstrap {
    /// Serialize for injection into the page
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Root domain of a host: leading `www.` stripped, last two labels kept
pub fn root_domain(host: &str) -> String {
    let host = host.strip_prefix("www.").unwrap_or(host);
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        host.to_string()
    } else {
        labels[labels.len() - 2..].join(".")
    }
}

/// Build the bootstrap payload from the registry.
///
/// Authorized src entries are limited to the site's root domain; inline
/// entries are keyed by the base64 of their body, matching how the watcher
/// identifies inline scripts without hashing in the page.
pub async fn build_bootstrap<S: ScriptStore>(store: &S, site: &Url) -> Result<PageBootstrap> {
    let root = root_domain(site.host_str().unwrap_or(""));

    let mut authorized = Vec::new();
    for record in store.authorized().await? {
        if let Some(url) = record.source.url() {
            let matches_root = record
                .host()
                .map(|h| h.contains(root.as_str()))
                .unwrap_or(false);
            if matches_root {
                authorized.push(AuthorizedEntry {
                    hash: record.hash.clone(),
                    size: record.size,
                    src: normalize_source(url).ok(),
                });
            }
        }
        if let Some(body) = record.source.inline() {
            if !body.is_empty() {
                authorized.push(AuthorizedEntry {
                    hash: BASE64.encode(body),
                    size: body.len() as u64,
                    src: None,
                });
            }
        }
    }

    let declined = DeclinedSet::from_records(&store.declined().await?, site);

    Ok(PageBootstrap {
        authorized,
        declined: declined.membership_list(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{fingerprint_inline, fingerprint_url};
    use crate::registry::{Disposition, MemoryStore, Origin, ScriptRecord, ScriptSource};

    #[test]
    fn test_root_domain() {
        assert_eq!(root_domain("www.shop.example.com"), "example.com");
        assert_eq!(root_domain("shop.example.com"), "example.com");
        assert_eq!(root_domain("example.com"), "example.com");
        assert_eq!(root_domain("localhost"), "localhost");
    }

    #[tokio::test]
    async fn test_bootstrap_payload() {
        let store = MemoryStore::new();

        // Authorized internal src script
        let url = "https://shop.example.com/js/app.js?v=1";
        let fp = fingerprint_url(url).unwrap();
        let mut record =
            ScriptRecord::pending(&fp, Origin::Internal, ScriptSource::Url(url.to_string()));
        record.disposition = Disposition::Authorized;
        store.upsert(record).await.unwrap();

        // Authorized off-domain src script: not shipped
        let off = "https://cdn.unrelated.net/lib.js";
        let fp = fingerprint_url(off).unwrap();
        let mut record =
            ScriptRecord::pending(&fp, Origin::External, ScriptSource::Url(off.to_string()));
        record.disposition = Disposition::Authorized;
        store.upsert(record).await.unwrap();

        // Declined inline script
        let fp = fingerprint_inline("evil()");
        let mut record =
            ScriptRecord::pending(&fp, Origin::Inline, ScriptSource::Inline("evil()".into()));
        record.disposition = Disposition::Declined;
        store.upsert(record).await.unwrap();

        let site = Url::parse("https://www.shop.example.com").unwrap();
        let bootstrap = build_bootstrap(&store, &site).await.unwrap();

        assert_eq!(bootstrap.authorized.len(), 1);
        assert_eq!(
            bootstrap.authorized[0].src.as_deref(),
            Some("https://shop.example.com/js/app.js")
        );
        assert_eq!(bootstrap.declined, vec![BASE64.encode("evil()")]);

        let json = bootstrap.to_json().unwrap();
        assert!(json.contains("authorizedScripts"));
        assert!(json.contains("declinedScripts"));
    }

    #[tokio::test]
    async fn test_authorized_inline_entry_uses_base64_key() {
        let store = MemoryStore::new();
        let body = "console.log(1)";
        let fp = fingerprint_inline(body);
        let mut record =
            ScriptRecord::pending(&fp, Origin::Inline, ScriptSource::Inline(body.into()));
        record.disposition = Disposition::Authorized;
        store.upsert(record).await.unwrap();

        let site = Url::parse("https://shop.example.com").unwrap();
        let bootstrap = build_bootstrap(&store, &site).await.unwrap();

        assert_eq!(bootstrap.authorized.len(), 1);
        assert_eq!(bootstrap.authorized[0].hash, BASE64.encode(body));
        assert_eq!(bootstrap.authorized[0].size, body.len() as u64);
        assert!(bootstrap.authorized[0].src.is_none());
    }
}
