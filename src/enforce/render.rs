// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Render-time enforcement
//!
//! Excises declined scripts from a fully rendered response body. Inline
//! scripts match by body fingerprint or by exact textual equality with a
//! declined record's stored content; src scripts match by fingerprint or
//! normalized source, with relative sources resolved against the site.

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use url::Url;

use crate::error::Result;
use crate::fingerprint::{fingerprint_inline, fingerprint_url_with_base, normalize_source_with_base};
use crate::html;
use crate::registry::ScriptRecord;

/// Snapshot of the declined records, indexed for matching
///
/// Built once per request from the registry; enforcement reads are
/// snapshot reads, a script declined mid-request may render once more.
/// Sources are resolved against the site URL so a record stored with a
/// relative src matches the same script under any query string.
#[derive(Debug, Clone)]
pub struct DeclinedSet {
    site: Url,
    hashes: HashSet<String>,
    /// Normalized source URLs (same normalization as the client watcher)
    sources: HashSet<String>,
    /// Raw inline bodies, for exact textual matching
    bodies: HashSet<String>,
    /// Base64 of inline bodies, the membership form shipped to the client
    inline_b64: HashSet<String>,
}

impl DeclinedSet {
    /// Build from declined registry records
    pub fn from_records(records: &[ScriptRecord], site: &Url) -> Self {
        let mut set = Self {
            site: site.clone(),
            hashes: HashSet::new(),
            sources: HashSet::new(),
            bodies: HashSet::new(),
            inline_b64: HashSet::new(),
        };
        for record in records {
            set.hashes.insert(record.hash.clone());
            if let Some(url) = record.source.url() {
                match normalize_source_with_base(url, site) {
                    Ok(normalized) => {
                        set.sources.insert(normalized);
                    }
                    Err(_) => {
                        // Stored malformed; match it verbatim.
                        set.sources.insert(url.to_string());
                    }
                }
            }
            if let Some(body) = record.source.inline() {
                if !body.is_empty() {
                    set.bodies.insert(body.to_string());
                    set.inline_b64.insert(BASE64.encode(body));
                }
            }
        }
        set
    }

    /// Whether there is anything to enforce
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty() && self.sources.is_empty() && self.bodies.is_empty()
    }

    /// Match a script source: fingerprint hash or normalized form, with
    /// relative sources resolved against the site
    pub fn matches_src(&self, raw: &str) -> bool {
        match normalize_source_with_base(raw, &self.site) {
            Ok(normalized) => {
                if self.sources.contains(&normalized) {
                    return true;
                }
                fingerprint_url_with_base(raw, &self.site)
                    .map(|fp| self.hashes.contains(&fp.hash))
                    .unwrap_or(false)
            }
            Err(_) => self.sources.contains(raw),
        }
    }

    /// Match an inline body: fingerprint hash or exact text
    pub fn matches_body(&self, body: &str) -> bool {
        self.bodies.contains(body) || self.hashes.contains(&fingerprint_inline(body).hash)
    }

    /// The membership list shipped to the client watcher:
    /// normalized sources plus base64 inline bodies
    pub fn membership_list(&self) -> Vec<String> {
        let mut list: Vec<String> = self
            .sources
            .iter()
            .chain(self.inline_b64.iter())
            .cloned()
            .collect();
        list.sort();
        list
    }
}

/// Result of render-time enforcement
#[derive(Debug)]
pub struct EnforcedOutput {
    /// The filtered document
    pub html: String,
    /// Number of excised script elements
    pub removed: usize,
}

/// Excise every declined script element from a rendered document.
///
/// Processes the complete response body as a parsed tree; removal is
/// element-level, keyed by fingerprint or stored-content match.
pub fn enforce_output(body: &str, declined: &DeclinedSet) -> Result<EnforcedOutput> {
    if declined.is_empty() {
        return Ok(EnforcedOutput {
            html: body.to_string(),
            removed: 0,
        });
    }

    let dom = html::parse(body)?;
    let mut removed = 0;

    for tag in html::collect_scripts(&dom) {
        let blocked = match tag.src {
            Some(ref src) => declined.matches_src(src),
            None => !tag.body.is_empty() && declined.matches_body(&tag.body),
        };

        if blocked {
            tracing::warn!(
                src = tag.src.as_deref().unwrap_or("(inline)"),
                "excised declined script from output"
            );
            html::detach(&tag);
            removed += 1;
        }
    }

    if removed == 0 {
        return Ok(EnforcedOutput {
            html: body.to_string(),
            removed: 0,
        });
    }

    Ok(EnforcedOutput {
        html: html::to_html(&dom)?,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint_url;
    use crate::registry::{Disposition, Origin, ScriptSource};

    fn site() -> Url {
        Url::parse("https://shop.example.com").unwrap()
    }

    fn declined_inline(body: &str) -> ScriptRecord {
        let fp = fingerprint_inline(body);
        let mut record =
            ScriptRecord::pending(&fp, Origin::Inline, ScriptSource::Inline(body.to_string()));
        record.disposition = Disposition::Declined;
        record
    }

    fn declined_url(url: &str) -> ScriptRecord {
        let fp = fingerprint_url(url).unwrap();
        let mut record =
            ScriptRecord::pending(&fp, Origin::External, ScriptSource::Url(url.to_string()));
        record.disposition = Disposition::Declined;
        record
    }

    #[test]
    fn test_inline_excised_by_hash() {
        let declined = DeclinedSet::from_records(&[declined_inline("console.log(1)")], &site());
        let body = "<body><script>console.log(1)</script><script>ok()</script></body>";

        let out = enforce_output(body, &declined).unwrap();
        assert_eq!(out.removed, 1);
        assert!(!out.html.contains("console.log(1)"));
        assert!(out.html.contains("ok()"));
    }

    #[test]
    fn test_inline_excised_in_different_enclosing_element() {
        // Declined content reappearing under a new parent is still matched
        // by stored-content equality.
        let declined = DeclinedSet::from_records(&[declined_inline("console.log(1)")], &site());
        let body = "<body><div class=\"new-wrapper\"><script>console.log(1)</script></div></body>";

        let out = enforce_output(body, &declined).unwrap();
        assert_eq!(out.removed, 1);
        assert!(!out.html.contains("console.log(1)"));
        assert!(out.html.contains("new-wrapper"));
    }

    #[test]
    fn test_src_excised_despite_query_string() {
        let declined = DeclinedSet::from_records(
            &[declined_url("https://evil.example.net/payload.js?v=1")],
            &site(),
        );
        let body =
            r#"<body><script src="https://evil.example.net/payload.js?v=999"></script></body>"#;

        let out = enforce_output(body, &declined).unwrap();
        assert_eq!(out.removed, 1);
        assert!(!out.html.contains("payload.js"));
    }

    #[test]
    fn test_relative_declined_src_excised() {
        // A record stored with a relative src resolves against the site and
        // still matches under a different query string.
        let fp = fingerprint_url_with_base("/js/app.js?v=1", &site()).unwrap();
        let mut record = ScriptRecord::pending(
            &fp,
            Origin::Internal,
            ScriptSource::Url("/js/app.js?v=1".to_string()),
        );
        record.disposition = Disposition::Declined;
        let declined = DeclinedSet::from_records(&[record], &site());

        let body = r#"<body><script src="/js/app.js?v=2"></script></body>"#;
        let out = enforce_output(body, &declined).unwrap();
        assert_eq!(out.removed, 1);
        assert!(!out.html.contains("app.js"));

        // The membership list ships the absolute normalized form the client
        // watcher resolves to.
        assert_eq!(
            declined.membership_list(),
            vec!["https://shop.example.com/js/app.js".to_string()]
        );
    }

    #[test]
    fn test_multiline_body_matched() {
        let body_text = "\nlet a = 1;\nsend(a);\n";
        let declined = DeclinedSet::from_records(&[declined_inline(body_text)], &site());
        let body = format!("<body><script>{}</script></body>", body_text);

        let out = enforce_output(&body, &declined).unwrap();
        assert_eq!(out.removed, 1);
        assert!(!out.html.contains("send(a);"));
    }

    #[test]
    fn test_empty_declined_set_is_passthrough() {
        let declined = DeclinedSet::from_records(&[], &site());
        let body = "<body><script>anything()</script></body>";
        let out = enforce_output(body, &declined).unwrap();
        assert_eq!(out.removed, 0);
        assert_eq!(out.html, body);
    }

    #[test]
    fn test_unrelated_scripts_untouched() {
        let declined = DeclinedSet::from_records(&[declined_inline("console.log(1)")], &site());
        let body = "<body><script>console.log(2)</script></body>";
        let out = enforce_output(body, &declined).unwrap();
        assert_eq!(out.removed, 0);
    }

    #[test]
    fn test_membership_list_shape() {
        let declined = DeclinedSet::from_records(
            &[
                declined_inline("console.log(1)"),
                declined_url("https://evil.example.net/payload.js?v=1"),
            ],
            &site(),
        );
        let list = declined.membership_list();

        assert!(list.contains(&"https://evil.example.net/payload.js".to_string()));
        assert!(list.contains(&BASE64.encode("console.log(1)")));
    }
}
