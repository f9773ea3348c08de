// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Server-side observation producers
//!
//! The registered-asset scan and the rendered-output scan. Both are
//! fail-open: an observation that cannot be classified is logged and
//! dropped rather than failing the render.

use url::Url;

use crate::enforce::AssetRegistry;
use crate::error::Result;
use crate::fingerprint::{fingerprint_url_with_base, host_of, RemoteSizer};
use crate::html;
use crate::registry::{Candidate, Classifier, Origin, Outcome, ScriptStore};

/// Classify every registered asset.
///
/// Origin is decided by host comparison with the site; remote sizes are
/// fetched best-effort for external assets when a sizer is supplied and
/// never gate the classification.
pub async fn scan_assets<S: ScriptStore>(
    classifier: &Classifier<S>,
    registry: &AssetRegistry,
    site: &Url,
    sizer: Option<&RemoteSizer>,
) -> Result<Vec<Outcome>> {
    let site_host = site.host_str().unwrap_or("");
    let mut outcomes = Vec::new();

    for asset in registry.snapshot() {
        if asset.src.is_empty() {
            continue;
        }

        let fingerprint = match fingerprint_url_with_base(&asset.src, site) {
            Ok(fp) => fp,
            Err(e) => {
                tracing::debug!(handle = %asset.handle, src = %asset.src, error = %e,
                    "skipping unfingerprintable asset");
                continue;
            }
        };

        let origin = match host_of(&asset.src) {
            Some(host) if host != site_host => Origin::External,
            _ => Origin::Internal,
        };

        let remote_size = match (origin, sizer) {
            (Origin::External, Some(sizer)) => Some(sizer.size_of(&asset.src).await),
            _ => None,
        };

        let candidate = Candidate::from_url(fingerprint, origin, asset.src.clone())
            .with_remote_size(remote_size);

        match classifier.observe(candidate).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                // Fail open: drop this observation, keep scanning.
                tracing::warn!(src = %asset.src, error = %e, "asset observation dropped");
            }
        }
    }

    Ok(outcomes)
}

/// Classify every inline script in a rendered document
pub async fn scan_output<S: ScriptStore>(
    classifier: &Classifier<S>,
    body: &str,
) -> Result<Vec<Outcome>> {
    let dom = html::parse(body)?;
    let mut outcomes = Vec::new();

    for tag in html::collect_scripts(&dom) {
        if !tag.is_inline() {
            continue;
        }

        let candidate = Candidate::from_inline(
            crate::fingerprint::fingerprint_inline(&tag.body),
            tag.body.clone(),
        );
        match classifier.observe(candidate).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                tracing::warn!(error = %e, "inline observation dropped");
            }
        }
    }

    Ok(outcomes)
}
