// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Classification state machine
//!
//! Per hash: unseen -> pending -> {authorized, declined}; authorized drops
//! back to pending when the same hash reappears with a different size;
//! declined is absorbing. Rules run in a fixed priority order on every
//! observation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::record::{Disposition, Origin, ScriptRecord, ScriptSource};
use super::store::ScriptStore;
use crate::error::Result;
use crate::fingerprint::Fingerprint;

/// One observed script, ready for classification
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Identity of the observed script
    pub fingerprint: Fingerprint,
    /// Host-relative origin
    pub origin: Origin,
    /// Source URL or inline body, as observed
    pub source: ScriptSource,
    /// Informational remote size, if one was fetched
    pub remote_size: Option<u64>,
    /// Surrounding DOM snippet, for display
    pub context: Option<String>,
}

impl Candidate {
    /// Candidate for a src-based script
    pub fn from_url(fingerprint: Fingerprint, origin: Origin, url: impl Into<String>) -> Self {
        Self {
            fingerprint,
            origin,
            source: ScriptSource::Url(url.into()),
            remote_size: None,
            context: None,
        }
    }

    /// Candidate for an inline script
    pub fn from_inline(fingerprint: Fingerprint, body: impl Into<String>) -> Self {
        Self {
            fingerprint,
            origin: Origin::Inline,
            source: ScriptSource::Inline(body.into()),
            remote_size: None,
            context: None,
        }
    }

    /// Attach an informational remote size
    pub fn with_remote_size(mut self, remote_size: Option<u64>) -> Self {
        self.remote_size = remote_size;
        self
    }

    /// Attach a display context
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    fn into_record(self) -> ScriptRecord {
        ScriptRecord::pending(&self.fingerprint, self.origin, self.source)
            .with_remote_size(self.remote_size)
            .with_context(self.context)
    }
}

/// Result of classifying one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// First observation of this hash; inserted as pending
    Inserted,
    /// Hash is declined; observation ignored regardless of size
    DeclinedSticky,
    /// Authorized content drifted; old authorizations demoted to pending
    /// and a new pending variant inserted
    Demoted,
    /// Exact authorized (hash, size) match; nothing written
    AlreadyAuthorized,
    /// Known non-authorized variant re-observed; record refreshed
    Refreshed,
}

impl Outcome {
    /// Whether this observation should feed the notification gate
    pub fn alert_eligible(&self) -> bool {
        matches!(self, Outcome::Inserted)
    }

    /// Whether the observation wrote to the store
    pub fn wrote(&self) -> bool {
        !matches!(self, Outcome::DeclinedSticky | Outcome::AlreadyAuthorized)
    }
}

/// Applies the transition rules against a registry store
#[derive(Debug)]
pub struct Classifier<S: ScriptStore> {
    store: Arc<S>,
}

impl<S: ScriptStore> Clone for Classifier<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: ScriptStore> Classifier<S> {
    /// Create a classifier over a store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The backing store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Classify one observation.
    ///
    /// Rule order matters: a human decline decision can never be reverted
    /// by content drift, and an exact authorized match must stay silent so
    /// every page load does not become an alert.
    pub async fn observe(&self, candidate: Candidate) -> Result<Outcome> {
        let hash = candidate.fingerprint.hash.clone();
        let size = candidate.fingerprint.size;
        let variants = self.store.find(&hash).await?;

        if variants.is_empty() {
            self.store.upsert(candidate.into_record()).await?;
            tracing::info!(hash = %hash, size, "new script recorded as pending");
            return Ok(Outcome::Inserted);
        }

        if variants
            .iter()
            .any(|r| r.disposition == Disposition::Declined)
        {
            tracing::debug!(hash = %hash, "observation of declined script ignored");
            return Ok(Outcome::DeclinedSticky);
        }

        let authorized: Vec<_> = variants
            .iter()
            .filter(|r| r.disposition == Disposition::Authorized)
            .collect();
        if !authorized.is_empty() {
            if authorized.iter().any(|r| r.size == size) {
                return Ok(Outcome::AlreadyAuthorized);
            }
            // Authorization was granted for specific content; drift must be
            // re-reviewed, but the lapsed entry survives as pending.
            let demoted = self.store.demote_authorized(&hash).await?;
            self.store.upsert(candidate.into_record()).await?;
            tracing::warn!(
                hash = %hash,
                size,
                demoted,
                "authorized script changed size; demoted for re-review"
            );
            return Ok(Outcome::Demoted);
        }

        self.store.upsert(candidate.into_record()).await?;
        Ok(Outcome::Refreshed)
    }
}
