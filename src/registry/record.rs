// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Script record types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::{host_of, Fingerprint};

/// Review status of a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Observed but not yet reviewed
    Pending,
    /// Explicitly trusted for this exact (hash, size)
    Authorized,
    /// Explicitly blocked; sticky regardless of later content drift
    Declined,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Disposition::Pending => "pending",
            Disposition::Authorized => "authorized",
            Disposition::Declined => "declined",
        };
        f.write_str(s)
    }
}

/// Host-relative classification of a script's source, independent of its
/// disposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Same host as the monitored site
    Internal,
    /// Different host
    External,
    /// No source URL; body carried in the page
    Inline,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Origin::Internal => "internal",
            Origin::External => "external",
            Origin::Inline => "inline",
        };
        f.write_str(s)
    }
}

/// Where a script's identity comes from: a source URL or an inline body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptSource {
    /// Script loaded by URL (stored as observed, pre-normalization)
    Url(String),
    /// Inline script body
    Inline(String),
}

impl ScriptSource {
    /// Source URL, if this is a src-based script
    pub fn url(&self) -> Option<&str> {
        match self {
            ScriptSource::Url(u) => Some(u),
            ScriptSource::Inline(_) => None,
        }
    }

    /// Inline body, if this is an inline script
    pub fn inline(&self) -> Option<&str> {
        match self {
            ScriptSource::Url(_) => None,
            ScriptSource::Inline(body) => Some(body),
        }
    }

    /// Short display form for digests and logs
    pub fn display(&self, max: usize) -> String {
        match self {
            ScriptSource::Url(u) => u.clone(),
            ScriptSource::Inline(body) => {
                let trimmed = body.trim();
                if trimmed.len() <= max {
                    format!("(inline) {}", trimmed)
                } else {
                    let mut end = max;
                    while !trimmed.is_char_boundary(end) {
                        end -= 1;
                    }
                    format!("(inline) {}...", &trimmed[..end])
                }
            }
        }
    }
}

/// The unit of tracking: one observed (hash, size) variant of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRecord {
    /// Fingerprint hash (logical grouping key)
    pub hash: String,
    /// Fingerprint size (exact-identity discriminator within a hash)
    pub size: u64,
    /// Review status
    pub disposition: Disposition,
    /// Host-relative origin
    pub origin: Origin,
    /// Source URL or inline body
    pub source: ScriptSource,
    /// Informational remote byte length; never used for classification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_size: Option<u64>,
    /// Surrounding DOM snippet from client reports, for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Last observation or disposition change
    pub last_updated: DateTime<Utc>,
}

impl ScriptRecord {
    /// Create a pending record from a fingerprint, stamped now
    pub fn pending(fingerprint: &Fingerprint, origin: Origin, source: ScriptSource) -> Self {
        Self {
            hash: fingerprint.hash.clone(),
            size: fingerprint.size,
            disposition: Disposition::Pending,
            origin,
            source,
            remote_size: None,
            context: None,
            last_updated: Utc::now(),
        }
    }

    /// Attach a display context
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Attach an informational remote size
    pub fn with_remote_size(mut self, remote_size: Option<u64>) -> Self {
        self.remote_size = remote_size;
        self
    }

    /// Host of the source URL, if any
    pub fn host(&self) -> Option<String> {
        self.source.url().and_then(host_of)
    }
}
