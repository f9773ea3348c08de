// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Client report channel
//!
//! Accepts asynchronous reports from the browser watcher for any script
//! element it observes, including ones injected after initial render. The
//! channel is idempotent under the classify rules: repeated reports of an
//! authorized matching script are recognized and dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fingerprint::{fingerprint_inline, fingerprint_url_with_base, host_of};
use crate::registry::{Candidate, Classifier, Origin, Outcome, ScriptStore};

/// A script sighting reported by the client watcher
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptReport {
    /// Source URL, if the script has one
    #[serde(default)]
    pub src: Option<String>,
    /// Inline body, if the script has no source
    #[serde(default)]
    pub content: Option<String>,
    /// Surrounding DOM snippet, for display
    #[serde(default)]
    pub context: Option<String>,
}

impl ScriptReport {
    /// Report a src-based script
    pub fn from_src(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Default::default()
        }
    }

    /// Report an inline script
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Attach the surrounding DOM snippet
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Outcome of one report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    /// Whether the report was processed
    pub accepted: bool,
    /// Human-readable outcome
    pub message: String,
    /// Classification outcome, absent when the report was rejected
    #[serde(skip)]
    pub outcome: Option<Outcome>,
}

impl ReportResponse {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            message: message.into(),
            outcome: None,
        }
    }
}

/// Anything the watcher can deliver reports to
#[async_trait]
pub trait ScriptReporter: Send + Sync {
    /// Deliver one report; fire-and-forget from the watcher's perspective
    async fn report(&self, report: ScriptReport) -> ReportResponse;
}

/// Processes client reports through the classifier
#[derive(Debug)]
pub struct ReportHandler<S: ScriptStore> {
    classifier: Classifier<S>,
    site: Url,
}

impl<S: ScriptStore> Clone for ReportHandler<S> {
    fn clone(&self) -> Self {
        Self {
            classifier: self.classifier.clone(),
            site: self.site.clone(),
        }
    }
}

impl<S: ScriptStore> ReportHandler<S> {
    /// Create a handler for a site
    pub fn new(classifier: Classifier<S>, site: Url) -> Self {
        Self { classifier, site }
    }

    /// Handle one report
    pub async fn handle(&self, report: ScriptReport) -> ReportResponse {
        let src = report.src.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let content = report
            .content
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let candidate = match (src, content) {
            (Some(src), _) => {
                let fingerprint = match fingerprint_url_with_base(src, &self.site) {
                    Ok(fp) => fp,
                    Err(e) => {
                        return ReportResponse::rejected(format!("unusable script source: {}", e))
                    }
                };
                let origin = match host_of(src) {
                    Some(host) if host != self.site.host_str().unwrap_or("") => Origin::External,
                    _ => Origin::Internal,
                };
                Candidate::from_url(fingerprint, origin, src)
                    .with_context(report.context.clone())
            }
            (None, Some(body)) => Candidate::from_inline(fingerprint_inline(body), body)
                .with_context(report.context.clone()),
            (None, None) => {
                return ReportResponse::rejected("script report carries no source or content")
            }
        };

        match self.classifier.observe(candidate).await {
            Ok(outcome) => ReportResponse {
                accepted: true,
                message: outcome_message(outcome).to_string(),
                outcome: Some(outcome),
            },
            Err(e) => {
                // Fail open: the observation is dropped, the page is not.
                tracing::warn!(error = %e, "report observation dropped");
                ReportResponse::rejected("store unavailable, observation dropped")
            }
        }
    }
}

fn outcome_message(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Inserted | Outcome::Refreshed => "script logged as pending",
        Outcome::Demoted => "script logged as pending due to size mismatch",
        Outcome::AlreadyAuthorized => "script is already authorized and will not be logged",
        Outcome::DeclinedSticky => "script is declined and will not be logged",
    }
}

#[async_trait]
impl<S: ScriptStore> ScriptReporter for ReportHandler<S> {
    async fn report(&self, report: ScriptReport) -> ReportResponse {
        self.handle(report).await
    }
}
