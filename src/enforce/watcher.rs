// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Runtime DOM enforcement
//!
//! The client-side mirror of the render-time policy: every script element
//! inserted into the live document is normalized, reported, and removed if
//! it matches the declined membership list. Insertion events flow through a
//! bounded, ordered queue with a single consumer, so evaluate-then-remove
//! for one node always completes before the next node is handled.
//!
//! The watcher both scans the document present at initial load and
//! subscribes to later insertions; scripts injected after render get the
//! same treatment as server-rendered ones.

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::sync::mpsc;
use url::Url;

use crate::error::Result;
use crate::fingerprint::normalize_source_with_base;
use crate::html;
use crate::observe::{AuthorizedEntry, PageBootstrap, ScriptReport, ScriptReporter};

/// One script element as seen by the watcher
#[derive(Debug, Clone, Default)]
pub struct ScriptNode {
    /// Source URL attribute, if present
    pub src: Option<String>,
    /// Inline body, if present
    pub body: Option<String>,
    /// Surrounding DOM snippet, for display in reports
    pub context: Option<String>,
}

impl ScriptNode {
    /// Node for a src-based script
    pub fn from_src(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Default::default()
        }
    }

    /// Node for an inline script
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Default::default()
        }
    }
}

/// What the watcher did with one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    /// Matched the declined set and was removed from the DOM
    Removed,
    /// Reported to the server, left in place
    Reported,
    /// Matched an authorized fingerprint; neither reported nor removed
    Skipped,
}

/// Watches DOM insertions and enforces the declined policy
///
/// Built from the page bootstrap payload: the declined membership list it
/// blocks against and the authorized fingerprints it uses to pre-filter
/// reports, so an already-trusted script costs no network round trip.
pub struct DomWatcher {
    declined: HashSet<String>,
    authorized: Vec<AuthorizedEntry>,
    base: Url,
    events_tx: mpsc::Sender<ScriptNode>,
    events_rx: mpsc::Receiver<ScriptNode>,
}

impl DomWatcher {
    /// Create a watcher from bootstrap data
    pub fn new(bootstrap: &PageBootstrap, base: Url, queue_capacity: usize) -> Self {
        let (events_tx, events_rx) = mpsc::channel(queue_capacity);
        Self {
            declined: bootstrap.declined.iter().cloned().collect(),
            authorized: bootstrap.authorized.clone(),
            base,
            events_tx,
            events_rx,
        }
    }

    /// Sender for insertion events; producers push one message per
    /// inserted script element
    pub fn inserts(&self) -> mpsc::Sender<ScriptNode> {
        self.events_tx.clone()
    }

    /// Scan scripts already present in the document at initial load
    pub async fn scan_document(
        &self,
        body: &str,
        reporter: &dyn ScriptReporter,
    ) -> Result<Vec<NodeAction>> {
        let dom = html::parse(body)?;
        let mut actions = Vec::new();
        for tag in html::collect_scripts(&dom) {
            let node = ScriptNode {
                src: tag.src.clone(),
                body: if tag.body.is_empty() {
                    None
                } else {
                    Some(tag.body.clone())
                },
                context: None,
            };
            actions.push(self.handle_node(node, reporter).await);
        }
        Ok(actions)
    }

    /// Drain and handle every queued insertion event, in arrival order
    pub async fn process_pending(&mut self, reporter: &dyn ScriptReporter) -> Vec<NodeAction> {
        let mut actions = Vec::new();
        while let Ok(node) = self.events_rx.try_recv() {
            actions.push(self.handle_node(node, reporter).await);
        }
        actions
    }

    /// Consume insertion events until every sender is dropped
    pub async fn run(mut self, reporter: &dyn ScriptReporter) -> Vec<NodeAction> {
        // Swap out the watcher's own sender; only external producers keep
        // the queue open after this point.
        let (detached, _) = mpsc::channel(1);
        drop(std::mem::replace(&mut self.events_tx, detached));

        let mut actions = Vec::new();
        while let Some(node) = self.events_rx.recv().await {
            actions.push(self.handle_node(node, reporter).await);
        }
        actions
    }

    /// Evaluate one node: pre-filter, report, then block. Runs to
    /// completion before the caller hands over the next node.
    pub async fn handle_node(
        &self,
        node: ScriptNode,
        reporter: &dyn ScriptReporter,
    ) -> NodeAction {
        let normalized_src = node.src.as_deref().map(|src| {
            normalize_source_with_base(src, &self.base).unwrap_or_else(|_| src.to_string())
        });
        let body = node.body.as_deref().filter(|b| !b.is_empty());

        if self.is_authorized(normalized_src.as_deref(), body) {
            tracing::debug!(
                src = normalized_src.as_deref().unwrap_or("(inline)"),
                "skipping authorized script"
            );
            return NodeAction::Skipped;
        }

        let report = ScriptReport {
            src: normalized_src.clone(),
            content: body.map(str::to_string),
            context: node.context,
        };
        let response = reporter.report(report).await;
        tracing::debug!(message = %response.message, "script reported");

        if self.is_declined(normalized_src.as_deref(), body) {
            tracing::warn!(
                src = normalized_src.as_deref().unwrap_or("(inline)"),
                "blocked declined script"
            );
            return NodeAction::Removed;
        }

        NodeAction::Reported
    }

    fn is_authorized(&self, normalized_src: Option<&str>, body: Option<&str>) -> bool {
        match (normalized_src, body) {
            (Some(src), _) => self.authorized.iter().any(|entry| {
                entry.src.as_deref() == Some(src) && entry.size == src.len() as u64
            }),
            (None, Some(body)) => {
                let key = BASE64.encode(body);
                self.authorized
                    .iter()
                    .any(|entry| entry.src.is_none() && entry.hash == key
                        && entry.size == body.len() as u64)
            }
            (None, None) => false,
        }
    }

    fn is_declined(&self, normalized_src: Option<&str>, body: Option<&str>) -> bool {
        if let Some(src) = normalized_src {
            if self.declined.contains(src) {
                return true;
            }
        }
        if let Some(body) = body {
            if self.declined.contains(&BASE64.encode(body)) {
                return true;
            }
        }
        false
    }
}
