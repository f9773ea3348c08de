// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Mail delivery seam
//!
//! Alerts go out through whatever transport the host application provides.
//! The default sink only logs; real deployments plug in their own.

use async_trait::async_trait;

/// Transport for outgoing alert mail
#[async_trait]
pub trait MailSink: Send + Sync {
    /// Deliver one message; returns whether the transport accepted it
    async fn send(&self, to: &str, subject: &str, body: &str, html: bool) -> bool;
}

/// Sink that emits messages to the log instead of sending them
#[derive(Debug, Default)]
pub struct TracingMailSink;

#[async_trait]
impl MailSink for TracingMailSink {
    async fn send(&self, to: &str, subject: &str, body: &str, html: bool) -> bool {
        tracing::info!(to, subject, html, bytes = body.len(), "alert message");
        true
    }
}
