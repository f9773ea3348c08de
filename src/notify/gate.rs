// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Digest gate
//!
//! Rate-limits the pending-script digest: at most one alert per cooldown
//! window no matter how many observations arrive. The gate timestamp is
//! written before the digest is composed, so two racing triggers cannot
//! both pass the window check and send.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::time::Duration;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::notify::MailSink;
use crate::registry::{ScriptRecord, ScriptStore};

/// Why a digest was or was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestOutcome {
    /// Digest handed to the mail sink
    Sent,
    /// No recipients configured
    NoRecipients,
    /// Nothing pending to report
    NothingPending,
    /// A digest already went out within the cooldown window
    Cooldown,
}

/// Rate-limited pending-script digest
pub struct NotificationGate {
    recipients: Vec<String>,
    cooldown: Duration,
    max_rows: usize,
    last_sent: RwLock<Option<DateTime<Utc>>>,
}

impl NotificationGate {
    /// Create a gate from monitor configuration
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            recipients: config.alert_recipients.clone(),
            cooldown: config.alert_cooldown,
            max_rows: config.digest_max_rows,
            last_sent: RwLock::new(None),
        }
    }

    /// When the last digest went out
    pub fn last_sent(&self) -> Option<DateTime<Utc>> {
        *self.last_sent.read()
    }

    /// Send the pending digest unless the cooldown window is still open
    pub async fn maybe_send_digest<S: ScriptStore>(
        &self,
        store: &S,
        sink: &dyn MailSink,
    ) -> Result<DigestOutcome> {
        if self.recipients.is_empty() {
            return Ok(DigestOutcome::NoRecipients);
        }

        let pending = store.pending().await?;
        if pending.is_empty() {
            return Ok(DigestOutcome::NothingPending);
        }

        {
            let mut last_sent = self.last_sent.write();
            if let Some(at) = *last_sent {
                let elapsed = (Utc::now() - at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                if elapsed < self.cooldown {
                    tracing::debug!(
                        pending = pending.len(),
                        "digest suppressed, cooldown window open"
                    );
                    return Ok(DigestOutcome::Cooldown);
                }
            }
            // Close the gate before composing, not after sending.
            *last_sent = Some(Utc::now());
        }

        self.deliver(&pending, sink).await;
        Ok(DigestOutcome::Sent)
    }

    /// Reset the cooldown window and send the pending digest immediately
    pub async fn force_send_digest<S: ScriptStore>(
        &self,
        store: &S,
        sink: &dyn MailSink,
    ) -> Result<DigestOutcome> {
        *self.last_sent.write() = None;
        self.maybe_send_digest(store, sink).await
    }

    /// Send a plain test message to verify the mail transport
    pub async fn send_test_message(&self, sink: &dyn MailSink) -> bool {
        let Some(first) = self.recipients.first() else {
            return false;
        };
        sink.send(
            first,
            "Script monitor test message",
            "If you can read this, alert delivery works.",
            false,
        )
        .await
    }

    async fn deliver(&self, pending: &[ScriptRecord], sink: &dyn MailSink) {
        let subject = format!("{} new unreviewed scripts detected", pending.len());
        let body = compose_digest(pending, self.max_rows);
        for recipient in &self.recipients {
            let accepted = sink.send(recipient, &subject, &body, true).await;
            if !accepted {
                tracing::warn!(recipient = %recipient, "alert delivery refused by transport");
            }
        }
        tracing::info!(pending = pending.len(), "pending digest sent");
    }
}

/// Render the pending digest as an HTML table, capped at `max_rows`
fn compose_digest(pending: &[ScriptRecord], max_rows: usize) -> String {
    let mut body = String::from(
        "<p>The following scripts were detected and are awaiting review:</p>\
         <table border=\"1\" cellpadding=\"4\">\
         <tr><th>Source</th><th>Origin</th><th>Size</th><th>First seen</th></tr>",
    );
    for record in pending.iter().take(max_rows) {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            record.source.display(96),
            record.origin,
            record.size,
            record.last_updated.format("%Y-%m-%d %H:%M UTC"),
        ));
    }
    body.push_str("</table>");
    if pending.len() > max_rows {
        body.push_str(&format!(
            "<p>...and {} more awaiting review.</p>",
            pending.len() - max_rows
        ));
    }
    body
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::fingerprint::fingerprint_inline;
    use crate::registry::{MemoryStore, Origin, ScriptSource};

    #[derive(Default)]
    struct CountingSink {
        sent: AtomicUsize,
        last_body: Mutex<String>,
    }

    #[async_trait]
    impl MailSink for CountingSink {
        async fn send(&self, _to: &str, _subject: &str, body: &str, _html: bool) -> bool {
            self.sent.fetch_add(1, Ordering::SeqCst);
            *self.last_body.lock().unwrap() = body.to_string();
            true
        }
    }

    async fn store_with_pending(n: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..n {
            let body = format!("console.log({})", i);
            let fp = fingerprint_inline(&body);
            let record =
                ScriptRecord::pending(&fp, Origin::Inline, ScriptSource::Inline(body));
            store.upsert(record).await.unwrap();
        }
        store
    }

    fn gate(recipients: Vec<String>) -> NotificationGate {
        let mut config = MonitorConfig::default();
        config.alert_recipients = recipients;
        NotificationGate::new(&config)
    }

    #[tokio::test]
    async fn test_no_recipients_no_send() {
        let store = store_with_pending(3).await;
        let sink = CountingSink::default();
        let gate = gate(Vec::new());

        let outcome = gate.maybe_send_digest(&store, &sink).await.unwrap();
        assert_eq!(outcome, DigestOutcome::NoRecipients);
        assert_eq!(sink.sent.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nothing_pending_no_send() {
        let store = MemoryStore::new();
        let sink = CountingSink::default();
        let gate = gate(vec!["ops@example.com".to_string()]);

        let outcome = gate.maybe_send_digest(&store, &sink).await.unwrap();
        assert_eq!(outcome, DigestOutcome::NothingPending);
        assert_eq!(sink.sent.load(Ordering::SeqCst), 0);
        assert!(gate.last_sent().is_none());
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_second_digest() {
        let store = store_with_pending(2).await;
        let sink = CountingSink::default();
        let gate = gate(vec!["ops@example.com".to_string()]);

        let first = gate.maybe_send_digest(&store, &sink).await.unwrap();
        assert_eq!(first, DigestOutcome::Sent);

        // More pending rows arrive; window is still open.
        let second = gate.maybe_send_digest(&store, &sink).await.unwrap();
        assert_eq!(second, DigestOutcome::Cooldown);
        assert_eq!(sink.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_send_resets_window() {
        let store = store_with_pending(1).await;
        let sink = CountingSink::default();
        let gate = gate(vec!["ops@example.com".to_string()]);

        gate.maybe_send_digest(&store, &sink).await.unwrap();
        let forced = gate.force_send_digest(&store, &sink).await.unwrap();
        assert_eq!(forced, DigestOutcome::Sent);
        assert_eq!(sink.sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_digest_capped_with_overflow_marker() {
        let store = store_with_pending(13).await;
        let sink = CountingSink::default();
        let gate = gate(vec!["ops@example.com".to_string()]);

        gate.maybe_send_digest(&store, &sink).await.unwrap();

        let body = sink.last_body.lock().unwrap().clone();
        assert_eq!(body.matches("<tr><td>").count(), 10);
        assert!(body.contains("<td>inline</td>"));
        assert!(body.contains("...and 3 more awaiting review."));
    }

    #[tokio::test]
    async fn test_digest_goes_to_every_recipient() {
        let store = store_with_pending(1).await;
        let sink = CountingSink::default();
        let gate = gate(vec![
            "ops@example.com".to_string(),
            "security@example.com".to_string(),
        ]);

        gate.maybe_send_digest(&store, &sink).await.unwrap();
        assert_eq!(sink.sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_test_message_uses_first_recipient() {
        let sink = CountingSink::default();
        let gate = gate(vec!["ops@example.com".to_string()]);
        assert!(gate.send_test_message(&sink).await);
        assert_eq!(sink.sent.load(Ordering::SeqCst), 1);
    }
}
