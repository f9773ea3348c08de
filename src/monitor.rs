// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Monitor facade
//!
//! Wires the registry, classifier, enforcement layers, and the alert gate
//! into one object with the lifecycle the host application drives: register
//! assets, process rendered output, accept client reports, review pending
//! scripts, tear down.

use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::enforce::{
    enforce_assets, enforce_output, AssetRegistry, DeclinedSet, DomWatcher, EnforcedOutput,
};
use crate::error::Result;
use crate::fingerprint::RemoteSizer;
use crate::notify::{DigestOutcome, MailSink, NotificationGate, TracingMailSink};
use crate::observe::{
    build_bootstrap, scan_assets, scan_output, PageBootstrap, ReportHandler, ReportResponse,
    ScriptReport,
};
use crate::registry::{Classifier, Disposition, MemoryStore, Outcome, ScriptRecord, ScriptStore};

/// The script monitor: observation, classification, enforcement, alerting
pub struct ScriptMonitor<S: ScriptStore = MemoryStore> {
    config: MonitorConfig,
    store: Arc<S>,
    classifier: Classifier<S>,
    reporter: ReportHandler<S>,
    assets: AssetRegistry,
    gate: NotificationGate,
    sink: Box<dyn MailSink>,
    sizer: Option<RemoteSizer>,
}

impl ScriptMonitor<MemoryStore> {
    /// Monitor over an in-memory store with log-only alert delivery
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_parts(config, Arc::new(MemoryStore::new()), Box::new(TracingMailSink))
    }
}

impl<S: ScriptStore> ScriptMonitor<S> {
    /// Monitor over a caller-provided store and mail transport
    pub fn with_parts(config: MonitorConfig, store: Arc<S>, sink: Box<dyn MailSink>) -> Self {
        let classifier = Classifier::new(store.clone());
        let reporter = ReportHandler::new(classifier.clone(), config.site_url.clone());
        let gate = NotificationGate::new(&config);
        let sizer = if config.fetch_remote_sizes {
            Some(RemoteSizer::new(config.remote_fetch_timeout))
        } else {
            None
        };
        Self {
            config,
            store,
            classifier,
            reporter,
            assets: AssetRegistry::new(),
            gate,
            sink,
            sizer,
        }
    }

    /// The backing store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The asset registry the host registers scripts into
    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    /// Report handler for serving the client report channel
    pub fn reporter(&self) -> ReportHandler<S> {
        self.reporter.clone()
    }

    /// Classify every registered asset, then maybe alert
    pub async fn observe_assets(&self) -> Result<Vec<Outcome>> {
        let outcomes = scan_assets(
            &self.classifier,
            &self.assets,
            &self.config.site_url,
            self.sizer.as_ref(),
        )
        .await?;
        self.maybe_alert(&outcomes).await?;
        Ok(outcomes)
    }

    /// Drop declined entries from the asset registry before emission
    pub async fn enforce_registered(&self) -> Result<Vec<String>> {
        let declined = self.declined_set().await?;
        Ok(enforce_assets(&self.assets, &declined))
    }

    /// Process one rendered response body: excise declined scripts, classify
    /// the inline scripts that remain, and maybe alert
    pub async fn process_output(&self, body: &str) -> Result<EnforcedOutput> {
        let declined = self.declined_set().await?;
        let output = enforce_output(body, &declined)?;

        let outcomes = scan_output(&self.classifier, &output.html).await?;
        self.maybe_alert(&outcomes).await?;
        Ok(output)
    }

    /// Handle one client report, then maybe alert
    pub async fn handle_report(&self, report: ScriptReport) -> Result<ReportResponse> {
        let response = self.reporter.handle(report).await;
        if let Some(outcome) = response.outcome {
            self.maybe_alert(&[outcome]).await?;
        }
        Ok(response)
    }

    /// Bootstrap payload for the client watcher
    pub async fn bootstrap(&self) -> Result<PageBootstrap> {
        build_bootstrap(self.store.as_ref(), &self.config.site_url).await
    }

    /// A DOM watcher primed with the current bootstrap data
    pub async fn watcher(&self) -> Result<DomWatcher> {
        let bootstrap = self.bootstrap().await?;
        Ok(DomWatcher::new(
            &bootstrap,
            self.config.site_url.clone(),
            self.config.watcher_queue_capacity,
        ))
    }

    /// Scripts awaiting review, newest first
    pub async fn pending(&self) -> Result<Vec<ScriptRecord>> {
        self.store.pending().await
    }

    /// Number of scripts awaiting review
    pub async fn pending_count(&self) -> Result<usize> {
        self.store.count(Disposition::Pending).await
    }

    /// Authorize every variant of a hash; returns how many records changed
    pub async fn authorize(&self, hash: &str) -> Result<usize> {
        let changed = self
            .store
            .set_disposition(hash, Disposition::Authorized)
            .await?;
        tracing::info!(hash, changed, "script authorized");
        Ok(changed)
    }

    /// Decline every variant of a hash; returns how many records changed
    pub async fn decline(&self, hash: &str) -> Result<usize> {
        let changed = self
            .store
            .set_disposition(hash, Disposition::Declined)
            .await?;
        tracing::info!(hash, changed, "script declined");
        Ok(changed)
    }

    /// Send the pending digest now, ignoring the cooldown window
    pub async fn force_send_digest(&self) -> Result<DigestOutcome> {
        self.gate
            .force_send_digest(self.store.as_ref(), self.sink.as_ref())
            .await
    }

    /// Send a test message through the mail transport
    pub async fn send_test_message(&self) -> bool {
        self.gate.send_test_message(self.sink.as_ref()).await
    }

    /// Drop all monitor state: registry records and registered assets
    pub async fn teardown(&self) -> Result<()> {
        self.store.clear().await?;
        for asset in self.assets.snapshot() {
            self.assets.deregister(&asset.handle);
            self.assets.dequeue(&asset.handle);
        }
        tracing::info!("monitor state cleared");
        Ok(())
    }

    async fn declined_set(&self) -> Result<DeclinedSet> {
        Ok(DeclinedSet::from_records(
            &self.store.declined().await?,
            &self.config.site_url,
        ))
    }

    async fn maybe_alert(&self, outcomes: &[Outcome]) -> Result<()> {
        if outcomes.iter().any(Outcome::alert_eligible) {
            self.gate
                .maybe_send_digest(self.store.as_ref(), self.sink.as_ref())
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use url::Url;

    use super::*;
    use crate::fingerprint::fingerprint_inline;

    #[derive(Default)]
    struct CountingSink {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl MailSink for CountingSink {
        async fn send(&self, _to: &str, _subject: &str, _body: &str, _html: bool) -> bool {
            self.sent.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn config() -> MonitorConfig {
        MonitorConfig::new(Url::parse("https://shop.example.com").unwrap())
            .recipient("security@example.com")
    }

    fn monitor(sink: Box<dyn MailSink>) -> ScriptMonitor {
        ScriptMonitor::with_parts(config(), Arc::new(MemoryStore::new()), sink)
    }

    #[tokio::test]
    async fn test_full_review_cycle() {
        let monitor = monitor(Box::new(TracingMailSink));
        let body = "<body><script>evil()</script></body>";

        // First render: script observed, nothing declined yet.
        let out = monitor.process_output(body).await.unwrap();
        assert_eq!(out.removed, 0);
        assert_eq!(monitor.pending().await.unwrap().len(), 1);

        // Operator declines it.
        let hash = fingerprint_inline("evil()").hash;
        assert_eq!(monitor.decline(&hash).await.unwrap(), 1);
        assert!(monitor.pending().await.unwrap().is_empty());

        // Next render: excised.
        let out = monitor.process_output(body).await.unwrap();
        assert_eq!(out.removed, 1);
        assert!(!out.html.contains("evil()"));
    }

    #[tokio::test]
    async fn test_registered_asset_enforcement() {
        let monitor = monitor(Box::new(TracingMailSink));
        monitor.assets().register("tracker", "https://evil.example.net/t.js");
        monitor.assets().register("app", "/js/app.js");

        monitor.observe_assets().await.unwrap();

        let hash = crate::fingerprint::fingerprint_url("https://evil.example.net/t.js")
            .unwrap()
            .hash;
        monitor.decline(&hash).await.unwrap();

        let removed = monitor.enforce_registered().await.unwrap();
        assert_eq!(removed, vec!["tracker".to_string()]);
        assert_eq!(monitor.assets().snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_declined_relative_asset_blocked_across_versions() {
        let monitor = monitor(Box::new(TracingMailSink));
        monitor.assets().register("app", "/js/app.js?v=1");
        monitor.observe_assets().await.unwrap();

        let site = Url::parse("https://shop.example.com").unwrap();
        let hash = crate::fingerprint::fingerprint_url_with_base("/js/app.js?v=1", &site)
            .unwrap()
            .hash;
        assert_eq!(monitor.decline(&hash).await.unwrap(), 1);

        // Re-registered under a new query string: still blocked.
        monitor.assets().register("app", "/js/app.js?v=2");
        let removed = monitor.enforce_registered().await.unwrap();
        assert_eq!(removed, vec!["app".to_string()]);
        assert!(monitor.assets().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_new_pending_triggers_one_digest() {
        let sink = Arc::new(CountingSink::default());

        struct Shared(Arc<CountingSink>);
        #[async_trait]
        impl MailSink for Shared {
            async fn send(&self, to: &str, subject: &str, body: &str, html: bool) -> bool {
                self.0.send(to, subject, body, html).await
            }
        }

        let monitor = monitor(Box::new(Shared(sink.clone())));

        monitor
            .process_output("<body><script>a()</script></body>")
            .await
            .unwrap();
        assert_eq!(sink.sent.load(Ordering::SeqCst), 1);

        // A second new script within the cooldown window stays quiet.
        monitor
            .process_output("<body><script>b()</script></body>")
            .await
            .unwrap();
        assert_eq!(sink.sent.load(Ordering::SeqCst), 1);

        // Re-observing known scripts never alerts.
        monitor
            .process_output("<body><script>a()</script></body>")
            .await
            .unwrap();
        assert_eq!(sink.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_report_channel_feeds_same_registry() {
        let monitor = monitor(Box::new(TracingMailSink));
        let response = monitor
            .handle_report(ScriptReport::from_src("https://cdn.example.net/lib.js"))
            .await
            .unwrap();
        assert!(response.accepted);
        assert_eq!(monitor.pending().await.unwrap().len(), 1);

        // The watcher built from the same monitor sees the store's state.
        let hash = crate::fingerprint::fingerprint_url("https://cdn.example.net/lib.js")
            .unwrap()
            .hash;
        monitor.decline(&hash).await.unwrap();
        let bootstrap = monitor.bootstrap().await.unwrap();
        assert_eq!(
            bootstrap.declined,
            vec!["https://cdn.example.net/lib.js".to_string()]
        );
    }

    #[tokio::test]
    async fn test_teardown_clears_everything() {
        let monitor = monitor(Box::new(TracingMailSink));
        monitor.assets().register("app", "/js/app.js");
        monitor
            .process_output("<body><script>a()</script></body>")
            .await
            .unwrap();

        monitor.teardown().await.unwrap();
        assert!(monitor.pending().await.unwrap().is_empty());
        assert!(monitor.assets().snapshot().is_empty());
    }
}
