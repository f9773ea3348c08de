// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Inkwall - Script Content Monitor
//!
//! Detects, fingerprints, and polices every script a web application emits
//! or loads at runtime. Unreviewed scripts are logged as pending and
//! surfaced to an operator; declined scripts are excised from rendered
//! output, dropped from the asset registry, and blocked in the live DOM.
//!
//! ## Features
//!
//! - Fingerprinting: SHA-256 over normalized source URL or inline body
//! - Classification: pending/authorized/declined with sticky declines
//! - Drift detection: authorized scripts that change size drop back to
//!   pending for re-review
//! - Render enforcement: declined scripts excised from response bodies
//! - Registry enforcement: declined assets deregistered before emission
//! - DOM enforcement: a watcher that blocks declined scripts injected
//!   after initial render
//! - Alert digests: pending scripts mailed to operators, rate-limited by
//!   a cooldown gate
//!
//! ## Example
//!
//! ```rust,no_run
//! use inkwall::{MonitorConfig, ScriptMonitor};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::new(Url::parse("https://shop.example.com")?)
//!         .recipient("security@example.com");
//!     let monitor = ScriptMonitor::new(config);
//!
//!     let output = monitor
//!         .process_output("<body><script>console.log(1)</script></body>")
//!         .await?;
//!     println!("removed {} declined scripts", output.removed);
//!
//!     for record in monitor.pending().await? {
//!         println!("pending: {} ({})", record.source.display(64), record.hash);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod enforce;
pub mod error;
pub mod fingerprint;
pub mod html;
pub mod monitor;
pub mod notify;
pub mod observe;
pub mod registry;

// Re-exports for convenience

// Monitor facade
pub use monitor::ScriptMonitor;

// Configuration
pub use config::{MonitorConfig, DEFAULT_ALERT_COOLDOWN, DEFAULT_DIGEST_MAX_ROWS};

// Errors
pub use error::{Error, Result};

// Fingerprinting
pub use fingerprint::{
    fingerprint_inline, fingerprint_url, fingerprint_url_with_base, normalize_source, Fingerprint,
    RemoteSizer,
};

// Registry
pub use registry::{
    Candidate, Classifier, Disposition, MemoryStore, Origin, Outcome, RecordFilter, ScriptRecord,
    ScriptSource, ScriptStore,
};

// Enforcement
pub use enforce::{
    enforce_assets, enforce_output, AssetRegistry, DeclinedSet, DomWatcher, EnforcedOutput,
    NodeAction, RegisteredAsset, ScriptNode,
};

// Observation
pub use observe::{
    build_bootstrap, scan_assets, scan_output, AuthorizedEntry, PageBootstrap, ReportHandler,
    ReportResponse, ScriptReport, ScriptReporter,
};

// Alerts
pub use notify::{DigestOutcome, MailSink, NotificationGate, TracingMailSink};

/// Inkwall version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
