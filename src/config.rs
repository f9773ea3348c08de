// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Monitor configuration

use std::time::Duration;

use url::Url;

/// Default cooldown between pending-script digests (24 hours)
pub const DEFAULT_ALERT_COOLDOWN: Duration = Duration::from_secs(86_400);

/// Default maximum number of rows in a digest message
pub const DEFAULT_DIGEST_MAX_ROWS: usize = 10;

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base URL of the monitored site; hosts matching it are internal
    pub site_url: Url,
    /// Recipients for pending-script digests; each receives the message
    pub alert_recipients: Vec<String>,
    /// Minimum interval between digest sends
    pub alert_cooldown: Duration,
    /// Row cap for a single digest message
    pub digest_max_rows: usize,
    /// Fetch informational remote sizes for external scripts
    pub fetch_remote_sizes: bool,
    /// Timeout for a single remote-size lookup
    pub remote_fetch_timeout: Duration,
    /// Capacity of the DOM watcher insertion-event queue
    pub watcher_queue_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(Url::parse("http://localhost/").expect("static URL"))
    }
}

impl MonitorConfig {
    /// Create a config for a site
    pub fn new(site_url: Url) -> Self {
        Self {
            site_url,
            alert_recipients: Vec::new(),
            alert_cooldown: DEFAULT_ALERT_COOLDOWN,
            digest_max_rows: DEFAULT_DIGEST_MAX_ROWS,
            fetch_remote_sizes: false,
            remote_fetch_timeout: Duration::from_secs(5),
            watcher_queue_capacity: 256,
        }
    }

    /// Add an alert recipient
    pub fn recipient(mut self, email: impl Into<String>) -> Self {
        self.alert_recipients.push(email.into());
        self
    }

    /// Set the digest cooldown
    pub fn alert_cooldown(mut self, cooldown: Duration) -> Self {
        self.alert_cooldown = cooldown;
        self
    }

    /// Set the digest row cap
    pub fn digest_max_rows(mut self, rows: usize) -> Self {
        self.digest_max_rows = rows;
        self
    }

    /// Enable best-effort remote-size lookups
    pub fn fetch_remote_sizes(mut self, enabled: bool) -> Self {
        self.fetch_remote_sizes = enabled;
        self
    }

    /// Set the remote-size lookup timeout
    pub fn remote_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.remote_fetch_timeout = timeout;
        self
    }

    /// Set the watcher queue capacity
    pub fn watcher_queue_capacity(mut self, capacity: usize) -> Self {
        self.watcher_queue_capacity = capacity;
        self
    }

    /// Host of the monitored site
    pub fn site_host(&self) -> &str {
        self.site_url.host_str().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = MonitorConfig::new(Url::parse("https://shop.example.com").unwrap())
            .recipient("security@example.com")
            .digest_max_rows(5)
            .alert_cooldown(Duration::from_secs(3600));

        assert_eq!(config.site_host(), "shop.example.com");
        assert_eq!(config.alert_recipients.len(), 1);
        assert_eq!(config.digest_max_rows, 5);
        assert_eq!(config.alert_cooldown, Duration::from_secs(3600));
    }

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.alert_cooldown, DEFAULT_ALERT_COOLDOWN);
        assert_eq!(config.digest_max_rows, DEFAULT_DIGEST_MAX_ROWS);
        assert!(!config.fetch_remote_sizes);
    }
}
