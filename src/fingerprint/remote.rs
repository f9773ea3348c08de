// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Best-effort remote size lookup
//!
//! The remote byte length of an external script is display/accounting data
//! only; classification identity is the normalized URL. Lookups are bounded
//! and degrade to 0 on any failure - they never block or fail a
//! classification decision.

use std::time::Duration;

use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;

/// Fetch the remote byte length of a script: HEAD Content-Length first,
/// then a GET-and-measure fallback. Returns 0 when the size is unknown.
pub async fn remote_size(client: &Client, url: &str, timeout: Duration) -> u64 {
    match head_content_length(client, url, timeout).await {
        Some(len) => len,
        None => get_and_measure(client, url, timeout).await,
    }
}

/// Fetch several remote sizes concurrently
pub async fn remote_sizes(client: &Client, urls: &[String], timeout: Duration) -> Vec<u64> {
    let futures: Vec<_> = urls
        .iter()
        .map(|url| remote_size(client, url, timeout))
        .collect();
    futures::future::join_all(futures).await
}

async fn head_content_length(client: &Client, url: &str, timeout: Duration) -> Option<u64> {
    let response = match client.head(url).timeout(timeout).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(url, error = %e, "HEAD lookup failed");
            return None;
        }
    };

    if !response.status().is_success() {
        return None;
    }

    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

async fn get_and_measure(client: &Client, url: &str, timeout: Duration) -> u64 {
    let response = match client.get(url).timeout(timeout).send().await {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            tracing::debug!(url, status = %r.status(), "GET lookup refused");
            return 0;
        }
        Err(e) => {
            tracing::debug!(url, error = %e, "GET lookup failed");
            return 0;
        }
    };

    match response.bytes().await {
        Ok(body) => body.len() as u64,
        Err(e) => {
            tracing::debug!(url, error = %e, "GET body read failed");
            0
        }
    }
}

/// Reusable remote-size fetcher bound to one client and timeout
#[derive(Debug, Clone)]
pub struct RemoteSizer {
    client: Client,
    timeout: Duration,
}

impl RemoteSizer {
    /// Create a sizer with the given per-lookup timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    /// Size of a single remote script, 0 when unknown
    pub async fn size_of(&self, url: &str) -> u64 {
        remote_size(&self.client, url, self.timeout).await
    }

    /// Sizes of several remote scripts, fetched concurrently
    pub async fn sizes_of(&self, urls: &[String]) -> Vec<u64> {
        remote_sizes(&self.client, urls, self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_head_content_length_used() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/lib.js"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-length", "1234"))
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/lib.js", server.uri());
        let size = remote_size(&client, &url, Duration::from_secs(2)).await;
        assert_eq!(size, 1234);
    }

    #[tokio::test]
    async fn test_get_fallback_measures_body() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/lib.js"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/lib.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string("console.log(1)"))
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/lib.js", server.uri());
        let size = remote_size(&client, &url, Duration::from_secs(2)).await;
        assert_eq!(size, 14);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_zero() {
        let client = Client::new();
        let size = remote_size(
            &client,
            "http://127.0.0.1:1/unreachable.js",
            Duration::from_millis(200),
        )
        .await;
        assert_eq!(size, 0);
    }
}
