// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Registration-time enforcement
//!
//! The asset registry is the enumerable list of {handle, source} pairs the
//! page intends to emit. Declined entries are deregistered and dequeued so
//! they are never written into the output at all.

use parking_lot::RwLock;

use super::render::DeclinedSet;

/// One registered script asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredAsset {
    /// Registration handle (unique per asset)
    pub handle: String,
    /// Source URL as registered
    pub src: String,
}

/// Registered assets plus the emission queue
#[derive(Debug, Default)]
pub struct AssetRegistry {
    registered: RwLock<Vec<RegisteredAsset>>,
    queue: RwLock<Vec<String>>,
}

impl AssetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset and queue it for emission
    pub fn register(&self, handle: impl Into<String>, src: impl Into<String>) {
        let handle = handle.into();
        let asset = RegisteredAsset {
            handle: handle.clone(),
            src: src.into(),
        };
        let mut registered = self.registered.write();
        registered.retain(|a| a.handle != handle);
        registered.push(asset);

        let mut queue = self.queue.write();
        if !queue.contains(&handle) {
            queue.push(handle);
        }
    }

    /// Remove an asset's registration
    pub fn deregister(&self, handle: &str) -> bool {
        let mut registered = self.registered.write();
        let before = registered.len();
        registered.retain(|a| a.handle != handle);
        registered.len() != before
    }

    /// Remove an asset from the emission queue
    pub fn dequeue(&self, handle: &str) -> bool {
        let mut queue = self.queue.write();
        let before = queue.len();
        queue.retain(|h| h != handle);
        queue.len() != before
    }

    /// Snapshot of all registered assets
    pub fn snapshot(&self) -> Vec<RegisteredAsset> {
        self.registered.read().clone()
    }

    /// Snapshot of assets still queued for emission, in queue order
    pub fn queued(&self) -> Vec<RegisteredAsset> {
        let registered = self.registered.read();
        self.queue
            .read()
            .iter()
            .filter_map(|handle| registered.iter().find(|a| &a.handle == handle).cloned())
            .collect()
    }
}

/// Deregister and dequeue every registered asset matching the declined set.
/// Returns the removed handles.
pub fn enforce_assets(registry: &AssetRegistry, declined: &DeclinedSet) -> Vec<String> {
    if declined.is_empty() {
        return Vec::new();
    }

    let mut removed = Vec::new();
    for asset in registry.snapshot() {
        if declined.matches_src(&asset.src) {
            registry.deregister(&asset.handle);
            registry.dequeue(&asset.handle);
            tracing::warn!(handle = %asset.handle, src = %asset.src, "blocked declined asset");
            removed.push(asset.handle);
        }
    }
    removed
}
