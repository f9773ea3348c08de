// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Enforcement engine
//!
//! Given the current declined set, prevents matching scripts from executing
//! in three contexts: rendered output (element excision before the response
//! is sent), registered assets (deregistration before emission), and the
//! live DOM (watcher-driven removal). Enforcement always runs before
//! observation so blocked content never reaches the page in observable
//! form.

mod assets;
mod render;
mod watcher;

pub use assets::{enforce_assets, AssetRegistry, RegisteredAsset};
pub use render::{enforce_output, DeclinedSet, EnforcedOutput};
pub use watcher::{DomWatcher, NodeAction, ScriptNode};
