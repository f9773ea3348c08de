// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Observation feed
//!
//! The producers that discover candidate scripts: the registered-asset
//! scan, the rendered-output scan, and the client report channel. All three
//! feed the same classify pipeline.

mod bootstrap;
mod feed;
mod report;

pub use bootstrap::{build_bootstrap, root_domain, AuthorizedEntry, PageBootstrap};
pub use feed::{scan_assets, scan_output};
pub use report::{ReportHandler, ReportResponse, ScriptReport, ScriptReporter};
