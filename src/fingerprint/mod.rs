// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Script fingerprinting
//!
//! Derives a stable (hash, size) identity for any script, whether addressed
//! by source URL or carried inline. Pure on the hot path: no network, no
//! clock. Remote sizes are a separate, best-effort concern.

mod digest;
mod remote;

pub use digest::{
    fingerprint_inline, fingerprint_url, fingerprint_url_with_base, host_of, normalize_source,
    normalize_source_with_base, Fingerprint,
};
pub use remote::{remote_size, remote_sizes, RemoteSizer};
