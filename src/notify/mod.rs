// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Alert delivery
//!
//! A digest of pending scripts, rate-limited by a cooldown gate, delivered
//! through a pluggable mail sink.

mod gate;
mod mail;

pub use gate::{DigestOutcome, NotificationGate};
pub use mail::{MailSink, TracingMailSink};
