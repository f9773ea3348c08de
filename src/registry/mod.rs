// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Script registry
//!
//! The canonical set of known scripts and their review status, plus the
//! classification state machine applied on every observation.

mod classifier;
mod record;
mod store;

pub use classifier::{Candidate, Classifier, Outcome};
pub use record::{Disposition, Origin, ScriptRecord, ScriptSource};
pub use store::{MemoryStore, RecordFilter, ScriptStore};
