//! Dedup bookkeeping for namestamp
//!
//! This crate provides:
//! - The tracked-path set (`TrackedPaths`)
//! - The event filter deciding which creations are genuine and new
//! - Companion-file reconciliation (drawing source vs. markdown sibling)
//! - The reap sweep dropping paths whose file is gone

pub mod filter;
pub mod tracked;

// Re-exports
pub use filter::{Claim, EventFilter, RejectReason, Verdict};
pub use tracked::TrackedPaths;
