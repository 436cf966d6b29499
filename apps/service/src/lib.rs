//! statuswatch - availability monitor for HTTP endpoints and ping hosts.
//!
//! Targets are probed in passes. Each probe result is folded into a
//! persisted per-target status record, and a notification is emitted only
//! when a target flips between reachable and unreachable.
//!
//! ```text
//! TargetRegistry ──► CheckOrchestrator ──► Prober (bounded concurrency)
//!                          │
//!                          ├─► evaluate(prior, result) ──► StatusStore::upsert
//!                          └─► NotificationSink::notify (alert edges only)
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod monitoring;
pub mod notify;
pub mod orchestrator;
pub mod registry;
pub mod store;

pub use orchestrator::{CheckOrchestrator, PassReport, PassScheduler, TargetStatus};
