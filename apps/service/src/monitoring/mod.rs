//! Monitoring engine module - probes targets and interprets the results
//!
//! This module is responsible for:
//! - Executing HTTP and ping checks
//! - Validating targets before they are probed
//! - Deciding which status changes are alert edges
pub mod checker;
pub mod executor;
pub mod transition;
pub mod types;
pub mod validation;

pub use executor::{ProbeExecutor, Prober};
pub use transition::{Evaluation, evaluate};
pub use types::{AlertEvent, AlertKind, CheckKind, ProbeResult, Target};
