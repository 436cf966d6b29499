//! Shared `tracing` setup for the statuswatch binaries.

mod subscriber;

pub use subscriber::{LogFormat, init_tracing, init_tracing_with_level};
