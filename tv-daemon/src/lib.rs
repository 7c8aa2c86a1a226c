//! Shared plumbing for the Thermoveil daemons
//!
//! The daemons are thin I/O adapters: all per-message logic lives in the
//! `tv-core` pipelines, and this crate only provides the transport binding,
//! logging bootstrap, CLI parsing, and the alarm/observability sink.

pub mod cli;
pub mod logging;
pub mod mqtt;
pub mod sink;
