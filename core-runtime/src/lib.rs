//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the playback coordinator:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other workspace crates
//! depend on. It establishes the logging conventions, the typed event
//! broadcasting mechanism consumed by UI layers, and the fail-fast
//! configuration surface that wires host bridges into the coordinator.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
