//! Shared utilities for the report workspace
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup and environment variable helpers.

pub mod env;
pub mod logging;

pub use env::{optional_var, require_var};
pub use logging::init_tracing;
