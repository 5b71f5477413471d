//! HTTP route handlers

pub mod agents;
pub mod registry;
pub mod stock;
