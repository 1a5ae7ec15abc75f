//! HTTP surface for the pngflow conversion service.
//!
//! The binary wires collaborators from config; the router and state are
//! exposed here so they can be driven in-process by tests.

pub mod api;
pub mod metrics;
pub mod state;
