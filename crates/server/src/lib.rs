//! HTTP and upload surfaces of the mediaferry server.

pub mod api;
pub mod metrics;
pub mod state;
