// Main library entry point for soaap-graph.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod ports;

pub use error::{Error, Result};
