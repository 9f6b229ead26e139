//! Crewline library
//!
//! Exposes the crate's modules for the binary and for integration tests.

pub mod agents;
pub mod cache;
pub mod cli;
pub mod config;
pub mod crew;
pub mod error;
pub mod observability;
pub mod tools;
