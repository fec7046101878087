//! Relay Core
//!
//! Core types and configuration for Relay sweeps.
//!
//! This crate contains:
//! - Domain types: run identities, stages, plans and results
//! - Stage templates with per-run placeholder substitution
//! - The sweep file format and its validation

pub mod config;
pub mod domain;
pub mod error;
pub mod template;

pub use error::ConfigError;
