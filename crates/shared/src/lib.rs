//! Shared types and configuration for Fleetbill.
//!
//! This crate provides common types used across all other crates:
//! - Money helpers with decimal precision (round-half-up to cents)
//! - Typed IDs for type-safe entity references
//! - Configuration management

pub mod config;
pub mod types;

pub use config::{AppConfig, BillingConfig, DatabaseConfig, LogFormat, ServerConfig};
