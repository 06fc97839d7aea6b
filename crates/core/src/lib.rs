//! Core business logic for Fleetbill.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `billing` - Invoicing, bill generation, payment application, status derivation
//! - `summary` - Collection summaries over filtered bills

pub mod billing;
pub mod summary;
