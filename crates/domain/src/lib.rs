//! # SUNAT Domain
//!
//! Business domain types for the receipt submission pipeline.
//!
//! This crate contains:
//! - Credentials, tokens, packed documents and tickets
//! - Status responses and terminal pipeline outcomes
//! - The `SunatError` taxonomy and `Result` alias
//! - Configuration structures and their layered merge
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
