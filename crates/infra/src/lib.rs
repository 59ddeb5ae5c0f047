//! # SUNAT Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The shared HTTP client
//! - SUNAT REST adapters (token, submission, status)
//! - Zip packing and CDR extraction
//! - Configuration loading
//! - The end-to-end receipt pipeline
//!
//! ## Architecture
//! - Implements traits defined in `sunat-core`
//! - Depends on `sunat-domain` and `sunat-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod archive;
pub mod config;
pub mod errors;
pub mod http;
pub mod pipeline;
pub mod sunat;

// Re-export commonly used items
pub use archive::{materialize, pack, pack_file};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, HttpResponse};
pub use pipeline::{settle, ReceiptPipeline, Submission};
pub use sunat::SunatClient;
