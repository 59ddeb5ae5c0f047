//! # SUNAT Core
//!
//! Pure pipeline logic - no HTTP, no filesystem.
//!
//! This crate contains:
//! - Port interfaces for the remote services (token, submission, status)
//! - The ticket poller state machine
//!
//! ## Architecture Principles
//! - Only depends on `sunat-domain`
//! - All remote calls go through traits
//! - Timing and cancellation are explicit inputs

pub mod poller;
pub mod ports;

pub use poller::{PollReport, PollState, ReceiptPoller};
pub use ports::{ReceiptSubmitter, StatusResolver, TokenProvider};
