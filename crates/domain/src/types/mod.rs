//! Domain types and models

pub mod credentials;
pub mod document;
pub mod outcome;
pub mod status;

pub use credentials::{AccessToken, Credentials};
pub use document::{PackedDocument, Ticket};
pub use outcome::Outcome;
pub use status::{RemoteError, ResponseCode, StatusResult};
