//! Port interfaces for the SUNAT remote services

use async_trait::async_trait;
use sunat_domain::{AccessToken, Credentials, PackedDocument, Result, StatusResult, Ticket};

/// Exchanges long-lived credentials for a bearer token
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch a fresh token. Implementations never cache.
    async fn fetch_token(&self, credentials: &Credentials) -> Result<AccessToken>;
}

/// Hands a packed receipt to SUNAT for asynchronous processing
#[async_trait]
pub trait ReceiptSubmitter: Send + Sync {
    /// Submit the archive and return the ticket SUNAT assigned to it
    async fn submit(&self, token: &AccessToken, document: &PackedDocument) -> Result<Ticket>;
}

/// Queries the processing status of a ticket
#[async_trait]
pub trait StatusResolver: Send + Sync {
    /// Perform exactly one status query.
    ///
    /// Transport and HTTP failures surface as `SunatError::StatusQuery` so the
    /// poller can treat them as per-attempt faults.
    async fn status(&self, token: &AccessToken, ticket: &Ticket) -> Result<StatusResult>;
}
