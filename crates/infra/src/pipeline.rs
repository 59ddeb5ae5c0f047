//! Submission and resolution pipeline
//!
//! Wires the SUNAT adapters, the packer, the poller and the materializer into
//! the three operations the command line exposes:
//!
//! - [`ReceiptPipeline::send`]: token, pack, submit
//! - [`ReceiptPipeline::fetch`]: token, one status query, settle
//! - [`ReceiptPipeline::process`]: token, pack, submit, poll, settle
//!
//! A fresh token is fetched for every operation and dropped afterwards. Every
//! remote call is raced against the caller's [`CancellationToken`]; a
//! cancelled run ends with `SunatError::Unreachable`.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use sunat_core::{PollReport, ReceiptPoller, ReceiptSubmitter, StatusResolver, TokenProvider};
use sunat_domain::{
    AccessToken, Config, Credentials, Outcome, PackedDocument, PollConfig, RemoteError,
    ResponseCode, Result, StatusResult, SunatError, Ticket,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::archive::{materialize, pack_file};
use crate::http::HttpClient;
use crate::sunat::SunatClient;

/// Result of [`ReceiptPipeline::send`].
#[derive(Debug, Clone)]
pub struct Submission {
    pub ticket: Ticket,
    pub document: PackedDocument,
}

/// End-to-end receipt pipeline.
#[derive(Clone)]
pub struct ReceiptPipeline {
    credentials: Credentials,
    tokens: Arc<dyn TokenProvider>,
    submitter: Arc<dyn ReceiptSubmitter>,
    resolver: Arc<dyn StatusResolver>,
    poller: ReceiptPoller,
}

impl ReceiptPipeline {
    pub fn new(
        credentials: Credentials,
        tokens: Arc<dyn TokenProvider>,
        submitter: Arc<dyn ReceiptSubmitter>,
        resolver: Arc<dyn StatusResolver>,
        poll: PollConfig,
    ) -> Self {
        let poller = ReceiptPoller::new(Arc::clone(&resolver), poll);
        Self { credentials, tokens, submitter, resolver, poller }
    }

    /// Build the pipeline against the real SUNAT endpoints.
    ///
    /// # Errors
    /// Returns `SunatError::Network` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = HttpClient::builder().timeout(config.http.request_timeout).build()?;
        let client = Arc::new(SunatClient::new(http, config.endpoints.clone()));

        Ok(Self::new(
            config.credentials.clone(),
            client.clone(),
            client.clone(),
            client,
            config.poll,
        ))
    }

    /// Pack and submit the document at `source`.
    ///
    /// # Errors
    /// Local packing failures, authentication and submission errors, and
    /// `Unreachable` when `cancel` fires first.
    #[instrument(skip(self, cancel), fields(source = %source.display()))]
    pub async fn send(&self, source: &Path, cancel: &CancellationToken) -> Result<Submission> {
        let document = pack_file(source)?;
        let token = self.token(cancel).await?;
        let ticket = cancellable(cancel, self.submitter.submit(&token, &document)).await?;

        Ok(Submission { ticket, document })
    }

    /// Query `ticket` once (no polling) and settle whatever SUNAT answers.
    ///
    /// # Errors
    /// Authentication failures, the status query failure itself, a failure
    /// writing the CDR, or `Unreachable` on cancellation.
    #[instrument(skip(self, output_dir, cancel), fields(ticket = %ticket))]
    pub async fn fetch(
        &self,
        ticket: &Ticket,
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        let token = self.token(cancel).await?;
        let status = cancellable(cancel, self.resolver.status(&token, ticket)).await?;

        settle(ticket.clone(), status, output_dir)
    }

    /// Submit the document at `source`, poll until it resolves and settle the
    /// outcome.
    ///
    /// # Errors
    /// Everything [`Self::send`] returns, plus `Timeout` when the deadline
    /// or attempt budget runs out and `Unreachable` on cancellation.
    #[instrument(skip(self, output_dir, cancel), fields(source = %source.display()))]
    pub async fn process(
        &self,
        source: &Path,
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        let document = pack_file(source)?;
        let token = self.token(cancel).await?;
        let ticket = cancellable(cancel, self.submitter.submit(&token, &document)).await?;

        let report = self.poll(&token, &ticket, cancel).await;
        let status = report.into_result()?;

        settle(ticket, status, output_dir)
    }

    /// Poll an already submitted ticket.
    pub async fn poll(
        &self,
        token: &AccessToken,
        ticket: &Ticket,
        cancel: &CancellationToken,
    ) -> PollReport {
        let report = self.poller.poll(token, ticket, cancel).await;
        if let Some(fault) = report.last_fault.as_ref().filter(|_| !report.state.is_resolved()) {
            warn!(ticket = %ticket, error = %fault, "Last status query fault before giving up");
        }
        report
    }

    async fn token(&self, cancel: &CancellationToken) -> Result<AccessToken> {
        cancellable(cancel, self.tokens.fetch_token(&self.credentials)).await
    }
}

/// Await `call` unless `cancel` fires first.
async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(SunatError::Unreachable),
        result = call => result,
    }
}

/// Turn a status into an [`Outcome`], writing any attached CDR.
///
/// # Errors
/// A CDR attached to a Success status that cannot be decoded or written.
pub fn settle(ticket: Ticket, status: StatusResult, output_dir: &Path) -> Result<Outcome> {
    match status.response_code {
        ResponseCode::Success => match status.certificate() {
            Some(cdr) => {
                let path = materialize(cdr, output_dir)?;
                info!(ticket = %ticket, path = %path.display(), "Receipt accepted");
                Ok(Outcome::Accepted { ticket, path, cdr_generated: status.is_cdr_generated() })
            }
            None => {
                warn!(ticket = %ticket, "Success status without a CDR");
                Ok(Outcome::EmptyCertificate { ticket, status })
            }
        },
        ResponseCode::Error => {
            let error = status.remote_error().cloned().unwrap_or_else(|| RemoteError {
                code: status.response_code.to_string(),
                detail: String::new(),
            });

            let cdr_path = match status.certificate().map(|cdr| materialize(cdr, output_dir)) {
                Some(Ok(path)) => Some(path),
                Some(Err(err)) => {
                    warn!(ticket = %ticket, error = %err, "Rejection CDR could not be written");
                    None
                }
                None => None,
            };

            info!(ticket = %ticket, code = %error.code, "Receipt rejected");
            Ok(Outcome::Rejected { ticket, error, cdr_path })
        }
        ResponseCode::Unrecognized(_) => {
            warn!(ticket = %ticket, code = %status.response_code, "Unrecognized response code");
            Ok(Outcome::Unrecognized { ticket, status })
        }
        ResponseCode::Processing => Ok(Outcome::Pending { ticket, status }),
    }
}
