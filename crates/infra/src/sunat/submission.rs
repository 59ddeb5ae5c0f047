//! Receipt submission

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sunat_core::ReceiptSubmitter;
use sunat_domain::{AccessToken, PackedDocument, Result, SunatError, Ticket};
use tracing::{info, instrument};

use super::SunatClient;
use crate::errors::InfraError;

#[derive(Debug, Serialize)]
struct SubmissionRequest<'a> {
    archivo: ArchivePayload<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArchivePayload<'a> {
    nom_archivo: String,
    arc_gre_zip: &'a str,
    hash_zip: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmissionResponse {
    #[serde(rename = "numTicket", default)]
    ticket: Option<Value>,
}

#[async_trait]
impl ReceiptSubmitter for SunatClient {
    #[instrument(skip(self, token, document), fields(file = %document.file_name()))]
    async fn submit(&self, token: &AccessToken, document: &PackedDocument) -> Result<Ticket> {
        let url = self.submission_url(document.stem());
        let body = SubmissionRequest {
            archivo: ArchivePayload {
                nom_archivo: document.archive_name(),
                arc_gre_zip: document.base64(),
                hash_zip: document.digest(),
            },
        };

        let response = self
            .http
            .send(
                self.http
                    .request(Method::POST, &url)
                    .header(AUTHORIZATION, token.bearer())
                    .json(&body),
            )
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SunatError::SubmissionTimeout(self.http.timeout())
                } else {
                    SunatError::from(InfraError::from(err))
                }
            })?;

        if !response.is_success() {
            return Err(SunatError::SubmissionRejected {
                status: response.status().as_u16(),
                body: response.excerpt(),
            });
        }

        let parsed: SubmissionResponse = response.json("parsing submission response")?;
        let ticket = match parsed.ticket {
            Some(Value::String(ticket)) if !ticket.trim().is_empty() => ticket,
            Some(Value::Number(number)) => number.to_string(),
            _ => {
                return Err(SunatError::MalformedResponse {
                    context: "reading numTicket".to_string(),
                    body: response.excerpt(),
                })
            }
        };

        info!(ticket = %ticket, digest = %document.digest(), "Receipt submitted");
        Ok(Ticket::new(ticket))
    }
}
