//! Ticket status queries

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use sunat_core::StatusResolver;
use sunat_domain::{AccessToken, Result, StatusResult, SunatError, Ticket};
use tracing::{debug, instrument, warn};

use super::SunatClient;

#[async_trait]
impl StatusResolver for SunatClient {
    #[instrument(skip(self, token), fields(ticket = %ticket))]
    async fn status(&self, token: &AccessToken, ticket: &Ticket) -> Result<StatusResult> {
        let url = self.status_url(ticket.as_str());

        let response = self
            .http
            .send(self.http.request(Method::GET, &url).header(AUTHORIZATION, token.bearer()))
            .await
            .map_err(|err| SunatError::StatusQuery {
                ticket: ticket.to_string(),
                reason: if err.is_timeout() {
                    format!("timed out after {:?}", self.http.timeout())
                } else {
                    err.to_string()
                },
            })?;

        if !response.is_success() {
            return Err(SunatError::StatusQuery {
                ticket: ticket.to_string(),
                reason: format!("HTTP {}: {}", response.status().as_u16(), response.excerpt()),
            });
        }

        let status: StatusResult = response.json("parsing ticket status")?;

        if status.is_consistent() {
            debug!(code = %status.response_code, "Ticket status");
        } else {
            warn!(
                code = %status.response_code,
                has_error = status.remote_error().is_some(),
                has_cdr = status.certificate().is_some(),
                "Ticket status payload does not match its response code"
            );
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sunat_domain::{EndpointConfig, ResponseCode};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::HttpClient;

    const STATUS_PATH: &str = "/v1/contribuyente/gem/comprobantes/envios/T-999";

    fn client_for(server: &MockServer, timeout: Duration) -> SunatClient {
        SunatClient::new(
            HttpClient::builder().timeout(timeout).build().unwrap(),
            EndpointConfig { auth_base_url: server.uri(), base_url: server.uri() },
        )
    }

    async fn query(server: &MockServer) -> Result<StatusResult> {
        client_for(server, Duration::from_secs(5))
            .status(&AccessToken::new("tok"), &Ticket::new("T-999"))
            .await
    }

    #[tokio::test]
    async fn classifies_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "codRespuesta": "99",
                "error": { "numError": "2335", "desError": "Documento alterado" },
                "indCdrGenerado": "0"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = query(&server).await.unwrap();

        assert_eq!(status.response_code, ResponseCode::Error);
        assert_eq!(status.remote_error().unwrap().code, "2335");
        assert_eq!(status.is_cdr_generated(), Some(false));
    }

    #[tokio::test]
    async fn passes_unknown_codes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"codRespuesta": "55"})),
            )
            .mount(&server)
            .await;

        let status = query(&server).await.unwrap();

        assert_eq!(status.response_code, ResponseCode::Unrecognized("55".into()));
        assert!(status.remote_error().is_none());
    }

    #[tokio::test]
    async fn http_failure_is_a_status_query_fault() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = query(&server).await.unwrap_err();

        match &err {
            SunatError::StatusQuery { ticket, reason } => {
                assert_eq!(ticket, "T-999");
                assert!(reason.contains("500"));
                assert!(reason.contains("upstream down"));
            }
            other => panic!("expected StatusQuery, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = query(&server).await.unwrap_err();

        assert!(matches!(err, SunatError::MalformedResponse { .. }), "got {err:?}");
    }
}
