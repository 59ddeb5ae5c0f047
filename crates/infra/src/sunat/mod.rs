//! SUNAT REST adapters
//!
//! [`SunatClient`] implements the three remote ports from `sunat-core`:
//!
//! | Port               | Endpoint                                                    |
//! |--------------------|-------------------------------------------------------------|
//! | `TokenProvider`    | `POST {auth}/v1/clientessol/{client_id}/oauth2/token/`      |
//! | `ReceiptSubmitter` | `POST {base}/v1/contribuyente/gem/comprobantes/{stem}`      |
//! | `StatusResolver`   | `GET  {base}/v1/contribuyente/gem/comprobantes/envios/{ticket}` |

mod auth;
mod status;
mod submission;

use sunat_domain::EndpointConfig;

use crate::http::HttpClient;

/// HTTP adapter for the SUNAT security and CPE APIs.
#[derive(Clone)]
pub struct SunatClient {
    http: HttpClient,
    endpoints: EndpointConfig,
}

impl SunatClient {
    pub fn new(http: HttpClient, endpoints: EndpointConfig) -> Self {
        Self { http, endpoints }
    }

    fn token_url(&self, client_id: &str) -> String {
        format!(
            "{}/v1/clientessol/{client_id}/oauth2/token/",
            self.endpoints.auth_base_url.trim_end_matches('/')
        )
    }

    fn submission_url(&self, stem: &str) -> String {
        format!(
            "{}/v1/contribuyente/gem/comprobantes/{stem}",
            self.endpoints.base_url.trim_end_matches('/')
        )
    }

    fn status_url(&self, ticket: &str) -> String {
        format!(
            "{}/v1/contribuyente/gem/comprobantes/envios/{ticket}",
            self.endpoints.base_url.trim_end_matches('/')
        )
    }
}
