//! Shared helpers for `sunat-infra` integration tests: a wiremock stand-in
//! for both SUNAT APIs plus receipt and CDR fixtures.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use sunat_domain::{Config, PollConfig, RawConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const CLIENT_ID: &str = "test-client";
pub const TOKEN: &str = "eyJhbGciOiJSUzI1NiJ9.test";

static TRACING: Once = Once::new();

/// Route pipeline logs (including trace-level HTTP bodies) to the test
/// output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("sunat_infra=trace,sunat_core=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Both SUNAT APIs served from one mock server.
pub struct SunatMock {
    pub server: MockServer,
}

impl SunatMock {
    pub async fn start() -> Self {
        init_tracing();
        Self { server: MockServer::start().await }
    }

    /// Validated config pointing at the mock with fast polling.
    pub fn config(&self, timeout: Duration, interval: Duration, max_attempts: Option<u32>) -> Config {
        let mut config = RawConfig {
            user: Some("20123456789MODDATOS".into()),
            password: Some("moddatos".into()),
            client_id: Some(CLIENT_ID.into()),
            client_secret: Some("test-secret".into()),
            auth_base_url: Some(self.server.uri()),
            base_url: Some(self.server.uri()),
            request_timeout_secs: Some(5),
            ..Default::default()
        }
        .validate()
        .expect("test config should validate");

        config.poll = PollConfig { timeout, interval, max_attempts };
        config
    }

    pub fn token_path() -> String {
        format!("/v1/clientessol/{CLIENT_ID}/oauth2/token/")
    }

    pub fn submission_path(stem: &str) -> String {
        format!("/v1/contribuyente/gem/comprobantes/{stem}")
    }

    pub fn status_path(ticket: &str) -> String {
        format!("/v1/contribuyente/gem/comprobantes/envios/{ticket}")
    }

    pub async fn mount_token(&self) {
        Mock::given(method("POST"))
            .and(path(Self::token_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": TOKEN,
                "token_type": "JWT",
                "expires_in": 3600
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_submission(&self, stem: &str, ticket: &str) {
        Mock::given(method("POST"))
            .and(path(Self::submission_path(stem)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "numTicket": ticket,
                "fecRecepcion": "2024-05-01T10:00:00"
            })))
            .mount(&self.server)
            .await;
    }

    /// Status reply served `times` times before later mounts take over.
    pub async fn mount_status_times(&self, ticket: &str, body: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path(Self::status_path(ticket)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_status(&self, ticket: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(Self::status_path(ticket)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Requests received on `path`.
    pub async fn hits(&self, request_path: &str) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == request_path)
            .collect()
    }
}

/// Base64 zip holding one entry, as SUNAT returns CDRs.
pub fn cdr_zip(name: &str, content: &str) -> String {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(name, SimpleFileOptions::default()).unwrap();
    writer.write_all(content.as_bytes()).unwrap();
    STANDARD.encode(writer.finish().unwrap().into_inner())
}

/// Write a receipt to `dir/name`.
pub fn write_receipt(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn processing() -> Value {
    json!({ "codRespuesta": "98" })
}
