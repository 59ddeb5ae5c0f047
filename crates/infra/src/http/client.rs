use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sunat_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use sunat_domain::SunatError;
use tracing::{debug, trace, Level};

use crate::errors::InfraError;

const BODY_EXCERPT_LIMIT: usize = 512;
const REDACTED_FIELDS: &[&str] = &["access_token", "refresh_token", "client_secret", "password"];

/// Shared HTTP client. Built once per invocation and cloned into every
/// adapter; clones share the same connection pool.
///
/// Every call is a single attempt. Status codes are returned as-is so each
/// adapter can map them to its own error variant.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Per-request timeout applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request and buffer the response body.
    ///
    /// Logs method, URL, status and latency at debug; bodies at trace. Form
    /// bodies are never logged.
    pub async fn send(&self, builder: RequestBuilder) -> Result<HttpResponse, reqwest::Error> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        debug!(%method, %url, "sending HTTP request");
        if tracing::enabled!(Level::TRACE) {
            trace!(%method, %url, body = %describe_request_body(&request), "request body");
        }

        let started = Instant::now();
        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                return Err(err);
            }
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        debug!(
            %method,
            %url,
            %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "received HTTP response"
        );
        if tracing::enabled!(Level::TRACE) {
            trace!(%url, body = %render_body(content_type.as_deref(), &body), "response body");
        }

        Ok(HttpResponse { status, body })
    }
}

/// Buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    body: String,
}

impl HttpResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body shortened for error messages.
    pub fn excerpt(&self) -> String {
        excerpt(&self.body)
    }

    /// Deserialize the body, mapping failures to `MalformedResponse`.
    pub fn json<T: DeserializeOwned>(&self, context: &str) -> Result<T, SunatError> {
        serde_json::from_str(&self.body).map_err(|err| SunatError::MalformedResponse {
            context: format!("{context} ({err})"),
            body: self.excerpt(),
        })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS) }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpClient, SunatError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(concat!("sunat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| SunatError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, timeout: self.timeout })
    }
}

fn describe_request_body(request: &Request) -> String {
    let Some(bytes) = request.body().and_then(reqwest::Body::as_bytes) else {
        return "<empty>".to_string();
    };

    let content_type =
        request.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).unwrap_or("");

    if content_type.contains("application/x-www-form-urlencoded") {
        return format!("<form body omitted, {} bytes>", bytes.len());
    }

    render_body(Some(content_type), &String::from_utf8_lossy(bytes))
}

/// Pretty-print JSON bodies with credential fields masked. Other bodies are
/// returned unchanged.
fn render_body(content_type: Option<&str>, body: &str) -> String {
    let looks_json = content_type.is_some_and(|ct| ct.contains("json"))
        || body.trim_start().starts_with('{');
    if !looks_json {
        return body.to_string();
    }

    match serde_json::from_str::<Value>(body) {
        Ok(mut value) => {
            redact(&mut value);
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string())
        }
        Err(_) => body.to_string(),
    }
}

fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String("<redacted>".into());
                } else {
                    redact(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &body[..end], body.len())
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde::Deserialize;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_timeout(timeout: Duration) -> HttpClient {
        HttpClient::builder().timeout(timeout).build().expect("http client")
    }

    #[tokio::test]
    async fn buffers_response_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", concat!("sunat/", env!("CARGO_PKG_VERSION"))))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"{"numTicket":"T-1"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_timeout(Duration::from_secs(5));
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert!(response.is_success());

        #[derive(Deserialize)]
        struct Body {
            #[serde(rename = "numTicket")]
            ticket: String,
        }
        let body: Body = response.json("reading ticket").unwrap();
        assert_eq!(body.ticket, "T-1");
    }

    #[tokio::test]
    async fn server_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_timeout(Duration::from_secs(5));
        let response =
            client.send(client.request(Method::POST, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.excerpt(), "busy");
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = client_with_timeout(Duration::from_millis(100));
        let err = client.send(client.request(Method::GET, server.uri())).await.unwrap_err();

        assert!(err.is_timeout());
    }

    #[test]
    fn malformed_json_keeps_the_body() {
        let response = HttpResponse {
            status: StatusCode::OK,
            body: "<html>gateway</html>".into(),
        };

        match response.json::<Value>("parsing token") {
            Err(SunatError::MalformedResponse { context, body }) => {
                assert!(context.starts_with("parsing token"));
                assert_eq!(body, "<html>gateway</html>");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rendered_bodies_mask_credentials() {
        let rendered = render_body(
            Some("application/json"),
            r#"{"access_token":"eyJ","token_type":"JWT","expires_in":3600}"#,
        );
        assert!(!rendered.contains("eyJ"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("\"token_type\": \"JWT\""));

        assert_eq!(render_body(Some("text/plain"), "plain"), "plain");
    }

    #[test]
    fn form_bodies_are_never_rendered() {
        let client = reqwest::Client::new();
        let request = client
            .post("http://localhost/token")
            .form(&[("username", "20123456789MODDATOS"), ("password", "hunter2")])
            .build()
            .unwrap();

        let described = describe_request_body(&request);
        assert!(described.starts_with("<form body omitted"));
        assert!(!described.contains("hunter2"));
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let body = "x".repeat(2_000);
        let short = excerpt(&body);
        assert!(short.len() < 600);
        assert!(short.ends_with("(2000 bytes)"));
    }
}
