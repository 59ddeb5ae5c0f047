//! Ticket status responses
//!
//! Mirrors the JSON returned by `GET /v1/contribuyente/gem/comprobantes/envios/{ticket}`:
//!
//! ```json
//! {
//!   "codRespuesta": "99",
//!   "error": { "numError": "2335", "desError": "El documento electronico ingresado ha sido alterado" },
//!   "arcCdr": "UEsDBBQAAAAIAA...",
//!   "indCdrGenerado": "1"
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{RESPONSE_CODE_ERROR, RESPONSE_CODE_PROCESSING, RESPONSE_CODE_SUCCESS};

/// Classified `codRespuesta`.
///
/// Codes outside the three documented sentinels are kept verbatim in
/// `Unrecognized`; deciding what they mean is the poller's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum ResponseCode {
    Processing,
    Success,
    Error,
    Unrecognized(String),
}

impl ResponseCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Processing => RESPONSE_CODE_PROCESSING,
            Self::Success => RESPONSE_CODE_SUCCESS,
            Self::Error => RESPONSE_CODE_ERROR,
            Self::Unrecognized(code) => code,
        }
    }

    /// Everything except `Processing` ends the poll loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl From<&str> for ResponseCode {
    fn from(value: &str) -> Self {
        match value.trim() {
            RESPONSE_CODE_PROCESSING => Self::Processing,
            RESPONSE_CODE_SUCCESS => Self::Success,
            RESPONSE_CODE_ERROR => Self::Error,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl From<ResponseCode> for String {
    fn from(value: ResponseCode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResponseCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient_string(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// Structured rejection detail (`error` object).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(rename = "numError", default, deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(rename = "desError", default)]
    pub detail: String,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error Code: {} | Detail: {}", self.code, self.detail)
    }
}

/// One status query result. Produced fresh by every poll, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    #[serde(rename = "codRespuesta")]
    pub response_code: ResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
    #[serde(rename = "arcCdr", default, skip_serializing_if = "Option::is_none")]
    pub cdr: Option<String>,
    #[serde(rename = "indCdrGenerado", default, skip_serializing_if = "Option::is_none")]
    pub cdr_generated: Option<String>,
}

impl StatusResult {
    /// A result with only the response code set.
    pub fn with_code(response_code: ResponseCode) -> Self {
        Self { response_code, error: None, cdr: None, cdr_generated: None }
    }

    /// Base64 CDR archive, ignoring empty strings.
    pub fn certificate(&self) -> Option<&str> {
        self.cdr.as_deref().map(str::trim).filter(|cdr| !cdr.is_empty())
    }

    /// Rejection detail, ignoring an all-empty `error` object.
    pub fn remote_error(&self) -> Option<&RemoteError> {
        self.error.as_ref().filter(|err| !err.code.is_empty() || !err.detail.is_empty())
    }

    /// Parses `indCdrGenerado` the way SUNAT emits it (`"1"`, `"0"`,
    /// `"true"`, ...). `None` when absent or unparseable.
    pub fn is_cdr_generated(&self) -> Option<bool> {
        match self.cdr_generated.as_deref().map(str::trim)? {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        }
    }

    /// Whether the payload matches its code: Error carries an error detail,
    /// Success carries a CDR, Processing carries neither.
    pub fn is_consistent(&self) -> bool {
        match self.response_code {
            ResponseCode::Error => self.remote_error().is_some(),
            ResponseCode::Success => self.certificate().is_some(),
            ResponseCode::Processing => {
                self.remote_error().is_none() && self.certificate().is_none()
            }
            ResponseCode::Unrecognized(_) => true,
        }
    }
}

/// Accepts a JSON string or number; SUNAT is not consistent about which.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Integer(number) => number.to_string(),
        Raw::Null(()) => String::new(),
    })
}
