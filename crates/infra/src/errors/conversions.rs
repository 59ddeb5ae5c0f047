//! Conversions from external infrastructure errors into domain errors.

use base64::DecodeError as Base64Error;
use reqwest::Error as HttpError;
use sunat_domain::SunatError;
use zip::result::ZipError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SunatError);

impl From<InfraError> for SunatError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SunatError> for InfraError {
    fn from(value: SunatError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSunatError {
    fn into_sunat(self) -> SunatError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SunatError */
/* -------------------------------------------------------------------------- */

impl IntoSunatError for HttpError {
    fn into_sunat(self) -> SunatError {
        if self.is_timeout() {
            return SunatError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return SunatError::Network(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            return SunatError::Network(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        if self.is_builder() {
            return SunatError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        SunatError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_sunat())
    }
}

/* -------------------------------------------------------------------------- */
/* zip::result::ZipError → SunatError */
/* -------------------------------------------------------------------------- */

impl IntoSunatError for ZipError {
    fn into_sunat(self) -> SunatError {
        match self {
            ZipError::Io(err) => SunatError::Io(format!("archive I/O failed: {err}")),
            other => SunatError::Archive(other.to_string()),
        }
    }
}

impl From<ZipError> for InfraError {
    fn from(value: ZipError) -> Self {
        InfraError(value.into_sunat())
    }
}

/* -------------------------------------------------------------------------- */
/* base64::DecodeError → SunatError */
/* -------------------------------------------------------------------------- */

impl IntoSunatError for Base64Error {
    fn into_sunat(self) -> SunatError {
        SunatError::Decode(format!("payload is not valid base64: {self}"))
    }
}

impl From<Base64Error> for InfraError {
    fn from(value: Base64Error) -> Self {
        InfraError(value.into_sunat())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → SunatError */
/* -------------------------------------------------------------------------- */

impl IntoSunatError for std::io::Error {
    fn into_sunat(self) -> SunatError {
        SunatError::Io(self.to_string())
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_sunat())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / toml (config files) → SunatError */
/* -------------------------------------------------------------------------- */

impl IntoSunatError for serde_json::Error {
    fn into_sunat(self) -> SunatError {
        SunatError::Config(format!("Invalid JSON format: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_sunat())
    }
}

impl IntoSunatError for toml::de::Error {
    fn into_sunat(self) -> SunatError {
        SunatError::Config(format!("Invalid TOML format: {self}"))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_sunat())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
