//! Packed documents and submission tickets

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::ARCHIVE_EXTENSION;

/// A receipt wrapped into a single-entry zip, ready for transport.
///
/// `digest` and `base64` are both computed over `archive`, so the hash the
/// authority checks always matches the bytes it decodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedDocument {
    file_name: String,
    archive: Vec<u8>,
    digest: String,
    base64: String,
}

impl PackedDocument {
    pub fn new(file_name: String, archive: Vec<u8>, digest: String, base64: String) -> Self {
        Self { file_name, archive, digest, base64 }
    }

    /// Base name of the source document, which is also the archive entry name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name up to its first `.`; SUNAT keys the submission on it.
    pub fn stem(&self) -> &str {
        self.file_name.split('.').next().unwrap_or(&self.file_name)
    }

    /// `nomArchivo` value sent with the submission.
    pub fn archive_name(&self) -> String {
        format!("{}.{}", self.stem(), ARCHIVE_EXTENSION)
    }

    pub fn archive(&self) -> &[u8] {
        &self.archive
    }

    /// Lower-case hex SHA-256 of [`Self::archive`].
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Standard base64 of [`Self::archive`].
    pub fn base64(&self) -> &str {
        &self.base64
    }
}

/// Correlation id returned by SUNAT after a submission is accepted for
/// processing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(String);

impl Ticket {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> PackedDocument {
        PackedDocument::new(name.to_string(), vec![1, 2, 3], "ab".into(), "AQID".into())
    }

    #[test]
    fn stem_stops_at_first_dot() {
        assert_eq!(doc("20123456789-09-T001-1.xml").stem(), "20123456789-09-T001-1");
        assert_eq!(doc("F0001-1.signed.xml").stem(), "F0001-1");
        assert_eq!(doc("README").stem(), "README");
    }

    #[test]
    fn archive_name_uses_stem() {
        assert_eq!(doc("F0001-1.xml").archive_name(), "F0001-1.zip");
    }

    #[test]
    fn ticket_displays_raw_value() {
        let ticket = Ticket::new("T-999");
        assert_eq!(ticket.to_string(), "T-999");
        assert_eq!(serde_json::to_string(&ticket).unwrap(), "\"T-999\"");
    }
}
