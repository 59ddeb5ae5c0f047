//! Terminal pipeline outcomes
//!
//! Local failures (network, decoding, deadline, cancellation) are the `Err`
//! side of `Result<Outcome, SunatError>`; everything here is an answer SUNAT
//! actually gave.

use std::path::PathBuf;

use serde::Serialize;

use super::document::Ticket;
use super::status::{RemoteError, StatusResult};

/// Terminal result of one submission/resolution cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Success status with a CDR written to disk.
    Accepted { ticket: Ticket, path: PathBuf, cdr_generated: Option<bool> },

    /// Error status. SUNAT may attach a rejection CDR, which is written too.
    Rejected { ticket: Ticket, error: RemoteError, cdr_path: Option<PathBuf> },

    /// Success status without a CDR. An anomaly, reported on its own.
    EmptyCertificate { ticket: Ticket, status: StatusResult },

    /// A terminal response code outside the documented set.
    Unrecognized { ticket: Ticket, status: StatusResult },

    /// Still processing. Only a single status query (no polling) can end here.
    Pending { ticket: Ticket, status: StatusResult },
}

impl Outcome {
    pub fn ticket(&self) -> &Ticket {
        match self {
            Self::Accepted { ticket, .. }
            | Self::Rejected { ticket, .. }
            | Self::EmptyCertificate { ticket, .. }
            | Self::Unrecognized { ticket, .. }
            | Self::Pending { ticket, .. } => ticket,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Rejected { .. } => "rejected",
            Self::EmptyCertificate { .. } => "empty_certificate",
            Self::Unrecognized { .. } => "unrecognized",
            Self::Pending { .. } => "pending",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponseCode;

    #[test]
    fn serializes_with_outcome_tag() {
        let outcome = Outcome::EmptyCertificate {
            ticket: Ticket::new("T-1"),
            status: StatusResult::with_code(ResponseCode::Success),
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "empty_certificate");
        assert_eq!(json["ticket"], "T-1");
        assert_eq!(json["status"]["codRespuesta"], "0");
        assert_eq!(outcome.label(), "empty_certificate");
        assert!(!outcome.is_accepted());
    }
}
