//! Outcome reporting and exit codes

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sunat_domain::constants::ERROR_FILE_SUFFIX;
use sunat_domain::{Outcome, RemoteError, SunatError};
use tracing::info;

pub const EXIT_ACCEPTED: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_REJECTED: i32 = 2;
pub const EXIT_EMPTY_CERTIFICATE: i32 = 3;
pub const EXIT_UNRECOGNIZED: i32 = 4;
pub const EXIT_PENDING: i32 = 5;
pub const EXIT_CANCELLED: i32 = 130;

pub fn exit_code(outcome: &Outcome) -> i32 {
    match outcome {
        Outcome::Accepted { .. } => EXIT_ACCEPTED,
        Outcome::Rejected { .. } => EXIT_REJECTED,
        Outcome::EmptyCertificate { .. } => EXIT_EMPTY_CERTIFICATE,
        Outcome::Unrecognized { .. } => EXIT_UNRECOGNIZED,
        Outcome::Pending { .. } => EXIT_PENDING,
    }
}

pub fn failure_code(err: &SunatError) -> i32 {
    match err {
        SunatError::Unreachable => EXIT_CANCELLED,
        _ => EXIT_FAILURE,
    }
}

/// Name a sidecar error file is keyed on: the source file name up to its
/// first `.`.
pub fn source_stem(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    name.split('.').next().unwrap_or_default().to_string()
}

/// Write `<name>_error.txt` into `error_dir`, creating the folder.
///
/// # Errors
/// Fails when the folder or file cannot be written.
pub fn write_error_file(error_dir: &Path, name: &str, error: &RemoteError) -> Result<PathBuf> {
    fs::create_dir_all(error_dir)
        .with_context(|| format!("cannot create error folder {}", error_dir.display()))?;

    let path = error_dir.join(format!("{name}{ERROR_FILE_SUFFIX}"));
    fs::write(&path, error.to_string())
        .with_context(|| format!("cannot write {}", path.display()))?;

    Ok(path)
}

/// Print `outcome` and persist a rejection to `error_dir` under `name`.
///
/// Results go to `out`, anomalies to `err`. Returns the process exit code.
///
/// # Errors
/// Fails when the sidecar error file or either stream cannot be written.
pub fn report(
    outcome: &Outcome,
    error_dir: &Path,
    name: &str,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<i32> {
    info!(ticket = %outcome.ticket(), outcome = outcome.label(), "Pipeline finished");

    match outcome {
        Outcome::Accepted { ticket, path, .. } => {
            writeln!(out, "Ticket: {ticket}")?;
            writeln!(out, "CDR: {}", path.display())?;
        }
        Outcome::Rejected { ticket, error, cdr_path } => {
            let error_file = write_error_file(error_dir, name, error)?;
            writeln!(out, "Ticket: {ticket}")?;
            if let Some(path) = cdr_path {
                writeln!(out, "CDR: {}", path.display())?;
            }
            writeln!(err, "Rejected by SUNAT: {error}")?;
            writeln!(err, "Details written to {}", error_file.display())?;
        }
        Outcome::EmptyCertificate { ticket, status } => {
            writeln!(out, "Ticket: {ticket}")?;
            writeln!(err, "SUNAT reported success without a CDR:")?;
            writeln!(err, "{}", serde_json::to_string_pretty(status)?)?;
        }
        Outcome::Unrecognized { ticket, status } => {
            writeln!(out, "Ticket: {ticket}")?;
            writeln!(err, "Unrecognized response code {}:", status.response_code)?;
            writeln!(err, "{}", serde_json::to_string_pretty(status)?)?;
        }
        Outcome::Pending { ticket, .. } => {
            writeln!(out, "Ticket: {ticket}")?;
            writeln!(err, "Still processing, query again later")?;
        }
    }

    Ok(exit_code(outcome))
}

#[cfg(test)]
mod tests {
    use sunat_domain::{ResponseCode, StatusResult, Ticket};
    use tempfile::TempDir;

    use super::*;

    fn run(outcome: &Outcome, error_dir: &Path, name: &str) -> (i32, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = report(outcome, error_dir, name, &mut out, &mut err).unwrap();
        (code, String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn accepted_prints_the_cdr_path() {
        let dir = TempDir::new().unwrap();
        let outcome = Outcome::Accepted {
            ticket: Ticket::new("T-999"),
            path: PathBuf::from("out/R-F0001-1.xml"),
            cdr_generated: Some(true),
        };

        let (code, out, err) = run(&outcome, dir.path(), "F0001-1");

        assert_eq!(code, EXIT_ACCEPTED);
        assert!(out.contains("T-999"));
        assert!(out.contains("R-F0001-1.xml"));
        assert!(err.is_empty());
    }

    #[test]
    fn rejection_writes_sidecar_file_in_nested_folder() {
        let dir = TempDir::new().unwrap();
        let error_dir = dir.path().join("errores/2024");
        let outcome = Outcome::Rejected {
            ticket: Ticket::new("T-100"),
            error: RemoteError {
                code: "2335".into(),
                detail: "El documento electronico ingresado ha sido alterado".into(),
            },
            cdr_path: None,
        };

        let (code, _, err) = run(&outcome, &error_dir, "F0001-2");

        assert_eq!(code, EXIT_REJECTED);
        let written = fs::read_to_string(error_dir.join("F0001-2_error.txt")).unwrap();
        assert_eq!(
            written,
            "Error Code: 2335 | Detail: El documento electronico ingresado ha sido alterado"
        );
        assert!(err.contains("F0001-2_error.txt"));
    }

    #[test]
    fn empty_certificate_dumps_the_status() {
        let dir = TempDir::new().unwrap();
        let mut status = StatusResult::with_code(ResponseCode::Success);
        status.cdr_generated = Some("0".into());
        let outcome = Outcome::EmptyCertificate { ticket: Ticket::new("T-101"), status };

        let (code, _, err) = run(&outcome, dir.path(), "F0001-3");

        assert_eq!(code, EXIT_EMPTY_CERTIFICATE);
        assert!(err.contains("\"codRespuesta\": \"0\""));
        assert!(err.contains("\"indCdrGenerado\": \"0\""));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn remaining_outcomes_have_distinct_codes() {
        let dir = TempDir::new().unwrap();
        let unknown = Outcome::Unrecognized {
            ticket: Ticket::new("T-1"),
            status: StatusResult::with_code(ResponseCode::from("3")),
        };
        let pending = Outcome::Pending {
            ticket: Ticket::new("T-1"),
            status: StatusResult::with_code(ResponseCode::Processing),
        };

        assert_eq!(run(&unknown, dir.path(), "T-1").0, EXIT_UNRECOGNIZED);
        assert_eq!(run(&pending, dir.path(), "T-1").0, EXIT_PENDING);
    }

    #[test]
    fn cancellation_has_its_own_exit_code() {
        assert_eq!(failure_code(&SunatError::Unreachable), EXIT_CANCELLED);
        assert_eq!(failure_code(&SunatError::EmptyArchive), EXIT_FAILURE);
    }

    #[test]
    fn stem_stops_at_the_first_dot() {
        assert_eq!(source_stem(Path::new("facturas/F0001-1.xml")), "F0001-1");
        assert_eq!(source_stem(Path::new("20123456789-09-T001-1.signed.xml")), "20123456789-09-T001-1");
    }
}
