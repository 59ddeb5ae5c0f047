//! CDR extraction

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sunat_domain::{Result, SunatError};
use tracing::{info, instrument, warn};
use zip::ZipArchive;

use super::file_component;
use crate::errors::InfraError;

/// Decode a base64 zip and write its first entry into `dest_dir`.
///
/// ASCII whitespace inside the payload is ignored. The entry name is reduced
/// to its final component so nothing is written outside `dest_dir`. Extra
/// entries are skipped with a warning. An existing file is overwritten.
///
/// # Errors
/// `Decode` for invalid base64, `Archive` for data that is not a zip or an
/// entry without a usable name, `EmptyArchive` for a zip with no entries and
/// `Io` when `dest_dir` or the file cannot be written.
#[instrument(skip(encoded), fields(encoded_len = encoded.len(), dest = %dest_dir.display()))]
pub fn materialize(encoded: &str, dest_dir: &Path) -> Result<PathBuf> {
    let compact: Vec<u8> =
        encoded.bytes().filter(|byte| !byte.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(&compact).map_err(|e| SunatError::from(InfraError::from(e)))?;

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| SunatError::Archive(format!("not a zip archive: {e}")))?;

    if archive.len() == 0 {
        return Err(SunatError::EmptyArchive);
    }

    if archive.len() > 1 {
        let ignored = (1..archive.len())
            .filter_map(|index| archive.by_index(index).ok().map(|entry| entry.name().to_string()))
            .collect::<Vec<_>>();
        warn!(
            entries = archive.len(),
            ignored = ?ignored,
            "Archive has several entries; keeping the first"
        );
    }

    let mut entry = archive.by_index(0).map_err(|e| SunatError::from(InfraError::from(e)))?;
    let name = file_component(entry.name())
        .filter(|_| !entry.is_dir())
        .ok_or_else(|| SunatError::Archive(format!("entry '{}' has no file name", entry.name())))?
        .to_string();

    fs::create_dir_all(dest_dir).map_err(|e| {
        SunatError::Io(format!("cannot create {}: {e}", dest_dir.display()))
    })?;

    let path = dest_dir.join(&name);
    let mut out = File::create(&path)
        .map_err(|e| SunatError::Io(format!("cannot create {}: {e}", path.display())))?;
    let written = io::copy(&mut entry, &mut out)
        .map_err(|e| SunatError::Io(format!("cannot write {}: {e}", path.display())))?;

    info!(path = %path.display(), bytes = written, "CDR written");
    Ok(path)
}
