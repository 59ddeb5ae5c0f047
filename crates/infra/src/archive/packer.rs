//! Receipt packing
//!
//! Wraps a document into a single-entry deflate zip and derives the two
//! values SUNAT checks on submission: the lower-case hex SHA-256 of the
//! archive and its base64 transport encoding. Entry timestamps are pinned to
//! the zip epoch so the same document always yields the same digest.

use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use sunat_domain::{PackedDocument, Result, SunatError};
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::file_component;
use crate::errors::InfraError;

/// Pack `content` under the base name of `file_name`.
///
/// # Errors
/// `InvalidInput` when `file_name` has no base name or `content` cannot be
/// read; `Archive` if the zip cannot be written.
#[instrument(skip(content))]
pub fn pack(file_name: &str, mut content: impl Read) -> Result<PackedDocument> {
    let entry_name = file_component(file_name)
        .ok_or_else(|| SunatError::InvalidInput(format!("no file name in '{file_name}'")))?
        .to_string();

    let mut raw = Vec::new();
    content
        .read_to_end(&mut raw)
        .map_err(|e| SunatError::InvalidInput(format!("cannot read {file_name}: {e}")))?;

    let archive = single_entry_zip(&entry_name, &raw)?;
    let digest = hex::encode(Sha256::digest(&archive));
    let encoded = STANDARD.encode(&archive);

    debug!(
        entry = %entry_name,
        raw_bytes = raw.len(),
        archive_bytes = archive.len(),
        digest = %digest,
        "Packed receipt"
    );

    Ok(PackedDocument::new(entry_name, archive, digest, encoded))
}

/// Open `path` and [`pack`] it.
///
/// # Errors
/// `InvalidInput` when the file cannot be opened, plus everything [`pack`]
/// returns.
pub fn pack_file(path: &Path) -> Result<PackedDocument> {
    let file = File::open(path)
        .map_err(|e| SunatError::InvalidInput(format!("cannot open {}: {e}", path.display())))?;
    pack(&path.to_string_lossy(), file)
}

fn single_entry_zip(entry_name: &str, content: &[u8]) -> Result<Vec<u8>> {
    let zip_err = |e: zip::result::ZipError| SunatError::from(InfraError::from(e));

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(entry_name, options).map_err(zip_err)?;
    writer.write_all(content).map_err(|e| SunatError::from(InfraError::from(e)))?;
    let cursor = writer.finish().map_err(zip_err)?;

    Ok(cursor.into_inner())
}
