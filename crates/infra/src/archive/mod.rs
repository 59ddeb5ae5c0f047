//! Zip packing for outgoing receipts and extraction of returned CDRs

pub mod materializer;
pub mod packer;

pub use materializer::materialize;
pub use packer::{pack, pack_file};

/// Final path component of `name`, accepting both `/` and `\` separators.
///
/// `None` when nothing usable remains (`""`, `"dir/"`, `"."`, `".."`).
pub(crate) fn file_component(name: &str) -> Option<&str> {
    name.rsplit(|c| c == '/' || c == '\\')
        .next()
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
}
