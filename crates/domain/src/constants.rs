//! Application constants
//!
//! Centralized location for the SUNAT API wire constants and the default
//! tuning values used throughout the pipeline.

// Remote status codes (`codRespuesta`)
pub const RESPONSE_CODE_SUCCESS: &str = "0";
pub const RESPONSE_CODE_PROCESSING: &str = "98";
pub const RESPONSE_CODE_ERROR: &str = "99";

// Password-grant exchange
pub const TOKEN_SCOPE: &str = "https://api-cpe.sunat.gob.pe";
pub const TOKEN_GRANT_TYPE: &str = "password";

// Default endpoints
pub const DEFAULT_AUTH_BASE_URL: &str = "https://api-seguridad.sunat.gob.pe";
pub const DEFAULT_BASE_URL: &str = "https://api-cpe.sunat.gob.pe";

// Timing defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

// Output naming
pub const ARCHIVE_EXTENSION: &str = "zip";
pub const ERROR_FILE_SUFFIX: &str = "_error.txt";
