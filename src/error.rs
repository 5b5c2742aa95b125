//! Error types for the extract2md library.
//!
//! Only the *acquisition* side of the library can fail: reading the upload,
//! talking to the extraction service, writing output. Rendering an
//! [`crate::output::ExtractionResult`] into Markdown never fails: malformed
//! or missing fields degrade to an empty contribution, and an entirely empty
//! result degrades to a fixed sentinel string.
//!
//! [`Extract2MdError`] therefore covers everything that stops a document from
//! being obtained. Failures of one document in a multi-document run are
//! reported per document by [`crate::stream::convert_stream`] and do not
//! abort the others.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the extract2md library.
#[derive(Debug, Error)]
pub enum Extract2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a usable file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The file extension is not one the extraction service accepts.
    #[error("File type not allowed: '{path}'\nAllowed extensions: {allowed}")]
    UnsupportedFileType { path: PathBuf, allowed: String },

    /// The upload exceeds the configured size limit.
    #[error("File '{path}' is {size} bytes, above the {limit}-byte upload limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// A saved extraction result is not valid JSON.
    #[error("Failed to parse extraction result '{path}': {source}")]
    InvalidResultFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── API errors ────────────────────────────────────────────────────────
    /// A mode that talks to the service was selected without an API key.
    #[error("No API key configured for mode '{mode}'.\nSet EXTRACT2MD_API_KEY or pass one to the builder.")]
    MissingApiKey { mode: String },

    /// The service answered with a non-success status.
    #[error("{stage} API request failed with status code {status}: {body}")]
    ApiError {
        stage: String,
        status: u16,
        body: String,
    },

    /// The request never completed (DNS, TLS, connection reset, ...).
    #[error("{stage} API request failed: {reason}")]
    RequestFailed { stage: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("{stage} API request timed out after {secs}s\nIncrease --timeout.")]
    ApiTimeout { stage: String, secs: u64 },

    /// The service answered 2xx but the body was not what we expected.
    #[error("{stage} API returned an unusable response: {detail}")]
    InvalidResponse { stage: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read an input file after validation succeeded.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Extract2MdError {
    /// HTTP status a web front-end should answer with for this error.
    ///
    /// Upstream statuses are passed through unchanged; input problems are
    /// the caller's fault (400); everything else is a server error (500).
    pub fn http_status(&self) -> u16 {
        match self {
            Extract2MdError::ApiError { status, .. } => *status,
            Extract2MdError::InvalidInput { .. }
            | Extract2MdError::UnsupportedFileType { .. }
            | Extract2MdError::InvalidResultFile { .. } => 400,
            Extract2MdError::FileTooLarge { .. } => 413,
            _ => 500,
        }
    }
}

/// Failure of one document inside a multi-document run.
///
/// Yielded by [`crate::stream::convert_stream`]; the other documents keep
/// going.
#[derive(Debug, Error)]
#[error("{input}: {source}")]
pub struct DocumentError {
    /// The input as given.
    pub input: String,
    #[source]
    pub source: Extract2MdError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let e = Extract2MdError::ApiError {
            stage: "Convert".into(),
            status: 403,
            body: "forbidden".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("status code 403"), "got: {msg}");
        assert!(msg.contains("forbidden"));
        assert!(msg.starts_with("Convert"));
    }

    #[test]
    fn api_timeout_display() {
        let e = Extract2MdError::ApiTimeout {
            stage: "Extract".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn missing_key_mentions_env_var() {
        let e = Extract2MdError::MissingApiKey {
            mode: "convert".into(),
        };
        assert!(e.to_string().contains("EXTRACT2MD_API_KEY"));
    }

    #[test]
    fn file_too_large_display() {
        let e = Extract2MdError::FileTooLarge {
            path: PathBuf::from("big.pdf"),
            size: 9_000_000,
            limit: 8_388_608,
        };
        assert!(e.to_string().contains("9000000"));
        assert!(e.to_string().contains("8388608"));
    }

    #[test]
    fn http_status_mapping() {
        let upstream = Extract2MdError::ApiError {
            stage: "Convert".into(),
            status: 502,
            body: String::new(),
        };
        assert_eq!(upstream.http_status(), 502);

        let bad_type = Extract2MdError::UnsupportedFileType {
            path: PathBuf::from("a.exe"),
            allowed: "pdf".into(),
        };
        assert_eq!(bad_type.http_status(), 400);

        assert_eq!(Extract2MdError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn document_error_names_input() {
        let e = DocumentError {
            input: "scan.pdf".into(),
            source: Extract2MdError::Internal("boom".into()),
        };
        assert_eq!(e.to_string(), "scan.pdf: Internal error: boom");
        assert!(std::error::Error::source(&e).is_some());
    }
}
