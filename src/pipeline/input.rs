//! Input resolution: validate a user-supplied path or URL before upload.
//!
//! Everything the service would reject is caught here, before any bytes
//! leave the machine: unknown extensions, files above the upload limit,
//! unreadable paths. Local files are read fully into memory (they are
//! capped at a few MiB) so the extract stage can send them either as a
//! multipart part or as a raw request body.
//!
//! URLs are kept as URLs: the two-step protocol passes them to the service
//! directly, and the single-step protocol downloads them first via
//! [`download`].

use crate::error::Extract2MdError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extensions the extraction service accepts (lower case).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "doc", "txt", "csv", "xls", "xlsx", "jpg", "jpeg", "png",
];

/// A file ready to be sent.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Where the bytes came from (a path, or the URL they were downloaded from).
    pub origin: String,
    /// Sanitised file name for the multipart part.
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// A local file read into memory, or a remote URL.
#[derive(Debug, Clone)]
pub enum ResolvedInput {
    Local(Upload),
    Remote(String),
}

impl ResolvedInput {
    /// Bytes that will be uploaded, 0 for URLs handed to the service as-is.
    pub fn upload_len(&self) -> u64 {
        match self {
            ResolvedInput::Local(upload) => upload.bytes.len() as u64,
            ResolvedInput::Remote(_) => 0,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Lower-cased extension of a path, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Whether the service accepts files with this path's extension.
pub fn is_allowed(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// MIME type sent for a given (lower-case) extension.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Reduce a file name to `[A-Za-z0-9._-]`, dropping any directory part.
///
/// Leading dots are stripped so the result is never hidden or relative.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Resolve the input string to something the extract stage can send.
pub async fn resolve_input(
    input: &str,
    max_upload_bytes: u64,
) -> Result<ResolvedInput, Extract2MdError> {
    if input.trim().is_empty() {
        return Err(Extract2MdError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        reqwest::Url::parse(input).map_err(|_| Extract2MdError::InvalidInput {
            input: input.to_string(),
        })?;
        debug!("Resolved remote input: {}", input);
        return Ok(ResolvedInput::Remote(input.to_string()));
    }
    resolve_local(input, max_upload_bytes).await.map(ResolvedInput::Local)
}

/// Validate and read a local file.
async fn resolve_local(path_str: &str, max_upload_bytes: u64) -> Result<Upload, Extract2MdError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(Extract2MdError::FileNotFound { path });
    }

    let extension = match extension_of(&path) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => ext,
        _ => {
            return Err(Extract2MdError::UnsupportedFileType {
                path,
                allowed: ALLOWED_EXTENSIONS.join(", "),
            })
        }
    };

    let size = tokio::fs::metadata(&path)
        .await
        .map_err(|e| read_error(&path, e))?
        .len();
    if size > max_upload_bytes {
        return Err(Extract2MdError::FileTooLarge {
            path,
            size,
            limit: max_upload_bytes,
        });
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| read_error(&path, e))?;

    let file_name = secure_filename(
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default(),
    );

    debug!("Resolved local file: {} ({} bytes)", path.display(), bytes.len());
    Ok(Upload {
        origin: path_str.to_string(),
        file_name,
        content_type: content_type_for(&extension),
        bytes,
    })
}

fn read_error(path: &Path, e: std::io::Error) -> Extract2MdError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => Extract2MdError::PermissionDenied {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::NotFound => Extract2MdError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => Extract2MdError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

/// Download a URL into memory so it can be re-uploaded.
///
/// Used only by the single-step protocol, which cannot take a URL.
pub async fn download(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
    max_upload_bytes: u64,
) -> Result<Upload, Extract2MdError> {
    info!("Downloading document from: {}", url);
    let stage = "Download";

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Extract2MdError::ApiTimeout {
                stage: stage.to_string(),
                secs: timeout_secs,
            }
        } else {
            Extract2MdError::RequestFailed {
                stage: stage.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Extract2MdError::RequestFailed {
            stage: stage.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let file_name = filename_from_url(url);
    if let Some(declared) = response.content_length() {
        if declared > max_upload_bytes {
            return Err(Extract2MdError::FileTooLarge {
                path: PathBuf::from(&file_name),
                size: declared,
                limit: max_upload_bytes,
            });
        }
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Extract2MdError::RequestFailed {
            stage: stage.to_string(),
            reason: e.to_string(),
        })?;

    if bytes.len() as u64 > max_upload_bytes {
        return Err(Extract2MdError::FileTooLarge {
            path: PathBuf::from(&file_name),
            size: bytes.len() as u64,
            limit: max_upload_bytes,
        });
    }

    let extension = extension_of(Path::new(&file_name)).unwrap_or_default();
    info!("Downloaded {} bytes as {}", bytes.len(), file_name);

    Ok(Upload {
        origin: url.to_string(),
        content_type: content_type_for(&extension),
        file_name,
        bytes: bytes.to_vec(),
    })
}

/// A reasonable file name from the last URL path segment.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return secure_filename(last);
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
