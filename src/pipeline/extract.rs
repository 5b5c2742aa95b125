//! Remote extraction: turn a resolved input into an [`ExtractionResult`].
//!
//! This is the only stage that touches the network. The protocol is chosen
//! by [`ExtractionMode`]:
//!
//! ```text
//! Sample              ─▶ canned response (no network)
//! Convert             ─▶ POST {base}/convert   multipart "file"       ─▶ result
//! ConvertThenExtract  ─▶ POST {base}/convert   raw body               ─▶ presigned_url
//!                     ─▶ POST {base}/extract   {"file-url", ...}      ─▶ result
//! ```
//!
//! Every request carries the `x-api-key` header. Failures are not retried;
//! the first non-success status is returned to the caller with the body the
//! service sent.

use crate::config::{ChunkingMethod, ExtractConfig, ExtractionMode};
use crate::error::Extract2MdError;
use crate::output::ExtractionResult;
use crate::pipeline::input::{self, ResolvedInput, Upload};
use crate::sample::sample_result;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const CONVERT_STAGE: &str = "Convert";
const EXTRACT_STAGE: &str = "Extract";

/// HTTP client bound to one configuration.
///
/// Cheap to share behind an `Arc`: `reqwest::Client` pools connections
/// internally, so one client serves every document in a batch.
#[derive(Debug, Clone)]
pub struct ExtractionClient {
    http: reqwest::Client,
    config: ExtractConfig,
}

impl ExtractionClient {
    /// Build a client. Fails only if the TLS backend cannot initialise.
    pub fn new(config: &ExtractConfig) -> Result<Self, Extract2MdError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Extract2MdError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Obtain the extraction result for one input, using the configured mode.
    pub async fn extract(&self, input: ResolvedInput) -> Result<ExtractionResult, Extract2MdError> {
        match self.config.mode {
            ExtractionMode::Sample => {
                debug!("Sample mode: returning canned response");
                Ok(sample_result())
            }
            ExtractionMode::Convert => {
                let upload = match input {
                    ResolvedInput::Local(upload) => upload,
                    ResolvedInput::Remote(url) => {
                        input::download(
                            &self.http,
                            &url,
                            self.config.timeout_secs,
                            self.config.max_upload_bytes,
                        )
                        .await?
                    }
                };
                self.convert_multipart(upload).await
            }
            ExtractionMode::ConvertThenExtract => {
                let file_url = match input {
                    ResolvedInput::Local(upload) => self.upload_for_url(upload).await?,
                    ResolvedInput::Remote(url) => url,
                };
                self.extract_url(&file_url).await
            }
        }
    }

    /// Single-step protocol: the reply to the multipart upload is the result.
    async fn convert_multipart(&self, upload: Upload) -> Result<ExtractionResult, Extract2MdError> {
        let key = self.config.require_api_key()?;
        info!(
            "Uploading {} ({} bytes) to convert endpoint",
            upload.file_name,
            upload.bytes.len()
        );

        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(upload.content_type)
            .map_err(|e| Extract2MdError::Internal(format!("multipart part: {e}")))?;
        let form = Form::new().part("file", part);

        let request = self
            .http
            .post(endpoint(&self.config.api_url, "convert"))
            .header(API_KEY_HEADER, key)
            .multipart(form);

        let body = self.send(CONVERT_STAGE, request).await?;
        Ok(ExtractionResult::from_value(body))
    }

    /// First half of the two-step protocol: upload raw bytes, get back a
    /// presigned URL for the stored copy.
    async fn upload_for_url(&self, upload: Upload) -> Result<String, Extract2MdError> {
        let key = self.config.require_api_key()?;
        info!(
            "Uploading {} ({} bytes) for extraction",
            upload.file_name,
            upload.bytes.len()
        );

        let request = self
            .http
            .post(endpoint(&self.config.api_url, "convert"))
            .header(API_KEY_HEADER, key)
            .header(reqwest::header::CONTENT_TYPE, upload.content_type)
            .body(upload.bytes);

        let body = self.send(CONVERT_STAGE, request).await?;
        presigned_url(&body)
    }

    /// Second half of the two-step protocol.
    async fn extract_url(&self, file_url: &str) -> Result<ExtractionResult, Extract2MdError> {
        let key = self.config.require_api_key()?;
        debug!("Requesting extraction for uploaded document");

        let request = self
            .http
            .post(endpoint(&self.config.api_url, "extract"))
            .header(API_KEY_HEADER, key)
            .json(&extract_request_body(file_url, &self.config));

        let body = self.send(EXTRACT_STAGE, request).await?;
        Ok(ExtractionResult::from_value(body))
    }

    /// Send a request and decode a JSON reply, mapping every failure.
    async fn send(&self, stage: &str, request: RequestBuilder) -> Result<Value, Extract2MdError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(stage, e))?;
        decode(stage, response).await
    }

    fn transport_error(&self, stage: &str, e: reqwest::Error) -> Extract2MdError {
        if e.is_timeout() {
            Extract2MdError::ApiTimeout {
                stage: stage.to_string(),
                secs: self.config.timeout_secs,
            }
        } else {
            Extract2MdError::RequestFailed {
                stage: stage.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

async fn decode(stage: &str, response: Response) -> Result<Value, Extract2MdError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Extract2MdError::RequestFailed {
            stage: stage.to_string(),
            reason: e.to_string(),
        })?;

    if !status.is_success() {
        return Err(Extract2MdError::ApiError {
            stage: stage.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }

    debug!("{} API answered {} ({} bytes)", stage, status, text.len());
    serde_json::from_str(&text).map_err(|e| Extract2MdError::InvalidResponse {
        stage: stage.to_string(),
        detail: format!("body is not JSON: {e}"),
    })
}

/// Join the base URL and an endpoint path with exactly one slash.
pub fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// JSON body for the `extract` endpoint.
pub fn extract_request_body(file_url: &str, config: &ExtractConfig) -> Value {
    json!({
        "file-url": file_url,
        "chunking": ChunkingMethod::join(&config.chunking),
        "return_table": config.return_tables,
        "schema": {},
    })
}

/// Pull `presigned_url` out of a convert reply.
fn presigned_url(body: &Value) -> Result<String, Extract2MdError> {
    body.get("presigned_url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Extract2MdError::InvalidResponse {
            stage: CONVERT_STAGE.to_string(),
            detail: "missing 'presigned_url'".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_with_one_slash() {
        assert_eq!(endpoint("https://api.example.com", "convert"), "https://api.example.com/convert");
        assert_eq!(endpoint("https://api.example.com/", "/extract"), "https://api.example.com/extract");
        assert_eq!(endpoint("http://localhost:8080/v1", "convert"), "http://localhost:8080/v1/convert");
    }

    #[test]
    fn extract_body_defaults() {
        let config = ExtractConfig::default();
        let body = extract_request_body("https://bucket/doc.pdf", &config);
        assert_eq!(
            body,
            json!({
                "file-url": "https://bucket/doc.pdf",
                "chunking": "semantic,recursive",
                "return_table": true,
                "schema": {},
            })
        );
    }

    #[test]
    fn extract_body_follows_config() {
        let config = ExtractConfig::builder()
            .mode(ExtractionMode::Sample)
            .chunking(vec![ChunkingMethod::Page])
            .return_tables(false)
            .build()
            .unwrap();
        let body = extract_request_body("u", &config);
        assert_eq!(body["chunking"], "page");
        assert_eq!(body["return_table"], false);
    }

    #[test]
    fn presigned_url_required() {
        assert_eq!(
            presigned_url(&json!({"presigned_url": "https://s3/x"})).unwrap(),
            "https://s3/x"
        );
        for bad in [json!({}), json!({"presigned_url": ""}), json!({"presigned_url": 3})] {
            let err = presigned_url(&bad).unwrap_err();
            assert!(matches!(err, Extract2MdError::InvalidResponse { .. }), "{bad}");
        }
    }

    #[tokio::test]
    async fn sample_mode_needs_no_network_or_key() {
        let config = ExtractConfig::builder()
            .mode(ExtractionMode::Sample)
            .build()
            .unwrap();
        let client = ExtractionClient::new(&config).unwrap();
        let result = client
            .extract(ResolvedInput::Remote("https://unused.invalid/a.pdf".into()))
            .await
            .unwrap();
        assert!(result.markdown.is_some());
        assert!(result.tables.is_some());
    }

    #[tokio::test]
    async fn network_mode_without_key_fails_before_sending() {
        let mut config = ExtractConfig::default();
        config.mode = ExtractionMode::ConvertThenExtract;
        config.api_key = None;
        let client = ExtractionClient::new(&config).unwrap();
        let err = client
            .extract(ResolvedInput::Remote("https://unused.invalid/a.pdf".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Extract2MdError::MissingApiKey { .. }));
    }

    #[test]
    fn client_debug_hides_key() {
        let mut config = ExtractConfig::default();
        config.api_key = Some("super-secret".into());
        let client = ExtractionClient::new(&config).unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }
}
