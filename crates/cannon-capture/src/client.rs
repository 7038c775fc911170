//! Reqwest-backed Capture API client.

use std::path::Path;

use async_trait::async_trait;
use cannon_config::BatchConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::{CaptureError, CaptureResult};
use crate::model::{UploadResult, Verdict, VerdictResponse};

/// Route returning the reputation of a SHA-256 digest.
pub const REPORT_PATH: &str = "/external/v1/file/report";
/// Route accepting sample uploads.
pub const SCAN_PATH: &str = "/external/v1/file/scan";

const HEADER_REQUEST_ID: &str = "x-request-id";
const VERDICT_FIELD: &str = "analysis_result";
const OP_LOOKUP: &str = "file report lookup";
const OP_UPLOAD: &str = "file scan upload";

/// The two Capture API calls a file unit needs.
#[async_trait]
pub trait VerdictService: Send + Sync {
    /// Fetch the verdict for a SHA-256 digest.
    async fn lookup_verdict(&self, digest: &str) -> CaptureResult<VerdictResponse>;

    /// Upload the file at `path` for scanning.
    async fn upload_file(&self, path: &Path) -> CaptureResult<UploadResult>;
}

/// Capture API client authenticated with an appliance serial and API key.
#[derive(Clone)]
pub struct CaptureClient {
    http: Client,
    base_url: Url,
    serial: String,
    api_key: String,
}

impl CaptureClient {
    /// Build a client from the run configuration.
    ///
    /// `run_id` is sent as `x-request-id` on every call so server-side logs
    /// can be correlated with one cannon run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run identifier is not a valid header value or
    /// the HTTP client cannot be constructed.
    pub fn from_config(config: &BatchConfig, run_id: &str) -> CaptureResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(run_id)
            .map_err(|_| CaptureError::protocol("client setup", "run id is not a valid header"))?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let http = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .default_headers(default_headers)
            .build()
            .map_err(|source| CaptureError::ClientBuild { source })?;

        Ok(Self {
            http,
            base_url: config.server_url.clone(),
            serial: config.serial.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, route: &'static str) -> CaptureResult<Url> {
        self.base_url
            .join(route)
            .map_err(|source| CaptureError::InvalidRoute { route, source })
    }
}

#[async_trait]
impl VerdictService for CaptureClient {
    async fn lookup_verdict(&self, digest: &str) -> CaptureResult<VerdictResponse> {
        let mut url = self.endpoint(REPORT_PATH)?;
        url.query_pairs_mut().append_pair("sha256", digest);

        let response = self
            .http
            .get(url)
            .basic_auth(&self.serial, Some(&self.api_key))
            .send()
            .await
            .map_err(|err| CaptureError::transport(OP_LOOKUP, err))?;
        let (status, bytes) = read_body(OP_LOOKUP, response).await?;

        if !status.is_success() {
            return Err(CaptureError::protocol(
                OP_LOOKUP,
                format!("unexpected status {status}"),
            ));
        }

        let raw: Value = serde_json::from_slice(&bytes)
            .map_err(|err| CaptureError::protocol(OP_LOOKUP, format!("body is not JSON: {err}")))?;
        let verdict = raw
            .get(VERDICT_FIELD)
            .and_then(Value::as_str)
            .map(Verdict::parse)
            .ok_or_else(|| {
                CaptureError::protocol(OP_LOOKUP, format!("missing `{VERDICT_FIELD}` field"))
            })?;

        debug!(digest, verdict = %verdict, "file report received");
        Ok(VerdictResponse {
            verdict,
            http_status: status.as_u16(),
            raw,
        })
    }

    async fn upload_file(&self, path: &Path) -> CaptureResult<UploadResult> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| CaptureError::Io {
                operation: "open",
                path: path.to_path_buf(),
                source,
            })?;
        let length = file
            .metadata()
            .await
            .map_err(|source| CaptureError::Io {
                operation: "stat",
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let file_name = path
            .file_name()
            .map_or_else(|| "sample".to_string(), |name| name.to_string_lossy().into_owned());

        let part = Part::stream_with_length(Body::from(file), length).file_name(file_name);
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint(SCAN_PATH)?)
            .basic_auth(&self.serial, Some(&self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|err| CaptureError::transport(OP_UPLOAD, err))?;
        let (status, bytes) = read_body(OP_UPLOAD, response).await?;
        let accepted = status == StatusCode::OK;

        let body = match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => body,
            Err(err) if accepted => {
                return Err(CaptureError::protocol(
                    OP_UPLOAD,
                    format!("body is not JSON: {err}"),
                ));
            }
            Err(_) => Value::String(String::from_utf8_lossy(&bytes).trim().to_string()),
        };

        let message = match &body {
            Value::String(text) => text.clone(),
            other => other
                .get("verbose_msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
        let scan_id = if accepted {
            body.get("scan_id").and_then(|value| match value {
                Value::String(text) => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
        } else {
            None
        };

        debug!(path = %path.display(), status = status.as_u16(), "sample upload answered");
        Ok(UploadResult {
            http_status: status.as_u16(),
            scan_id,
            message,
        })
    }
}

/// Read the response body, turning rejected credentials into [`CaptureError::Auth`].
async fn read_body(
    operation: &'static str,
    response: Response,
) -> CaptureResult<(StatusCode, Vec<u8>)> {
    let status = response.status();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(CaptureError::Auth {
            operation,
            status: status.as_u16(),
        });
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|err| CaptureError::transport(operation, err))?;
    Ok((status, bytes.to_vec()))
}
