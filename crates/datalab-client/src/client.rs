//! HTTP client for the DataLab backends

use crate::error::{ApiError, ApiResult};
use crate::records::{
    ArtifactCreate, ArtifactRecord, ChatResponse, ControlWidgetSnapshot, LogTailResponse,
    NotebookJobRecord, NotebookRunPayload, OpsCommandRequest, OpsCommandResponse, OpsStatus,
    PlaygroundManifestRecord, SearchTelemetrySummary, TailLogEntry, TailLogEntryCreate,
};
use async_trait::async_trait;
use datalab_telemetry::ChatSubmissionPayload;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Artifacts returned by [`ApiClient::fetch_artifacts`] when no limit is given
pub const DEFAULT_ARTIFACT_LIMIT: u32 = 8;

/// Entries returned by [`ApiClient::fetch_tail_log`] when no limit is given
pub const DEFAULT_TAIL_LOG_LIMIT: u32 = 18;

/// Lines returned by [`ApiClient::fetch_control_logs`] when no count is given
pub const DEFAULT_CONTROL_LOG_LINES: u32 = 120;

/// Per-request timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Submission seam used by the composer
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `POST /api/chat`
    async fn post_chat(&self, payload: &ChatSubmissionPayload) -> ApiResult<ChatResponse>;
}

/// Manifest lookup seam used by the manifest poller
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Latest manifest for `tenant/playground`; `None` when nothing is published
    async fn fetch_latest_manifest(
        &self,
        tenant: &str,
        playground: &str,
    ) -> ApiResult<Option<PlaygroundManifestRecord>>;
}

/// JSON-over-HTTP client bound to one backend base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client; a trailing `/` on `base_url` is dropped
    ///
    /// Every request carries `Content-Type: application/json`.
    ///
    /// # Errors
    /// [`ApiError::InvalidUrl`] if `base_url` is not an absolute URL, or
    /// [`ApiError::Transport`] if the HTTP client cannot be initialised.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url = base_url.strip_suffix('/').unwrap_or(base_url).to_string();
        Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(Self {
            http: Client::builder().default_headers(headers).build()?,
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// With per-request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL without trailing slash
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult<Response> {
        Ok(request.timeout(self.timeout).send().await?)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                body
            };
            tracing::debug!(status = status.as_u16(), %detail, "backend rejected request");
            return Err(ApiError::Http {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        Self::decode(self.execute(request).await?).await
    }

    /// Like `send`, but 404 and 204 mean "nothing there"
    async fn send_nullable<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<Option<T>> {
        let response = self.execute(request).await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
            _ => Self::decode(response).await.map(Some),
        }
    }

    /// `GET /api/artifacts?limit=N`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn fetch_artifacts(&self, limit: Option<u32>) -> ApiResult<Vec<ArtifactRecord>> {
        let limit = limit.unwrap_or(DEFAULT_ARTIFACT_LIMIT);
        self.send(self.http.get(self.url("/api/artifacts")).query(&[("limit", limit)]))
            .await
    }

    /// `POST /api/artifacts`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn create_artifact(&self, artifact: &ArtifactCreate) -> ApiResult<ArtifactRecord> {
        self.send(self.http.post(self.url("/api/artifacts")).json(artifact))
            .await
    }

    /// `GET /api/tail-log?limit=N`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn fetch_tail_log(&self, limit: Option<u32>) -> ApiResult<Vec<TailLogEntry>> {
        let limit = limit.unwrap_or(DEFAULT_TAIL_LOG_LIMIT);
        self.send(self.http.get(self.url("/api/tail-log")).query(&[("limit", limit)]))
            .await
    }

    /// `POST /api/tail-log`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn create_tail_log_entry(&self, entry: &TailLogEntryCreate) -> ApiResult<TailLogEntry> {
        self.send(self.http.post(self.url("/api/tail-log")).json(entry))
            .await
    }

    /// `GET /api/ops/status`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn fetch_ops_status(&self) -> ApiResult<OpsStatus> {
        self.send(self.http.get(self.url("/api/ops/status"))).await
    }

    /// `POST /api/ops/command`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn send_ops_command(&self, command: &OpsCommandRequest) -> ApiResult<OpsCommandResponse> {
        self.send(self.http.post(self.url("/api/ops/command")).json(command))
            .await
    }

    /// `GET /api/control/notebooks`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn fetch_notebook_jobs(&self) -> ApiResult<Vec<NotebookJobRecord>> {
        self.send(self.http.get(self.url("/api/control/notebooks")))
            .await
    }

    /// `POST /api/control/notebooks`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn trigger_notebook_job(&self, run: &NotebookRunPayload) -> ApiResult<NotebookJobRecord> {
        self.send(self.http.post(self.url("/api/control/notebooks")).json(run))
            .await
    }

    /// `GET /api/control/status?include_logs=..&log_lines=..`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn fetch_control_status(&self, include_logs: bool, log_lines: u32) -> ApiResult<OpsStatus> {
        let include_logs = if include_logs { "true" } else { "false" };
        let request = self
            .http
            .get(self.url("/api/control/status"))
            .query(&[("include_logs", include_logs.to_string()), ("log_lines", log_lines.to_string())]);
        self.send(request).await
    }

    /// `GET /api/control/logs?service=..&lines=N`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn fetch_control_logs(&self, service: &str, lines: Option<u32>) -> ApiResult<LogTailResponse> {
        let lines = lines.unwrap_or(DEFAULT_CONTROL_LOG_LINES);
        let request = self
            .http
            .get(self.url("/api/control/logs"))
            .query(&[("service", service.to_string()), ("lines", lines.to_string())]);
        self.send(request).await
    }

    /// `GET /api/control/widgets`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn fetch_control_widgets(&self) -> ApiResult<ControlWidgetSnapshot> {
        self.send(self.http.get(self.url("/api/control/widgets")))
            .await
    }

    /// `GET /api/ops/search-telemetry`
    ///
    /// # Errors
    /// See [`ApiError`].
    pub async fn fetch_search_telemetry(&self) -> ApiResult<SearchTelemetrySummary> {
        self.send(self.http.get(self.url("/api/ops/search-telemetry")))
            .await
    }

    fn manifest_url(&self, tenant: &str, playground: &str) -> ApiResult<Url> {
        let base = self.url("/api/playgrounds");
        let mut url = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(base.clone()))?
            .extend([tenant, playground, "manifests", "latest"]);
        Ok(url)
    }
}

#[async_trait]
impl ManifestSource for ApiClient {
    /// `GET /api/playgrounds/{tenant}/{playground}/manifests/latest`; 404 and
    /// 204 yield `None`
    async fn fetch_latest_manifest(
        &self,
        tenant: &str,
        playground: &str,
    ) -> ApiResult<Option<PlaygroundManifestRecord>> {
        let url = self.manifest_url(tenant, playground)?;
        self.send_nullable(self.http.get(url)).await
    }
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn post_chat(&self, payload: &ChatSubmissionPayload) -> ApiResult<ChatResponse> {
        tracing::debug!(
            session_id = %payload.session_id,
            keystrokes = payload.keystroke_events.len(),
            "posting chat payload"
        );
        self.send(self.http.post(self.url("/api/chat")).json(payload))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_stripped() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/chat"), "http://localhost:8000/api/chat");
    }

    #[test]
    fn relative_base_rejected() {
        assert!(matches!(ApiClient::new(""), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(ApiClient::new("/api"), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn manifest_path_segments_are_escaped() {
        let client = ApiClient::new("http://h/base/").unwrap();
        let url = client.manifest_url("demo tenant", "a/b").unwrap();
        assert_eq!(
            url.as_str(),
            "http://h/base/api/playgrounds/demo%20tenant/a%2Fb/manifests/latest"
        );
    }

    #[test]
    fn timeout_builder() {
        let client = ApiClient::new("http://h").unwrap().with_timeout(Duration::from_secs(5));
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }
}
