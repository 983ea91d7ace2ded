//! DataLab Client
//!
//! Typed JSON client for the backends behind the DataLab dashboard.
//!
//! # Core Concepts
//!
//! - [`ApiClient`]: one base URL, one timeout, one method per endpoint
//! - [`ChatApi`]: the chat submission seam, implemented by [`ApiClient`]
//! - [`ManifestSource`]: latest playground manifest, `None` when unpublished
//! - [`ApiError`]: non-2xx responses render as `Request failed (status): detail`
//!
//! # Example
//!
//! ```rust,ignore
//! use datalab_client::{ApiClient, ChatApi};
//!
//! let client = ApiClient::new("http://localhost:8000/")?;
//! let shelf = client.fetch_artifacts(None).await?;
//! let reply = client.post_chat(&payload).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod client;
mod error;
pub mod records;

pub use client::{
    ApiClient, ChatApi, ManifestSource, DEFAULT_ARTIFACT_LIMIT, DEFAULT_CONTROL_LOG_LINES,
    DEFAULT_TAIL_LOG_LIMIT, DEFAULT_TIMEOUT,
};
pub use error::{ApiError, ApiResult};
pub use records::{
    ArtifactCreate, ArtifactRecord, CanvasCategory, CanvasOwner, ChatResponse, ControlWidgetSnapshot,
    LogTailResponse, NotebookJobRecord, NotebookRunPayload, NotebookStatus, OpsAction,
    OpsCommandRequest, OpsCommandResponse, OpsStatus, PlaygroundManifestRecord, PresetDriftStatus,
    RuBudget, SearchPresetDrift, SearchTelemetrySummary, SearchTopPattern, TailLogEntry,
    TailLogEntryCreate, WidgetMetric, WidgetSparklines,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
