//! DataLab Core
//!
//! Ties the prompt recorder to the chat backend and carries the shared
//! configuration.
//!
//! # Core Concepts
//!
//! - [`PromptComposer`]: submission rules around a recorder (blank check,
//!   in-flight gate, reset on success only)
//! - [`InteractionOutcome`]: what a successful submission hands back
//! - [`ManifestPoller`]: latest playground manifest with optional auto-refresh
//! - [`DataLabConfig`]: defaults, then TOML, then `DATALAB_*` environment
//!
//! # Example
//!
//! ```rust,ignore
//! use datalab_core::prelude::*;
//! use std::sync::Arc;
//!
//! let config = DataLabConfig::load(None)?;
//! let client = ApiClient::new(&config.api_base_url)?.with_timeout(config.request_timeout());
//! let composer = PromptComposer::from_config(&config, Arc::new(client));
//!
//! composer.recorder().key_down("h", "KeyH");
//! composer.recorder().set_prompt("h");
//! let outcome = composer.submit().await?;
//! println!("{}", outcome.response_text);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod composer;
pub mod config;
pub mod error;
pub mod manifest;

pub use composer::{InteractionOutcome, PromptComposer, FALLBACK_RESPONSE_TEXT};
pub use config::{
    DataLabConfig, DEFAULT_API_BASE_URL, ENV_API_BASE_URL, ENV_MODEL_HINT, ENV_PLAYGROUND_NAME,
    ENV_PLAYGROUND_TENANT, ENV_UI_VERSION,
};
pub use error::{ConfigError, SubmitError};
pub use manifest::{
    ManifestPoller, ManifestState, DEFAULT_MANIFEST_POLL_INTERVAL, DEFAULT_PLAYGROUND_NAME,
    DEFAULT_PLAYGROUND_TENANT,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a DataLab session
    pub use crate::{
        ConfigError, DataLabConfig, InteractionOutcome, ManifestPoller, ManifestState, PromptComposer,
        SubmitError,
    };
    pub use datalab_client::{ApiClient, ApiError, ChatApi, ChatResponse, ManifestSource};
    pub use datalab_elements::{
        ConnectionRequest, ElementRegistry, ElementsCatalog, GraphDefinition, GraphStore, NodeId,
        PortDirection,
    };
    pub use datalab_telemetry::{
        estimate_tokens, ChatSubmissionPayload, PayloadEnvelope, PromptRecorder, RecorderConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
