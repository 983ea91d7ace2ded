//! Playground manifest polling
//!
//! [`ManifestPoller`] keeps the latest published manifest for one
//! tenant/playground pair. A refresh that finds nothing published clears the
//! manifest and sets a status line; a failed refresh keeps whatever was loaded
//! before and records the error instead. Auto-refresh runs on a fixed tokio
//! interval and is off until enabled.

use crate::config::DataLabConfig;
use datalab_client::{ApiResult, ManifestSource, PlaygroundManifestRecord};
use datalab_telemetry::{Clock, SystemClock, TimestampMs};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Tenant polled when none is configured
pub const DEFAULT_PLAYGROUND_TENANT: &str = "demo-tenant";

/// Playground polled when none is configured
pub const DEFAULT_PLAYGROUND_NAME: &str = "welcome-control";

/// Auto-refresh period when none is configured
pub const DEFAULT_MANIFEST_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// What the dashboard shows about the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestState {
    /// Polled tenant
    pub tenant: String,
    /// Polled playground
    pub playground: String,
    /// Latest manifest, if one is published
    pub manifest: Option<PlaygroundManifestRecord>,
    /// No fetch has completed yet
    pub loading: bool,
    /// A fetch is in progress
    pub refreshing: bool,
    /// Message from the last failed fetch
    pub error: Option<String>,
    /// Informational line, set when nothing is published
    pub status: Option<String>,
    /// Completion time of the last successful fetch
    pub last_fetched: Option<TimestampMs>,
}

impl ManifestState {
    fn new(tenant: String, playground: String) -> Self {
        Self {
            tenant,
            playground,
            manifest: None,
            loading: true,
            refreshing: false,
            error: None,
            status: None,
            last_fetched: None,
        }
    }

    fn apply(&mut self, result: ApiResult<Option<PlaygroundManifestRecord>>, now: TimestampMs) {
        match result {
            Ok(Some(manifest)) => {
                tracing::debug!(revision = manifest.revision, "manifest loaded");
                self.manifest = Some(manifest);
                self.status = None;
                self.error = None;
                self.last_fetched = Some(now);
            }
            Ok(None) => {
                self.manifest = None;
                self.status = Some(format!(
                    "No manifest published for {}/{} yet. Run the Welcome Cookbook to push one.",
                    self.tenant, self.playground
                ));
                self.error = None;
                self.last_fetched = Some(now);
            }
            Err(e) => {
                tracing::warn!(error = %e, tenant = %self.tenant, playground = %self.playground, "manifest refresh failed");
                self.error = Some(e.to_string());
            }
        }
    }
}

struct Shared {
    source: Arc<dyn ManifestSource>,
    clock: Arc<dyn Clock>,
    state: Mutex<ManifestState>,
}

impl Shared {
    async fn refresh(&self) {
        let (tenant, playground) = {
            let mut state = self.state.lock();
            state.refreshing = true;
            (state.tenant.clone(), state.playground.clone())
        };
        let result = self.source.fetch_latest_manifest(&tenant, &playground).await;
        let now = self.clock.now_ms();

        let mut state = self.state.lock();
        state.apply(result, now);
        state.refreshing = false;
        state.loading = false;
    }
}

/// Latest-manifest tracker for one tenant/playground
pub struct ManifestPoller {
    shared: Arc<Shared>,
    poll_interval: Duration,
    auto_refresh: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ManifestPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestPoller")
            .field("state", &*self.shared.state.lock())
            .field("poll_interval", &self.poll_interval)
            .field("auto_refresh", &self.auto_refresh_enabled())
            .finish_non_exhaustive()
    }
}

impl ManifestPoller {
    /// Poller with the wall clock and the default interval; nothing is fetched yet
    #[must_use]
    pub fn new(source: Arc<dyn ManifestSource>, tenant: impl Into<String>, playground: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                clock: Arc::new(SystemClock),
                state: Mutex::new(ManifestState::new(tenant.into(), playground.into())),
            }),
            poll_interval: DEFAULT_MANIFEST_POLL_INTERVAL,
            auto_refresh: Mutex::new(None),
        }
    }

    /// Poller for the playground and interval named in `config`
    #[must_use]
    pub fn from_config(config: &DataLabConfig, source: Arc<dyn ManifestSource>) -> Self {
        Self::new(source, config.playground_tenant.clone(), config.playground_name.clone())
            .with_poll_interval(config.manifest_poll_interval())
    }

    /// With auto-refresh period; zero is clamped to one millisecond
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// With the clock stamping `last_fetched`
    ///
    /// Has no effect once auto-refresh has been enabled.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.clock = clock;
        }
        self
    }

    /// Auto-refresh period
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Copy of the current state
    #[must_use]
    pub fn state(&self) -> ManifestState {
        self.shared.state.lock().clone()
    }

    /// Fetch the latest manifest now
    ///
    /// Failures are recorded in [`ManifestState::error`], not returned.
    pub async fn refresh(&self) {
        self.shared.refresh().await;
    }

    /// Start or stop the periodic refresh
    ///
    /// The first periodic fetch happens one interval after enabling. Enabling
    /// must happen within a tokio runtime.
    pub fn set_auto_refresh(&self, enabled: bool) {
        let mut slot = self.auto_refresh.lock();
        if let Some(handle) = slot.take() {
            handle.abort();
        }
        if enabled {
            *slot = Some(spawn_refresh_loop(Arc::downgrade(&self.shared), self.poll_interval));
        }
        tracing::debug!(enabled, interval_ms = self.poll_interval.as_millis(), "manifest auto-refresh");
    }

    /// Whether the periodic refresh is running
    #[must_use]
    pub fn auto_refresh_enabled(&self) -> bool {
        self.auto_refresh
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ManifestPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.auto_refresh.lock().take() {
            handle.abort();
        }
    }
}

fn spawn_refresh_loop(shared: Weak<Shared>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(shared) = shared.upgrade() else {
                break;
            };
            shared.refresh().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalab_client::ApiError;
    use pretty_assertions::assert_eq;

    fn state() -> ManifestState {
        ManifestState::new("t".into(), "p".into())
    }

    #[test]
    fn nothing_published_sets_status() {
        let mut state = state();
        state.error = Some("old".into());
        state.apply(Ok(None), 10);

        assert_eq!(
            state.status.as_deref(),
            Some("No manifest published for t/p yet. Run the Welcome Cookbook to push one.")
        );
        assert_eq!(state.error, None);
        assert_eq!(state.last_fetched, Some(10));
    }

    #[test]
    fn failure_keeps_last_fetch_time() {
        let mut state = state();
        state.apply(Ok(None), 10);
        state.apply(
            Err(ApiError::Http {
                status: 502,
                detail: "bad gateway".into(),
            }),
            20,
        );

        assert_eq!(state.error.as_deref(), Some("Request failed (502): bad gateway"));
        assert_eq!(state.last_fetched, Some(10));
        assert!(state.status.is_some());
    }
}
