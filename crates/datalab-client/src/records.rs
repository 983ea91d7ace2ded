//! Wire records exchanged with the DataLab backends
//!
//! Responses are read leniently: keys are accepted in `snake_case` or
//! `camelCase`, and timestamps may be epoch milliseconds or date strings.
//! When both spellings of a key are present the `snake_case` one wins, and a
//! `null` value counts as absent. Records serialize back out in `snake_case`
//! with millisecond timestamps.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Route a record's serde impls through the derive generated with
/// `#[serde(remote = "Self")]`, normalizing keys on the way in
macro_rules! lenient_keys {
    ($($record:ty),+ $(,)?) => {$(
        impl Serialize for $record {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                <$record>::serialize(self, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $record {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let fields = snake_case_keys(Map::deserialize(deserializer)?);
                <$record>::deserialize(Value::Object(fields)).map_err(serde::de::Error::custom)
            }
        }
    )+};
}

/// Milliseconds since the Unix epoch
pub type EpochMs = i64;

/// `GET /api/ops/status` body; shape owned by the ops backend
pub type OpsStatus = Value;

/// `POST /api/ops/command` response body; shape owned by the ops backend
pub type OpsCommandResponse = Value;

/// `POST /api/chat` response; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct ChatResponse {
    /// Backend id for this exchange
    #[serde(default)]
    pub interaction_id: Option<String>,
    /// Assistant reply
    #[serde(default)]
    pub ai_response_text: Option<String>,
    /// Model that produced the reply
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Who authored a shelf artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasOwner {
    /// Operator
    User,
    /// Co-authored
    Shared,
    /// Model
    Assistant,
}

/// Shelf grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasCategory {
    #[allow(missing_docs)]
    Hypothesis,
    #[allow(missing_docs)]
    Insight,
    #[allow(missing_docs)]
    Artifact,
    #[allow(missing_docs)]
    Signal,
}

/// Artifact shelf entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct ArtifactRecord {
    /// Record id
    pub id: String,
    /// Author
    pub owner: CanvasOwner,
    /// Headline
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Accent colour name
    #[serde(default)]
    pub accent: Option<String>,
    /// Shelf grouping
    #[serde(default)]
    pub category: Option<CanvasCategory>,
    /// Last update
    #[serde(default = "now_ms", deserialize_with = "lenient_timestamp")]
    pub updated_at: EpochMs,
    /// Creation time
    #[serde(default = "now_ms", deserialize_with = "lenient_timestamp")]
    pub created_at: EpochMs,
}

/// `POST /api/artifacts` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCreate {
    /// Headline
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Author
    pub owner: CanvasOwner,
    /// Shelf grouping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CanvasCategory>,
    /// Accent colour name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

impl ArtifactCreate {
    /// New artifact without category or accent
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>, owner: CanvasOwner) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            owner,
            category: None,
            accent: None,
        }
    }

    /// With category
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: CanvasCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// One line of the operator tail log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct TailLogEntry {
    /// Entry id
    pub id: String,
    /// Log text
    pub message: String,
    /// Emitting component
    #[serde(default)]
    pub source: Option<String>,
    /// Creation time
    #[serde(default = "now_ms", deserialize_with = "lenient_timestamp")]
    pub created_at: EpochMs,
}

/// `POST /api/tail-log` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailLogEntryCreate {
    /// Log text
    pub message: String,
    /// Emitting component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Ops command verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpsAction {
    #[allow(missing_docs)]
    Start,
    #[allow(missing_docs)]
    Stop,
    #[allow(missing_docs)]
    Restart,
    #[allow(missing_docs)]
    Status,
    #[allow(missing_docs)]
    Logs,
    #[allow(missing_docs)]
    Kill,
    #[allow(missing_docs)]
    KillAll,
}

/// `POST /api/ops/command` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpsCommandRequest {
    /// Verb
    pub action: OpsAction,
    /// Service name; backend default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// `auto`, `windows` or `linux`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Lines to return for `logs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_lines: Option<u32>,
}

impl OpsCommandRequest {
    /// Request with only an action
    #[must_use]
    pub fn new(action: OpsAction) -> Self {
        Self {
            action,
            target: None,
            runtime: None,
            log_lines: None,
        }
    }

    /// With target service
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Notebook job lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotebookStatus {
    #[allow(missing_docs)]
    Queued,
    #[allow(missing_docs)]
    Running,
    #[allow(missing_docs)]
    Succeeded,
    #[allow(missing_docs)]
    Failed,
}

/// Notebook execution job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct NotebookJobRecord {
    /// Job id
    pub id: String,
    /// Notebook file name
    pub name: String,
    /// Lifecycle state
    pub status: NotebookStatus,
    /// Enqueue time
    #[serde(default = "now_ms", deserialize_with = "lenient_timestamp")]
    pub created_at: EpochMs,
    /// Start time
    #[serde(default, deserialize_with = "lenient_optional_timestamp")]
    pub started_at: Option<EpochMs>,
    /// Completion time
    #[serde(default, deserialize_with = "lenient_optional_timestamp")]
    pub completed_at: Option<EpochMs>,
    /// Executed notebook location
    #[serde(default)]
    pub output_path: Option<String>,
    /// Failure message
    #[serde(default)]
    pub error: Option<String>,
    /// Injected parameters
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// `POST /api/control/notebooks` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookRunPayload {
    /// Notebook file name
    pub name: String,
    /// Injected parameters
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

impl NotebookRunPayload {
    /// Run without parameters
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Map::new(),
        }
    }

    /// With one parameter
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// `GET /api/control/logs` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTailResponse {
    /// Service the lines belong to
    pub service: String,
    /// Most recent lines, oldest first
    #[serde(default)]
    pub lines: Vec<String>,
}

/// One headline metric on the control widgets panel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct WidgetMetric {
    /// Metric id
    pub id: String,
    /// Display label
    pub label: String,
    /// Current value
    #[serde(default)]
    pub value: f64,
    /// Change against the previous window, in percent
    #[serde(default)]
    pub change_pct: f64,
    /// Unit suffix
    #[serde(default)]
    pub unit: Option<String>,
}

/// Recent series for the widget sparklines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct WidgetSparklines {
    #[allow(missing_docs)]
    #[serde(default)]
    pub latency: Vec<f64>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub ru: Vec<f64>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub throughput: Vec<f64>,
}

/// Request-unit budget
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct RuBudget {
    #[allow(missing_docs)]
    #[serde(default)]
    pub total: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub consumed: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub remaining: f64,
}

/// `GET /api/control/widgets` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct ControlWidgetSnapshot {
    /// When the backend computed the snapshot
    #[serde(default = "now_ms", deserialize_with = "lenient_timestamp")]
    pub generated_at: EpochMs,
    /// Headline metrics
    #[serde(default)]
    pub metrics: Vec<WidgetMetric>,
    /// Sparkline series
    #[serde(default)]
    pub sparklines: WidgetSparklines,
    /// Request-unit budget
    #[serde(default)]
    pub ru_budget: RuBudget,
}

/// Most-run search pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct SearchTopPattern {
    /// Pattern text
    pub pattern: String,
    /// Runs using it
    #[serde(default)]
    pub runs: u64,
    /// Matches across those runs
    #[serde(default)]
    pub total_matches: u64,
    /// Mean files scanned per run
    #[serde(default)]
    pub avg_files_scanned: f64,
}

/// Direction a search preset is drifting in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetDriftStatus {
    #[allow(missing_docs)]
    #[default]
    Stable,
    #[allow(missing_docs)]
    Regressing,
    #[allow(missing_docs)]
    Improving,
}

/// Lifetime against recent behaviour of one search preset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct SearchPresetDrift {
    /// Preset name
    pub preset: String,
    /// Preset tags
    #[serde(default)]
    pub tags: Vec<String>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub total_runs: u64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub recent_runs: u64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub match_rate_lifetime: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub match_rate_recent: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub avg_duration_lifetime: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub avg_duration_recent: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub avg_density_lifetime: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub avg_density_recent: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub delta_match_rate: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub delta_duration_ms: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub delta_density: f64,
    /// Drift verdict
    #[serde(default)]
    pub status: PresetDriftStatus,
}

/// `GET /api/ops/search-telemetry` body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct SearchTelemetrySummary {
    /// All recorded runs
    #[serde(default)]
    pub total_runs: u64,
    /// Runs in the last 24 hours
    #[serde(default)]
    pub runs_last_24h: u64,
    /// Runs that matched anything
    #[serde(default)]
    pub runs_with_matches: u64,
    /// `runs_with_matches / total_runs`
    #[serde(default)]
    pub match_rate: f64,
    #[allow(missing_docs)]
    #[serde(default)]
    pub avg_duration_ms: Option<f64>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub avg_match_density: Option<f64>,
    /// Newest ingested run
    #[serde(default, deserialize_with = "lenient_optional_timestamp")]
    pub last_ingest_at: Option<EpochMs>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub top_patterns: Vec<SearchTopPattern>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub preset_drift: Vec<SearchPresetDrift>,
}

/// Published playground manifest revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct PlaygroundManifestRecord {
    /// Record id
    pub id: String,
    /// Owning tenant
    pub tenant: String,
    /// Playground name
    pub playground: String,
    /// Monotonic revision number
    pub revision: i64,
    /// Human revision tag
    #[serde(default)]
    pub revision_label: Option<String>,
    /// Cookbook that published it
    #[serde(default)]
    pub cookbook: Option<String>,
    /// Recipe within the cookbook
    #[serde(default)]
    pub recipe: Option<String>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub author: Option<String>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub notes: Option<String>,
    /// Manifest document; shape owned by the playground backend
    #[serde(default)]
    pub manifest: Map<String, Value>,
    /// Content checksum
    pub checksum: String,
    /// Creation time
    #[serde(default = "now_ms", deserialize_with = "lenient_timestamp")]
    pub created_at: EpochMs,
    /// Last update
    #[serde(default = "now_ms", deserialize_with = "lenient_timestamp")]
    pub updated_at: EpochMs,
}

lenient_keys!(
    ChatResponse,
    ArtifactRecord,
    TailLogEntry,
    NotebookJobRecord,
    WidgetMetric,
    WidgetSparklines,
    RuBudget,
    ControlWidgetSnapshot,
    SearchTopPattern,
    SearchPresetDrift,
    SearchTelemetrySummary,
    PlaygroundManifestRecord,
);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(f64),
    Text(String),
}

fn now_ms() -> EpochMs {
    chrono::Utc::now().timestamp_millis()
}

/// Parse a timestamp string; `None` when no known format matches
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<EpochMs> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    // Naive ISO strings are read as UTC
    chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[allow(clippy::cast_possible_truncation)]
fn normalize(raw: RawTimestamp) -> EpochMs {
    match raw {
        RawTimestamp::Millis(ms) => ms as EpochMs,
        RawTimestamp::Text(text) => parse_timestamp(&text).unwrap_or_else(now_ms),
    }
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EpochMs, D::Error> {
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(raw.map_or_else(now_ms, normalize))
}

fn lenient_optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<EpochMs>, D::Error> {
    Ok(Option::<RawTimestamp>::deserialize(deserializer)?.map(normalize))
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            if prev.is_some() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            // runsLast24h -> runs_last_24h
            if c.is_ascii_digit() && prev.is_some_and(|p| p.is_ascii_alphabetic()) {
                out.push('_');
            }
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Fold `camelCase` keys into `snake_case` and drop `null` values
fn snake_case_keys(fields: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(fields.len());
    let mut camel = Vec::new();
    for (key, value) in fields {
        if value.is_null() {
            continue;
        }
        if key.chars().any(|c| c.is_ascii_uppercase()) {
            camel.push((to_snake_case(&key), value));
        } else {
            out.insert(key, value);
        }
    }
    for (key, value) in camel {
        out.entry(key).or_insert(value);
    }
    out
}
