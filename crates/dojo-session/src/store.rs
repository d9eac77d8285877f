//! Progress persistence
//!
//! The session never touches storage directly; it is handed a
//! [`ProgressStore`]. Loading is infallible: every persisted key is decoded on
//! its own, and a missing or corrupt key falls back to its initial value.

use crate::error::StoreError;
use dojo_core::{MissionId, ProgressState};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Key for the ordered list of completed mission ids
pub const KEY_COMPLETED: &str = "completed";
/// Key for the cumulative score
pub const KEY_SCORE: &str = "score";
/// Key for the furthest-reached watermark
pub const KEY_FURTHEST: &str = "furthest_reached";
/// Key for the onboarding flag
pub const KEY_ONBOARDING: &str = "onboarding_seen";

/// Persistence capability injected into a session
pub trait ProgressStore: Send + Sync {
    /// Load progress, defaulting anything absent or unreadable
    fn load(&self) -> ProgressState;

    /// Persist the whole record
    ///
    /// # Errors
    /// Returns [`StoreError`] if the record could not be written.
    fn save(&self, state: &ProgressState) -> Result<(), StoreError>;

    /// Remove every persisted key
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backing storage could not be cleared.
    fn clear(&self) -> Result<(), StoreError>;
}

impl<T: ProgressStore + ?Sized> ProgressStore for Arc<T> {
    fn load(&self) -> ProgressState {
        (**self).load()
    }

    fn save(&self, state: &ProgressState) -> Result<(), StoreError> {
        (**self).save(state)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// Encode progress as the persisted JSON object
#[must_use]
pub fn encode(state: &ProgressState) -> Value {
    let completed: Vec<u32> = state.completed.iter().map(|id| id.get()).collect();
    json!({
        KEY_COMPLETED: completed,
        KEY_SCORE: state.score,
        KEY_FURTHEST: state.furthest_reached.get(),
        KEY_ONBOARDING: state.onboarding_seen,
    })
}

/// Decode progress key by key
///
/// Anything that is not an object decodes to the initial state.
#[must_use]
pub fn decode_lenient(value: &Value) -> ProgressState {
    let mut state = ProgressState::new();
    let Some(map) = value.as_object() else {
        tracing::warn!("persisted progress is not an object; using defaults");
        return state;
    };

    if let Some(completed) = field(map, KEY_COMPLETED, decode_completed) {
        state.completed = completed.into_iter().collect();
    }
    if let Some(score) = field(map, KEY_SCORE, decode_u64) {
        state.score = score;
    }
    if let Some(furthest) = field(map, KEY_FURTHEST, decode_mission_id) {
        state.furthest_reached = furthest;
    }
    if let Some(seen) = field(map, KEY_ONBOARDING, decode_bool) {
        state.onboarding_seen = seen;
    }
    state
}

fn field<T>(
    map: &Map<String, Value>,
    key: &'static str,
    decode: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let raw = map.get(key)?;
    let decoded = decode(raw);
    if decoded.is_none() {
        tracing::warn!(key, "corrupt persisted value; using default");
    }
    decoded
}

// Legacy writers stored numbers and flags as strings.
fn decode_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn decode_mission_id(value: &Value) -> Option<MissionId> {
    let raw = u32::try_from(decode_u64(value)?).ok()?;
    (raw >= 1).then_some(MissionId(raw))
}

fn decode_completed(value: &Value) -> Option<Vec<MissionId>> {
    value.as_array()?.iter().map(decode_mission_id).collect()
}

fn decode_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<Value>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a raw persisted value
    #[must_use]
    pub fn with_raw(value: Value) -> Self {
        Self {
            record: Mutex::new(Some(value)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Raw persisted value, if any
    #[must_use]
    pub fn raw(&self) -> Option<Value> {
        self.record.lock().clone()
    }

    /// Number of successful saves
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> ProgressState {
        self.record
            .lock()
            .as_ref()
            .map(decode_lenient)
            .unwrap_or_default()
    }

    fn save(&self, state: &ProgressState) -> Result<(), StoreError> {
        *self.record.lock() = Some(encode(state));
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.record.lock() = None;
        Ok(())
    }
}

/// JSON file store
///
/// Writes go to a sibling temp file that is synced and then renamed over the
/// target, so a crash mid-write never leaves a half-written record.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> ProgressState {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ProgressState::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read progress; using defaults");
                return ProgressState::new();
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => decode_lenient(&value),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "progress file is not json; using defaults");
                ProgressState::new()
            }
        }
    }

    fn save(&self, state: &ProgressState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&encode(state))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io_error(parent, e))?;
        }
        let tmp = self.temp_path();
        write_synced(&tmp, &bytes).map_err(|e| StoreError::io_error(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::io_error(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "progress saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io_error(&self.path, e)),
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
