//! Blackboard: a shared workspace where agents publish and read results.
//!
//! Every write appends a new version of the key; reads return the latest
//! version. Keys are never removed during a run, so the full history of a
//! key stays available through [`Blackboard::versions`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use patternlab_core::BlackboardError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A single version of a key on the blackboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackboardEntry {
    pub key: String,
    pub value: Value,
    /// Agent that wrote this version
    pub author: String,
    pub timestamp: DateTime<Utc>,
    /// 1-based, increments on each write to the same key
    pub version: u32,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Write,
}

/// One entry in the change log, in write order across all keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub action: ChangeAction,
    pub key: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub version: u32,
}

impl From<&BlackboardEntry> for ChangeRecord {
    fn from(entry: &BlackboardEntry) -> Self {
        Self {
            action: ChangeAction::Write,
            key: entry.key.clone(),
            author: entry.author.clone(),
            timestamp: entry.timestamp,
            version: entry.version,
        }
    }
}

/// Point-in-time overview of a blackboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackboardSummary {
    pub name: String,
    pub total_entries: usize,
    pub contributors: Vec<String>,
    pub keys: Vec<String>,
    pub total_changes: usize,
}

#[derive(Debug, Default)]
struct BoardState {
    /// All versions per key, oldest first. Never empty for a present key.
    entries: BTreeMap<String, Vec<BlackboardEntry>>,
    changes: Vec<ChangeRecord>,
}

impl BoardState {
    fn latest(&self, key: &str) -> Option<&BlackboardEntry> {
        self.entries.get(key).and_then(|versions| versions.last())
    }

    fn latest_entries(&self) -> impl Iterator<Item = &BlackboardEntry> {
        self.entries.values().filter_map(|versions| versions.last())
    }
}

/// Shared workspace for multi-agent collaboration.
///
/// All reads and writes are serialized through one lock; share the board
/// between agents with `Arc<Blackboard>`.
pub struct Blackboard {
    name: String,
    state: Mutex<BoardState>,
}

impl Blackboard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(BoardState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write a new version of `key` and return it.
    pub fn write(
        &self,
        key: impl Into<String>,
        value: Value,
        author: impl Into<String>,
        metadata: Option<Map<String, Value>>,
    ) -> BlackboardEntry {
        let key = key.into();
        let mut state = self.state.lock();

        let version = state.latest(&key).map(|e| e.version + 1).unwrap_or(1);
        let entry = BlackboardEntry {
            key: key.clone(),
            value,
            author: author.into(),
            timestamp: Utc::now(),
            version,
            metadata: metadata.unwrap_or_default(),
        };

        debug!(board = %self.name, key = %key, author = %entry.author, version, "Blackboard write");

        state.changes.push(ChangeRecord::from(&entry));
        state.entries.entry(key).or_default().push(entry.clone());
        entry
    }

    /// Latest value for `key`, or `None` if it was never written.
    pub fn read(&self, key: &str) -> Option<Value> {
        self.state.lock().latest(key).map(|e| e.value.clone())
    }

    /// Latest value for `key`, failing when it is absent.
    pub fn require(&self, key: &str) -> Result<Value, BlackboardError> {
        self.read(key).ok_or_else(|| BlackboardError::NotFound {
            board: self.name.clone(),
            key: key.to_string(),
        })
    }

    /// Latest entry (value plus authorship and metadata) for `key`.
    pub fn read_entry(&self, key: &str) -> Option<BlackboardEntry> {
        self.state.lock().latest(key).cloned()
    }

    /// Snapshot of every key's latest value.
    pub fn read_all(&self) -> BTreeMap<String, Value> {
        let state = self.state.lock();
        state
            .latest_entries()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect()
    }

    /// Snapshot of every key's latest entry.
    pub fn read_all_entries(&self) -> BTreeMap<String, BlackboardEntry> {
        let state = self.state.lock();
        state
            .latest_entries()
            .map(|e| (e.key.clone(), e.clone()))
            .collect()
    }

    /// Every version written for `key`, oldest first.
    pub fn versions(&self, key: &str) -> Vec<BlackboardEntry> {
        self.state
            .lock()
            .entries
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct authors of the current entries, sorted.
    pub fn contributors(&self) -> Vec<String> {
        let state = self.state.lock();
        Self::collect_contributors(&state)
    }

    fn collect_contributors(state: &BoardState) -> Vec<String> {
        state
            .latest_entries()
            .map(|e| e.author.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn summary(&self) -> BlackboardSummary {
        let state = self.state.lock();
        BlackboardSummary {
            name: self.name.clone(),
            total_entries: state.entries.len(),
            contributors: Self::collect_contributors(&state),
            keys: state.entries.keys().cloned().collect(),
            total_changes: state.changes.len(),
        }
    }

    /// Change log in write order, optionally filtered by key.
    pub fn history(&self, key: Option<&str>) -> Vec<ChangeRecord> {
        let state = self.state.lock();
        match key {
            Some(k) => state.changes.iter().filter(|c| c.key == k).cloned().collect(),
            None => state.changes.clone(),
        }
    }

    /// Pretty JSON of the current entries: `{"name": .., "entries": {..}}`.
    pub fn to_json(&self) -> Result<String, BlackboardError> {
        let entries = self.read_all_entries();
        let doc = serde_json::json!({
            "name": self.name,
            "entries": entries,
        });
        serde_json::to_string_pretty(&doc).map_err(|e| BlackboardError::Serialization(e.to_string()))
    }
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new("SharedWorkspace")
    }
}

impl std::fmt::Display for Blackboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Blackboard '{}' ({} entries)", self.name, self.len())
    }
}
