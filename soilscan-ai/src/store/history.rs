//! Bounded local history store
//!
//! Keeps the most recent analyses as one ordered JSON array on disk,
//! newest first, capped at [`MAX_RECORDS`]. Eviction happens on insert
//! (and import), never on read. Mutations run behind a single mutex so
//! concurrent writers cannot lose updates; the file is replaced
//! atomically (temp file + rename) on every persist.

use crate::types::{AnalysisResult, HistoryRecord, SoilType};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use soilscan_common::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Maximum number of retained records
pub const MAX_RECORDS: usize = 50;

/// Aggregate statistics over the current record set
///
/// Computed freshly from the stored records on every call, never cached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatistics {
    pub total_count: usize,
    pub counts_by_soil_type: HashMap<SoilType, usize>,
    /// One-decimal mean of stored confidences (0 when empty)
    pub average_confidence: f64,
    pub oldest_timestamp: Option<chrono::DateTime<Utc>>,
    pub newest_timestamp: Option<chrono::DateTime<Utc>>,
}

/// Bounded, ordered, keyed store of past analyses
pub struct HistoryStore {
    path: PathBuf,
    records: Mutex<Vec<HistoryRecord>>,
}

impl HistoryStore {
    /// Open the store, loading any existing history file
    ///
    /// A missing file starts an empty history; an unreadable or
    /// undecodable file is a `Storage` error.
    pub fn open(path: PathBuf) -> Result<Self> {
        let records = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::Storage(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let records: Vec<HistoryRecord> = serde_json::from_str(&content).map_err(|e| {
                Error::Storage(format!("Failed to decode {}: {}", path.display(), e))
            })?;
            tracing::info!(
                record_count = records.len(),
                path = %path.display(),
                "History loaded"
            );
            records
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Save a new analysis, evicting the oldest records past the cap
    ///
    /// Prepends (most-recent-first order), truncates the tail to
    /// [`MAX_RECORDS`], and persists the whole list.
    pub async fn save(
        &self,
        image_bytes: &[u8],
        result: &AnalysisResult,
    ) -> Result<HistoryRecord> {
        let record = HistoryRecord {
            id: generate_record_id(),
            timestamp: Utc::now(),
            image_data: BASE64.encode(image_bytes),
            result: result.clone(),
        };

        let mut records = self.records.lock().await;
        records.insert(0, record.clone());
        records.truncate(MAX_RECORDS);
        self.persist(&records)?;

        tracing::info!(
            record_id = %record.id,
            soil_type = %record.result.soil_type,
            record_count = records.len(),
            "Analysis saved to history"
        );

        Ok(record)
    }

    /// All records, most recent first
    pub async fn get_all(&self) -> Vec<HistoryRecord> {
        self.records.lock().await.clone()
    }

    /// Look up a record by id
    pub async fn get_by_id(&self, id: &str) -> Option<HistoryRecord> {
        self.records
            .lock()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    /// The first `count` records of the ordered list
    pub async fn get_recent(&self, count: usize) -> Vec<HistoryRecord> {
        let records = self.records.lock().await;
        records.iter().take(count).cloned().collect()
    }

    /// Delete a record by id; returns whether a removal occurred
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| record.id != id);

        if records.len() == before {
            return Ok(false);
        }

        self.persist(&records)?;
        tracing::info!(record_id = %id, "History record deleted");
        Ok(true)
    }

    /// Remove all records
    pub async fn clear_all(&self) -> Result<usize> {
        let mut records = self.records.lock().await;
        let removed = records.len();
        records.clear();
        self.persist(&records)?;
        tracing::info!(removed, "History cleared");
        Ok(removed)
    }

    /// Serialize the full current history as a downloadable JSON document
    pub async fn export_all(&self) -> Result<String> {
        let records = self.records.lock().await;
        serde_json::to_string_pretty(&*records)
            .map_err(|e| Error::Storage(format!("Failed to serialize history: {e}")))
    }

    /// Replace the history with an imported JSON array
    ///
    /// Atomic: a payload that is not an ordered record array is rejected
    /// with `InvalidFormat` and the current history is untouched. The cap
    /// applies to imported lists as well. Returns the imported count.
    pub async fn import_all(&self, payload: &str) -> Result<usize> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| Error::InvalidFormat(format!("Payload is not JSON: {e}")))?;

        if !value.is_array() {
            return Err(Error::InvalidFormat(
                "Payload must be a JSON array of history records".to_string(),
            ));
        }

        let mut imported: Vec<HistoryRecord> = serde_json::from_value(value)
            .map_err(|e| Error::InvalidFormat(format!("Record array malformed: {e}")))?;
        imported.truncate(MAX_RECORDS);

        let mut records = self.records.lock().await;
        *records = imported;
        self.persist(&records)?;

        tracing::info!(record_count = records.len(), "History imported");
        Ok(records.len())
    }

    /// Compute statistics over the current record set
    pub async fn statistics(&self) -> HistoryStatistics {
        let records = self.records.lock().await;

        let mut counts_by_soil_type: HashMap<SoilType, usize> = HashMap::new();
        for record in records.iter() {
            *counts_by_soil_type
                .entry(record.result.soil_type)
                .or_insert(0) += 1;
        }

        let average_confidence = if records.is_empty() {
            0.0
        } else {
            let sum: f64 = records.iter().map(|r| r.result.confidence).sum();
            crate::types::round_to_tenth(sum / records.len() as f64)
        };

        HistoryStatistics {
            total_count: records.len(),
            counts_by_soil_type,
            average_confidence,
            oldest_timestamp: records.last().map(|r| r.timestamp),
            newest_timestamp: records.first().map(|r| r.timestamp),
        }
    }

    /// Size of the persisted blob in bytes (0 when nothing persisted yet)
    pub fn storage_size(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Atomically replace the persisted file with the given record list
    fn persist(&self, records: &[HistoryRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| Error::Storage(format!("Failed to serialize history: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| {
            Error::Storage(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            Error::Storage(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        Ok(())
    }
}

/// Time-derived id with a random suffix
///
/// Collision-resistant in practice; uniqueness is not formally
/// guaranteed and collisions are an accepted negligible risk.
fn generate_record_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!(
        "analysis_{}_{}",
        Utc::now().timestamp_millis(),
        suffix.to_lowercase()
    )
}
