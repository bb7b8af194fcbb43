//! Contracts for the engine's external collaborators.
//!
//! - [`DocumentStore`]: synchronous key-value persistence for documents and their insights.
//!   [`MemoryStore`] implements it over a flat string map holding JSON values.
//! - [`Analyzer`]: the only asynchronous collaborator; returns raw insights whose ranges are
//!   resolved against the submitted text, or fails outright.

use crate::error::{AnalyzerError, StoreError};
use crate::insight::{Insight, synthesize_id};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use tracing::warn;

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique identifier.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Full text.
    pub content: String,
    /// Last save time.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a document with a locally synthesized id.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(synthesize_id("doc"), title, content)
    }

    /// Create a document with a known id.
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            updated_at: Utc::now(),
        }
    }
}

/// Persistence for documents and insights.
pub trait DocumentStore {
    /// Fetch a document.
    fn get(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert or replace a document.
    fn save(&mut self, document: &Document) -> Result<(), StoreError>;

    /// Insights stored for a document (empty if none).
    fn list_insights(&self, doc_id: &str) -> Result<Vec<Insight>, StoreError>;

    /// Replace the insights stored for a document.
    fn save_insights(&mut self, doc_id: &str, insights: &[Insight]) -> Result<(), StoreError>;
}

/// External insight producer.
pub trait Analyzer {
    /// Analyze `text`, returning at most `max_insights` raw insights.
    fn analyze(
        &self,
        text: &str,
        max_insights: usize,
    ) -> impl Future<Output = Result<Vec<Insight>, AnalyzerError>>;
}

/// In-memory flat key-value store holding JSON values.
///
/// Documents live under `doc:<id>` and insight lists under `insights:<id>`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value under `key`.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Overwrite the raw value under `key`.
    pub fn set_raw(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Ids of all stored documents.
    pub fn document_ids(&self) -> Vec<String> {
        self.entries
            .keys()
            .filter_map(|key| key.strip_prefix("doc:"))
            .map(str::to_string)
            .collect()
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.entries.get(key) else {
            return Ok(None);
        };
        serde_json::from_str(raw).map(Some).map_err(|source| {
            warn!(key, %source, "stored value failed to decode");
            StoreError::Corrupt {
                key: key.to_string(),
                source,
            }
        })
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: String, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.clone(),
            source,
        })?;
        self.entries.insert(key, raw);
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        self.read(&format!("doc:{id}"))
    }

    fn save(&mut self, document: &Document) -> Result<(), StoreError> {
        self.write(format!("doc:{}", document.id), document)
    }

    fn list_insights(&self, doc_id: &str) -> Result<Vec<Insight>, StoreError> {
        Ok(self
            .read::<Vec<Insight>>(&format!("insights:{doc_id}"))?
            .unwrap_or_default())
    }

    fn save_insights(&mut self, doc_id: &str, insights: &[Insight]) -> Result<(), StoreError> {
        self.write(format!("insights:{doc_id}"), insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_round_trip() {
        let mut store = MemoryStore::new();
        let document = Document::with_id("d1", "Budget paper", "Text.");

        store.save(&document).unwrap();
        assert_eq!(store.get("d1").unwrap(), Some(document));
        assert_eq!(store.get("missing").unwrap(), None);
        assert_eq!(store.document_ids(), vec!["d1".to_string()]);
    }

    #[test]
    fn test_insights_default_to_empty() {
        let store = MemoryStore::new();
        assert!(store.list_insights("d1").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_value_is_reported() {
        let mut store = MemoryStore::new();
        store.set_raw("insights:d1", "{not json");

        let err = store.list_insights("d1").unwrap_err();
        let StoreError::Corrupt { key, .. } = err else {
            panic!("expected a corrupt value error");
        };
        assert_eq!(key, "insights:d1");
    }
}
