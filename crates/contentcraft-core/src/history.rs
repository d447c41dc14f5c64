use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Template;
use crate::content::ContentKind;
use crate::input::GenerationInput;
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};

/// Storage key holding the serialized history list
pub const HISTORY_KEY: &str = "contentcraft_history";

/// One completed generation. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub template_name: String,
    /// Plain text, or a `data:` URL for image and audio results
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub inputs: GenerationInput,
}

impl HistoryItem {
    pub fn new(template_name: &str, content: String, inputs: GenerationInput) -> Self {
        let created_at = Utc::now();
        Self {
            id: created_at.timestamp_millis().to_string(),
            template_name: template_name.to_string(),
            content,
            created_at,
            inputs,
        }
    }

    pub fn kind(&self) -> ContentKind {
        ContentKind::of(&self.content)
    }

    /// Short one-line description used in history listings.
    pub fn summary(&self, max_chars: usize) -> String {
        let source = match self.kind() {
            ContentKind::Image => self.inputs.get("prompt").unwrap_or("Image generation"),
            ContentKind::Audio => self.inputs.get("text").unwrap_or("Voice generation"),
            ContentKind::Text => self.content.as_str(),
        };
        let line = source.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
        if line.chars().count() > max_chars {
            let truncated: String = line.chars().take(max_chars).collect();
            format!("{}...", truncated)
        } else {
            line.to_string()
        }
    }
}

/// Newest-first list of past results, mirrored to a [`KeyValueStore`] on
/// every change.
pub struct HistoryStore {
    store: Box<dyn KeyValueStore>,
    items: Vec<HistoryItem>,
    persistent: bool,
}

impl HistoryStore {
    /// Load history from `store`. Unreadable or malformed data is logged and
    /// treated as an empty history.
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let items = match load_items(store.as_ref()) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Failed to load history, starting empty: {:#}", e);
                Vec::new()
            }
        };
        tracing::debug!(count = items.len(), "history loaded");
        Self {
            store,
            items,
            persistent: true,
        }
    }

    /// Open the SQLite history at `path`. A database that cannot be opened
    /// (corrupt, not SQLite, unwritable directory) is logged and replaced by
    /// an in-memory store for this session.
    pub fn open_file(path: &Path) -> Self {
        match SqliteStore::open(path) {
            Ok(store) => Self::open(Box::new(store)),
            Err(e) => {
                tracing::warn!("History database unavailable, using memory only: {:#}", e);
                let mut history = Self::open(Box::new(MemoryStore::new()));
                history.persistent = false;
                history
            }
        }
    }

    /// False when history lives only in memory because the database failed
    /// to open.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn append(&mut self, item: HistoryItem) -> Result<()> {
        self.items.insert(0, item);
        self.persist()
    }

    /// Build and append the item for a finished generation.
    pub fn record(
        &mut self,
        template: &Template,
        inputs: &GenerationInput,
        content: &str,
    ) -> Result<&HistoryItem> {
        let item = HistoryItem::new(template.name, content.to_string(), inputs.clone());
        self.append(item)?;
        Ok(&self.items[0])
    }

    /// Drop every item. Callers confirm with the user first.
    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.persist()
    }

    pub fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.items)?;
        self.store
            .set(HISTORY_KEY, &json)
            .context("Failed to save history")
    }
}

fn load_items(store: &dyn KeyValueStore) -> Result<Vec<HistoryItem>> {
    match store.get(HISTORY_KEY)? {
        Some(json) => serde_json::from_str(&json).context("Stored history is malformed"),
        None => Ok(Vec::new()),
    }
}
