// Translation cache keyed by (text, target language), mirrored to durable
// storage. The whole map is rewritten on every insert.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};

use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub fn cache_key(text: &str, target_lang: &str) -> String {
    format!("{}-{}", text, target_lang)
}

pub struct TranslationCache {
    entries: HashMap<String, String>,
    store: Rc<dyn KeyValueStore>,
    storage_key: String,
}

impl TranslationCache {
    /// Reads the persisted map once. Missing or corrupt data yields an empty cache.
    pub fn load(store: Rc<dyn KeyValueStore>, storage_key: &str) -> Self {
        let entries = match read_entries(store.as_ref(), storage_key) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("discarding persisted translation cache: {}", err);
                HashMap::new()
            }
        };
        debug!("loaded {} cached translations", entries.len());
        Self {
            entries,
            store,
            storage_key: storage_key.to_string(),
        }
    }

    pub fn get(&self, text: &str, target_lang: &str) -> Option<&str> {
        self.entries
            .get(&cache_key(text, target_lang))
            .map(String::as_str)
    }

    /// The in-memory entry survives a failed write.
    pub fn insert(&mut self, text: &str, target_lang: &str, translated: String) {
        self.entries.insert(cache_key(text, target_lang), translated);
        if let Err(err) = self.persist() {
            warn!("translation cache not persisted: {}", err);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(err) = self.store.remove(&self.storage_key) {
            warn!("persisted translation cache not removed: {}", err);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.entries)?;
        self.store.set(&self.storage_key, &raw)
    }
}

fn read_entries(
    store: &dyn KeyValueStore,
    storage_key: &str,
) -> Result<HashMap<String, String>, StorageError> {
    match store.get(storage_key)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(HashMap::new()),
    }
}
