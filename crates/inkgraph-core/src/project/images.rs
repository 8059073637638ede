//! Project image cache, keyed by the `key` image shapes refer to.

use crate::shapes::ImageFormat;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Image bytes stored base64-encoded so the project stays plain JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageCache {
    entries: BTreeMap<String, String>,
}

impl ImageCache {
    /// Add image bytes and return the generated key.
    pub fn add(&mut self, data: &[u8]) -> String {
        let ext = ImageFormat::from_magic_bytes(data)
            .map(|f| f.extension())
            .unwrap_or("bin");
        let key = format!("images/{}.{}", Uuid::new_v4(), ext);
        self.entries.insert(key.clone(), STANDARD.encode(data));
        key
    }

    /// Decoded bytes for a key.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).and_then(|b64| STANDARD.decode(b64).ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry not in `used`. Returns the number removed.
    pub fn purge_unused(&mut self, used: &HashSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| used.contains(key));
        before - self.entries.len()
    }
}
