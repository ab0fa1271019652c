//! In-memory source

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{check_relative, OcrSource, SourceError};

/// OCR files held in memory, keyed by path
#[derive(Default)]
pub struct MemorySource {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.files.write().insert(path.to_string(), bytes.into());
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.files.write().remove(path)
    }
}

#[async_trait]
impl OcrSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let path = check_relative(path)?;
        Ok(self.files.read().get(path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let source = MemorySource::new();
        source.insert("p1.json", "{\"ocr\": []}");
        assert_eq!(source.fetch("p1.json").await.unwrap(), Some(b"{\"ocr\": []}".to_vec()));
        assert!(source.fetch("p2.json").await.unwrap().is_none());

        source.remove("p1.json");
        assert!(source.fetch("p1.json").await.unwrap().is_none());
    }
}
