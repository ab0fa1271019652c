//! Local filesystem source

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::{check_relative, OcrSource, SourceError};

/// Reads OCR files below a root directory
pub struct LocalSource {
    root: PathBuf,
    timeout: Duration,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, SourceError> {
        Ok(self.root.join(check_relative(path)?))
    }
}

#[async_trait]
impl OcrSource for LocalSource {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let full = self.resolve(path)?;

        match tokio::time::timeout(self.timeout, tokio::fs::read(&full)).await {
            Err(_) => Err(SourceError::Timeout {
                path: path.to_string(),
                seconds: self.timeout.as_secs(),
            }),
            Ok(Ok(bytes)) => {
                tracing::debug!("Read {} bytes from {}", bytes.len(), full.display());
                Ok(Some(bytes))
            }
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Ok(Err(e)) => Err(SourceError::Io {
                path: path.to_string(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("vol1")).unwrap();
        std::fs::write(temp_dir.path().join("vol1/p1.tsv"), b"1\t2\t3\t4\tword\n").unwrap();

        let source = LocalSource::new(temp_dir.path(), Duration::from_secs(5));
        let bytes = source.fetch("vol1/p1.tsv").await.unwrap();
        assert_eq!(bytes.as_deref(), Some(&b"1\t2\t3\t4\tword\n"[..]));
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let source = LocalSource::new(temp_dir.path(), Duration::from_secs(5));
        assert!(source.fetch("nope.xml").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_escaping_path_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let source = LocalSource::new(temp_dir.path(), Duration::from_secs(5));
        assert!(matches!(
            source.fetch("../outside.xml").await,
            Err(SourceError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("vol1")).unwrap();
        let source = LocalSource::new(temp_dir.path(), Duration::from_secs(5));
        assert!(matches!(source.fetch("vol1").await, Err(SourceError::Io { .. })));
    }
}
