//! Bundle output and the last-good artifact cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::core::BuildError;

/// One produced bundle, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Final text, including a trailing `sourceMappingURL` comment if any.
    pub content: String,
    /// Map written next to the output rather than inlined.
    pub source_map: Option<ExternalMap>,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalMap {
    pub path: PathBuf,
    pub json: String,
}

impl Artifact {
    /// Zero-length artifact for a bundle without inputs.
    pub fn empty(destination: PathBuf) -> Self {
        Self {
            content: String::new(),
            source_map: None,
            destination,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Write the artifact (and its external map), creating parent directories.
    pub async fn write(&self) -> Result<(), BuildError> {
        write_file(&self.destination, self.bytes()).await?;
        if let Some(map) = &self.source_map {
            write_file(&map.path, map.json.as_bytes()).await?;
        }
        Ok(())
    }
}

async fn write_file(path: &Path, data: &[u8]) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BuildError::io(parent, e))?;
    }
    tokio::fs::write(path, data)
        .await
        .map_err(|e| BuildError::io(path, e))
}

/// Last successfully written artifact per destination path.
///
/// A recovered compile error leaves the entry as it was and writes it back
/// if its file is missing.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: Mutex<FxHashMap<PathBuf, Arc<Artifact>>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, destination: &Path) -> Option<Arc<Artifact>> {
        self.entries.lock().get(destination).cloned()
    }

    pub fn store(&self, artifact: Artifact) -> Arc<Artifact> {
        let artifact = Arc::new(artifact);
        self.entries
            .lock()
            .insert(artifact.destination.clone(), Arc::clone(&artifact));
        artifact
    }

    /// Forget everything, e.g. after `clean` removed the files.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let artifact = Artifact {
            content: "x();\n//# sourceMappingURL=../maps/site.js.map\n".into(),
            source_map: Some(ExternalMap {
                path: dir.path().join("build/maps/site.js.map"),
                json: "{}".into(),
            }),
            destination: dir.path().join("build/js/site.js"),
        };
        artifact.write().await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("build/js/site.js")).unwrap();
        assert_eq!(written, artifact.content);
        assert!(dir.path().join("build/maps/site.js.map").is_file());
    }

    #[tokio::test]
    async fn test_empty_artifact_is_written() {
        let dir = TempDir::new().unwrap();
        let artifact = Artifact::empty(dir.path().join("css/site.css"));
        artifact.write().await.unwrap();
        assert_eq!(std::fs::metadata(&artifact.destination).unwrap().len(), 0);
    }

    #[test]
    fn test_cache_replaces_by_destination() {
        let cache = ArtifactCache::new();
        let path = PathBuf::from("/b/css/site.css");
        cache.store(Artifact {
            content: "a{}".into(),
            source_map: None,
            destination: path.clone(),
        });
        cache.store(Artifact {
            content: "b{}".into(),
            source_map: None,
            destination: path.clone(),
        });
        assert_eq!(cache.get(&path).unwrap().content, "b{}");

        cache.clear();
        assert!(cache.get(&path).is_none());
    }
}
