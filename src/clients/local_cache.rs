use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

use super::ClientError;

/// Local fallback copy of the last locally edited state
pub trait LocalCache: Send + Sync {
    fn load(&self) -> Result<Option<Value>, ClientError>;
    fn store(&self, content: &Value) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// Cache persisted as a JSON file
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LocalCache for FileCache {
    fn load(&self) -> Result<Option<Value>, ClientError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, content: &Value) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_vec(content)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<Value>>,
}

impl MemoryCache {
    pub fn with(content: Value) -> Self {
        Self { slot: Mutex::new(Some(content)) }
    }
}

impl MemoryCache {
    fn slot(&self) -> MutexGuard<'_, Option<Value>> {
        self.slot.lock().unwrap_or_else(|poisoned| {
            warn!("Memory cache lock was poisoned, recovering last value");
            self.slot.clear_poison();
            poisoned.into_inner()
        })
    }
}

impl LocalCache for MemoryCache {
    fn load(&self) -> Result<Option<Value>, ClientError> {
        Ok(self.slot().clone())
    }

    fn store(&self, content: &Value) -> Result<(), ClientError> {
        *self.slot() = Some(content.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested").join("editor-content.json"));

        assert!(cache.load().unwrap().is_none());
        cache.store(&json!({"type": "doc"})).unwrap();
        assert_eq!(cache.load().unwrap(), Some(json!({"type": "doc"})));

        cache.clear().unwrap();
        assert!(cache.load().unwrap().is_none());
        // Clearing twice is fine
        cache.clear().unwrap();
    }

    #[test]
    fn test_file_cache_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor-content.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = FileCache::new(path);
        assert!(matches!(cache.load(), Err(ClientError::Serialization(_))));
    }

    #[test]
    fn test_memory_cache_survives_poisoned_lock() {
        let cache = std::sync::Arc::new(MemoryCache::with(json!("kept")));
        let poisoner = cache.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.slot.lock().unwrap();
            panic!("poison the cache lock");
        })
        .join();
        assert!(cache.slot.is_poisoned());

        assert_eq!(cache.load().unwrap(), Some(json!("kept")));
        assert!(!cache.slot.is_poisoned());
        cache.store(&json!("next")).unwrap();
        assert_eq!(cache.load().unwrap(), Some(json!("next")));
        cache.clear().unwrap();
        assert_eq!(cache.load().unwrap(), None);
    }
}
