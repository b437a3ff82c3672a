//! Key/value object storage.
//!
//! `LocalObjectStore` treats a directory as the bucket: keys are relative
//! paths, writes land in a temp file in the target directory and are renamed
//! into place. `MemoryObjectStore` keeps everything in a concurrent map and
//! backs dry runs and tests.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use super::error::StorageError;

/// Sidecar suffix holding an object's user metadata on disk.
const METADATA_SUFFIX: &str = ".metadata.json";

/// Prefix of in-flight temp files (see `tempfile::NamedTempFile`).
const TEMP_PREFIX: &str = ".tmp";

/// User metadata attached to an object (content type, source, dates).
pub type ObjectMetadata = BTreeMap<String, String>;

/// Listing entry for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing object.
    fn put(&self, key: &str, bytes: &[u8], metadata: &ObjectMetadata) -> Result<(), StorageError>;

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    fn metadata(&self, key: &str) -> Result<ObjectMetadata, StorageError>;

    fn exists(&self, key: &str) -> bool;

    /// Objects whose key starts with `prefix`, sorted by key.
    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Most recently modified object under `prefix`. Ties go to the greatest key.
    fn latest(&self, prefix: &str) -> Result<Option<ObjectInfo>, StorageError> {
        let mut objects = self.list(prefix)?;
        objects.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| b.key.cmp(&a.key))
        });
        Ok(objects.into_iter().next())
    }
}

pub type SharedStore = Arc<dyn ObjectStore>;

// ── Local directory ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| StorageError::io(&root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let well_formed = !key.is_empty()
            && !key.ends_with('/')
            && !key.ends_with(METADATA_SUFFIX)
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    fn metadata_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(METADATA_SUFFIX);
        PathBuf::from(name)
    }

    fn write_atomic(key: &str, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let parent = path.parent().ok_or_else(|| StorageError::InvalidKey {
            key: key.to_string(),
        })?;
        fs::create_dir_all(parent).map_err(|e| StorageError::io(key, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| StorageError::io(key, e))?;
        tmp.write_all(bytes).map_err(|e| StorageError::io(key, e))?;
        tmp.persist(path).map_err(|e| StorageError::io(key, e.error))?;
        Ok(())
    }

    fn collect(&self, dir: &Path, out: &mut Vec<ObjectInfo>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                self.collect(&path, out)?;
                continue;
            }

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(TEMP_PREFIX) || name.ends_with(METADATA_SUFFIX) {
                continue;
            }

            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let meta = entry.metadata()?;
            out.push(ObjectInfo {
                key,
                size: meta.len(),
                last_modified: DateTime::<Utc>::from(meta.modified()?),
            });
        }
        Ok(())
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, bytes: &[u8], metadata: &ObjectMetadata) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        Self::write_atomic(key, &path, bytes)?;

        let sidecar = Self::metadata_path(&path);
        if metadata.is_empty() {
            match fs::remove_file(&sidecar) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(key, e)),
            }
        } else {
            let json = serde_json::to_vec_pretty(metadata).map_err(|e| StorageError::Metadata {
                key: key.to_string(),
                message: e.to_string(),
            })?;
            Self::write_atomic(key, &sidecar, &json)?;
        }

        tracing::debug!(key, bytes = bytes.len(), "Stored object");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound {
                key: key.to_string(),
            },
            _ => StorageError::io(key, e),
        })
    }

    fn metadata(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Err(StorageError::NotFound {
                key: key.to_string(),
            });
        }
        match fs::read(Self::metadata_path(&path)) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StorageError::Metadata {
                key: key.to_string(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ObjectMetadata::new()),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.path_for(key).map(|p| p.is_file()).unwrap_or(false)
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects = Vec::new();
        self.collect(&self.root, &mut objects)
            .map_err(|e| StorageError::io(prefix, e))?;
        objects.retain(|o| o.key.starts_with(prefix));
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

// ── In memory ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    metadata: ObjectMetadata,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, StoredObject>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object with an explicit modification time.
    pub fn put_at(
        &self,
        key: &str,
        bytes: &[u8],
        metadata: &ObjectMetadata,
        last_modified: DateTime<Utc>,
    ) {
        self.objects.insert(
            key.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                metadata: metadata.clone(),
                last_modified,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, key: &str, bytes: &[u8], metadata: &ObjectMetadata) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        self.put_at(key, bytes, metadata, Utc::now());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .get(key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    fn metadata(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        self.objects
            .get(key)
            .map(|o| o.metadata.clone())
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    fn exists(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects: Vec<ObjectInfo> = self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| ObjectInfo {
                key: entry.key().clone(),
                size: entry.value().bytes.len() as u64,
                last_modified: entry.value().last_modified,
            })
            .collect();
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}
