//! Filesystem-backed object store.
//!
//! Layout: `{root}/{container}/{key}` where `/` in a key maps to nested
//! directories. Writes are atomic (write to `.tmp`, rename into place).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{ObjectInfo, ObjectStore};
use crate::error::DataError;

pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn container_dir(&self, container: &str) -> PathBuf {
        self.root.join(container)
    }

    /// Resolve a key to a path, rejecting keys that would escape the container.
    fn object_path(&self, container: &str, key: &str) -> Result<PathBuf, DataError> {
        let mut path = self.container_dir(container);
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(DataError::Io(format!("invalid object key '{key}'")));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

impl ObjectStore for LocalObjectStore {
    fn name(&self) -> &str {
        "local"
    }

    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, DataError> {
        let path = self.object_path(container, key)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DataError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            },
            _ => DataError::Io(format!("read {}: {e}", path.display())),
        })
    }

    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), DataError> {
        let path = self.object_path(container, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DataError::write(key, format!("create dir: {e}")))?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, bytes).map_err(|e| DataError::write(key, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::write(key, format!("atomic rename failed: {e}"))
        })?;

        Ok(())
    }

    fn list(&self, container: &str) -> Result<Vec<ObjectInfo>, DataError> {
        let dir = self.container_dir(container);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        collect_objects(&dir, "", &mut objects)?;
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

fn collect_objects(dir: &Path, prefix: &str, out: &mut Vec<ObjectInfo>) -> Result<(), DataError> {
    let entries =
        fs::read_dir(dir).map_err(|e| DataError::Io(format!("read dir {}: {e}", dir.display())))?;

    for entry in entries {
        let entry = entry.map_err(|e| DataError::Io(format!("dir entry: {e}")))?;
        let name = entry.file_name().to_string_lossy().to_string();
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        let meta = entry
            .metadata()
            .map_err(|e| DataError::Io(format!("metadata {key}: {e}")))?;

        if meta.is_dir() {
            collect_objects(&entry.path(), &key, out)?;
        } else if !name.ends_with(".tmp") {
            out.push(ObjectInfo { key });
        }
    }

    Ok(())
}
