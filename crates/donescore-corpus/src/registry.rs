//! ID registry collaborator: where does an upstream artifact live?
//!
//! The connectivity stage asks the registry about reference targets it
//! cannot find among the discovered upstream artifacts. A miss is not an
//! error; the edge simply earns no credit.

use crate::discover::artifact_id_from_file_name;
use crate::error::CorpusError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub trait IdRegistry {
    /// Path of the artifact for `id`, relative to the docs root.
    fn locate(&self, id: &str) -> Option<PathBuf>;
}

/// Registry backed by a scan of artifact directories under the docs root.
#[derive(Debug, Clone, Default)]
pub struct DirectoryRegistry {
    entries: BTreeMap<String, PathBuf>,
}

impl DirectoryRegistry {
    /// Index `<PREFIX>-####*.md` files in `dir` (relative to `docs_root`).
    /// The first file in name order wins when two share an ID.
    pub fn scan(docs_root: &Path, dir: &str, prefix: &str) -> Result<Self, CorpusError> {
        let mut registry = Self::default();
        let absolute = docs_root.join(dir);
        if !absolute.is_dir() {
            return Ok(registry);
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&absolute).map_err(|error| CorpusError::io(&absolute, error))? {
            let entry = entry.map_err(|error| CorpusError::io(&absolute, error))?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        for name in names {
            if let Some(id) = artifact_id_from_file_name(&name, prefix) {
                registry
                    .entries
                    .entry(id)
                    .or_insert_with(|| Path::new(dir).join(&name));
            }
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IdRegistry for DirectoryRegistry {
    fn locate(&self, id: &str) -> Option<PathBuf> {
        self.entries.get(id).cloned()
    }
}

/// Registry loaded from a JSON object mapping IDs to relative paths.
#[derive(Debug, Clone, Default)]
pub struct JsonRegistry {
    entries: BTreeMap<String, PathBuf>,
}

impl JsonRegistry {
    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, CorpusError> {
        let entries: BTreeMap<String, String> =
            serde_json::from_str(text).map_err(|error| CorpusError::Registry {
                path: origin.to_string(),
                message: error.to_string(),
            })?;
        Ok(Self {
            entries: entries
                .into_iter()
                .map(|(id, path)| (id, PathBuf::from(path)))
                .collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let text = fs::read_to_string(path).map_err(|error| CorpusError::io(path, error))?;
        Self::from_json_str(&text, &path.display().to_string())
    }
}

impl IdRegistry for JsonRegistry {
    fn locate(&self, id: &str) -> Option<PathBuf> {
        self.entries.get(id).cloned()
    }
}

/// An ID resolves when the registry knows it and the file it names exists.
pub fn resolves(registry: &dyn IdRegistry, docs_root: &Path, id: &str) -> bool {
    registry
        .locate(id)
        .is_some_and(|relative| docs_root.join(relative).is_file())
}
