// Document storage: the read/write/list capability the board works through.
//
// `VaultStorage` maps source ids to markdown files under a root directory.
// `MemoryStorage` keeps documents in a map, for embedding and tests.
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use fs2::FileExt;

pub const DOCUMENT_EXTENSION: &str = "md";

/// Named text documents. Source ids are opaque to callers.
pub trait DocumentStore {
    fn read_text(&self, source: &str) -> Result<String>;
    fn write_text(&self, source: &str, text: &str) -> Result<()>;
    /// All candidate documents, sorted.
    fn list_sources(&self) -> Result<Vec<String>>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn read_text(&self, source: &str) -> Result<String> {
        (**self).read_text(source)
    }
    fn write_text(&self, source: &str, text: &str) -> Result<()> {
        (**self).write_text(source, text)
    }
    fn list_sources(&self) -> Result<Vec<String>> {
        (**self).list_sources()
    }
}

// --- FILESYSTEM ---

#[derive(Debug, Clone)]
pub struct VaultStorage {
    root: PathBuf,
}

impl VaultStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a source inside the vault. Sources are `/`-separated and
    /// relative; anything that could leave the root is rejected.
    pub fn resolve(&self, source: &str) -> Result<PathBuf> {
        let rel = Path::new(source);
        let inside = !source.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside {
            return Err(anyhow::anyhow!("Invalid document path: '{}'", source));
        }
        Ok(self.root.join(rel))
    }

    // Hidden companion file next to the document, e.g. `.Board.md.lock`.
    fn sibling(file_path: &Path, suffix: &str) -> PathBuf {
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        file_path.with_file_name(format!(".{}.{}", name, suffix))
    }

    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::sibling(file_path, "lock");
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: write to a hidden temp file then rename over the target.
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = Self::sibling(path, "tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    fn collect(&self, dir: &Path, out: &mut Vec<String>) -> Result<()> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden {
                continue;
            }
            if entry.file_type()?.is_dir() {
                self.collect(&path, out)?;
            } else if path.extension().is_some_and(|e| e == DOCUMENT_EXTENSION)
                && let Ok(rel) = path.strip_prefix(&self.root)
            {
                let parts: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect();
                out.push(parts.join("/"));
            }
        }
        Ok(())
    }
}

impl DocumentStore for VaultStorage {
    fn read_text(&self, source: &str) -> Result<String> {
        let path = self.resolve(source)?;
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    fn write_text(&self, source: &str, text: &str) -> Result<()> {
        let path = self.resolve(source)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::with_lock(&path, || Self::atomic_write(&path, text))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Wrote {} bytes to {}", text.len(), source);
        Ok(())
    }

    fn list_sources(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        self.collect(&self.root, &mut out)?;
        out.sort();
        Ok(out)
    }
}

// --- IN MEMORY ---

#[derive(Debug, Default)]
pub struct MemoryStorage {
    docs: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned map still holds whole documents.
    fn docs(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.docs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_document(self, source: &str, text: &str) -> Self {
        self.docs().insert(source.to_string(), text.to_string());
        self
    }

    pub fn get(&self, source: &str) -> Option<String> {
        self.docs().get(source).cloned()
    }
}

impl DocumentStore for MemoryStorage {
    fn read_text(&self, source: &str) -> Result<String> {
        self.get(source)
            .ok_or_else(|| anyhow::anyhow!("No such document: '{}'", source))
    }

    fn write_text(&self, source: &str, text: &str) -> Result<()> {
        self.docs().insert(source.to_string(), text.to_string());
        Ok(())
    }

    fn list_sources(&self) -> Result<Vec<String>> {
        Ok(self.docs().keys().cloned().collect())
    }
}
