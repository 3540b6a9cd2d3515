//! Filesystem vault: a directory of markdown documents.
//!
//! Paths handed to the store are vault-relative with `/` separators. Absolute
//! paths and `..` components are rejected so nothing outside the vault root
//! can be touched.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

use gardener_core::defaults::{CONFIG_DIR, IGNORED_FOLDERS};
use gardener_core::{DocumentMetadata, DocumentRef, DocumentStore, Error, Result};

use crate::{frontmatter, tags};

/// Markdown vault rooted at a directory.
pub struct FilesystemVault {
    root: PathBuf,
    config_dir: String,
    active: RwLock<Option<DocumentRef>>,
}

impl FilesystemVault {
    /// Open a vault rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config_dir: CONFIG_DIR.to_string(),
            active: RwLock::new(None),
        }
    }

    /// Use a different configuration directory name.
    pub fn with_config_dir(mut self, config_dir: impl Into<String>) -> Self {
        self.config_dir = config_dir.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a vault-relative path to a location on disk.
    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches("./"));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "Path must stay inside the vault: {}",
                        path
                    )))
                }
            }
        }
        if resolved == self.root {
            return Err(Error::InvalidInput("Path is empty".to_string()));
        }
        Ok(resolved)
    }

    /// Vault-relative path for a location on disk.
    fn relative_path(&self, full: &Path) -> Option<String> {
        let rel = full.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Some(parts.join("/"))
    }

    fn is_ignored(&self, name: &str) -> bool {
        name == self.config_dir || IGNORED_FOLDERS.iter().any(|ignored| name == *ignored)
    }

    /// Walk the vault, returning (folders, markdown documents).
    async fn walk(&self) -> Result<(Vec<String>, Vec<DocumentRef>)> {
        let mut folders = Vec::new();
        let mut documents = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if dir == self.root => return Err(e.into()),
                Err(e) => {
                    warn!(folder = %dir.display(), error = %e, "fs_store: skipping unreadable folder");
                    continue;
                }
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(folder = %dir.display(), error = %e, "fs_store: folder listing cut short");
                        break;
                    }
                };
                let name = entry.file_name().to_string_lossy().into_owned();
                let Ok(file_type) = entry.file_type().await else {
                    continue;
                };
                let full = entry.path();

                if file_type.is_dir() {
                    if self.is_ignored(&name) {
                        trace!(folder = %name, "Skipping ignored folder");
                        continue;
                    }
                    if let Some(rel) = self.relative_path(&full) {
                        folders.push(rel);
                    }
                    pending.push(full);
                } else if file_type.is_file() {
                    if let Some(rel) = self.relative_path(&full) {
                        let doc = DocumentRef::new(rel);
                        if doc.is_markdown() {
                            documents.push(doc);
                        }
                    }
                }
            }
        }

        folders.sort();
        documents.sort();
        Ok((folders, documents))
    }

    /// Write a file via a temporary sibling and rename, so readers never see
    /// a half-written document.
    async fn write_atomic(&self, full_path: &Path, content: &str) -> Result<()> {
        let file_name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = full_path.with_file_name(format!(".{}.tmp", file_name));

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "fs_store: File::create failed");
            e
        })?;
        let written = async {
            file.write_all(content.as_bytes()).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        let result = match written {
            Ok(()) => fs::rename(&temp_path, full_path).await.map_err(|e| {
                warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "fs_store: rename failed");
                e
            }),
            Err(e) => {
                warn!(temp_path = %temp_path.display(), error = %e, "fs_store: write failed");
                Err(e)
            }
        };
        if result.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }
        Ok(result?)
    }

    async fn ensure_parent(&self, full_path: &Path) {
        if let Some(parent) = full_path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                warn!(parent = %parent.display(), error = %e, "fs_store: create_dir_all failed");
            }
        }
    }

    async fn require_file(&self, path: &str) -> Result<PathBuf> {
        let full_path = self.full_path(path)?;
        if !fs::try_exists(&full_path).await? {
            return Err(Error::NotFound(path.to_string()));
        }
        Ok(full_path)
    }
}

#[async_trait]
impl DocumentStore for FilesystemVault {
    fn vault_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "vault".to_string())
    }

    fn config_dir(&self) -> String {
        self.config_dir.clone()
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRef>> {
        let (_, documents) = self.walk().await?;
        debug!(document_count = documents.len(), "Listed vault documents");
        Ok(documents)
    }

    async fn list_folders(&self) -> Result<Vec<String>> {
        let (folders, _) = self.walk().await?;
        Ok(folders)
    }

    async fn read(&self, path: &str) -> Result<String> {
        let full_path = self.require_file(path).await?;
        Ok(fs::read_to_string(full_path).await?)
    }

    async fn metadata(&self, path: &str) -> Result<DocumentMetadata> {
        let content = self.read(path).await?;
        let frontmatter = frontmatter::parse(&content).unwrap_or_else(|e| {
            warn!(path = %path, error = %e, "Ignoring unparseable frontmatter");
            serde_json::Map::new()
        });
        let tags = tags::document_tags(&frontmatter, frontmatter::body(&content));
        Ok(DocumentMetadata { tags, frontmatter })
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path)?;
        Ok(fs::try_exists(full_path).await?)
    }

    async fn create(&self, path: &str, content: &str) -> Result<DocumentRef> {
        let full_path = self.full_path(path)?;
        if fs::try_exists(&full_path).await? {
            return Err(Error::AlreadyExists(path.to_string()));
        }

        self.ensure_parent(&full_path).await;
        self.write_atomic(&full_path, content).await?;

        info!(path = %path, bytes = content.len(), "Created document");
        Ok(DocumentRef::new(path.trim_start_matches('/')))
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path)?;
        fs::create_dir_all(&full_path).await?;
        debug!(path = %path, "Created folder");
        Ok(())
    }

    async fn rename(&self, path: &str, new_path: &str) -> Result<DocumentRef> {
        let from = self.require_file(path).await?;
        let to = self.full_path(new_path)?;
        if fs::try_exists(&to).await? {
            return Err(Error::AlreadyExists(new_path.to_string()));
        }

        self.ensure_parent(&to).await;
        fs::rename(&from, &to).await?;

        let renamed = DocumentRef::new(new_path.trim_start_matches('/'));
        let mut active = self.active.write().await;
        if active.as_ref().map(|d| d.path == path).unwrap_or(false) {
            *active = Some(renamed.clone());
        }

        info!(from = %path, to = %new_path, "Renamed document");
        Ok(renamed)
    }

    async fn merge_frontmatter(
        &self,
        path: &str,
        properties: &serde_json::Map<String, JsonValue>,
    ) -> Result<()> {
        let full_path = self.require_file(path).await?;
        let content = fs::read_to_string(&full_path).await?;
        let merged = frontmatter::merge(&content, properties)?;
        if merged != content {
            self.write_atomic(&full_path, &merged).await?;
        }
        info!(path = %path, keys = properties.len(), "Merged frontmatter");
        Ok(())
    }

    async fn append(&self, path: &str, text: &str) -> Result<()> {
        let full_path = self.require_file(path).await?;
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&full_path)
            .await?;
        file.write_all(format!("\n{}", text).as_bytes()).await?;
        file.flush().await?;
        info!(path = %path, bytes = text.len(), "Appended to document");
        Ok(())
    }

    async fn active_document(&self) -> Option<DocumentRef> {
        self.active.read().await.clone()
    }

    async fn set_active_document(&self, doc: Option<DocumentRef>) -> Result<()> {
        if let Some(ref doc) = doc {
            self.require_file(&doc.path).await?;
        }
        *self.active.write().await = doc;
        Ok(())
    }
}
