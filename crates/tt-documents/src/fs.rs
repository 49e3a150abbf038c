use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use tt_types::DocumentRef;

use crate::error::{validate_key, DocumentError, DocumentResult};
use crate::traits::DocumentStore;

/// Default file extension for capture photos.
pub const DEFAULT_EXTENSION: &str = "png";

/// Filesystem-backed document store.
///
/// Each document is a single file `<root>/<key>.<extension>`. Writes go to a
/// temporary file in the same directory which is then renamed over the
/// target, so a reader never observes a half-written photo. The reference
/// returned by [`DocumentStore::store`] is the full file path.
#[derive(Clone, Debug)]
pub struct FsDocumentStore {
    root: PathBuf,
    extension: String,
    read_only: bool,
}

impl FsDocumentStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            read_only: false,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Refuse all writes and removals.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path a document stored under `key` lives at.
    pub fn path_for(&self, key: &str) -> DocumentResult<PathBuf> {
        validate_key(key)?;
        let file_name = if self.extension.is_empty() {
            key.to_string()
        } else {
            format!("{key}.{}", self.extension)
        };
        Ok(self.root.join(file_name))
    }

    fn owned_path(&self, reference: &DocumentRef) -> DocumentResult<PathBuf> {
        let path = PathBuf::from(reference.as_str());
        match path.parent() {
            Some(parent) if parent == self.root.as_path() => Ok(path),
            _ => Err(DocumentError::ForeignReference(reference.clone())),
        }
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn store(&self, data: &[u8], key: &str) -> DocumentResult<DocumentRef> {
        if self.read_only {
            return Err(DocumentError::ReadOnly);
        }
        let target = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let root = self.root.clone();
        let payload = data.to_vec();
        let destination = target.clone();
        tokio::task::spawn_blocking(move || write_atomically(&root, &destination, &payload))
            .await
            .map_err(|e| io::Error::other(e.to_string()))??;

        debug!(path = %target.display(), bytes = data.len(), "document stored");
        Ok(DocumentRef::new(target.to_string_lossy().into_owned()))
    }

    async fn read(&self, reference: &DocumentRef) -> DocumentResult<Option<Vec<u8>>> {
        let path = self.owned_path(reference)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, reference: &DocumentRef) -> DocumentResult<bool> {
        if self.read_only {
            return Err(DocumentError::ReadOnly);
        }
        let path = self.owned_path(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "document removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, reference: &DocumentRef) -> DocumentResult<bool> {
        let path = self.owned_path(reference)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

fn write_atomically(dir: &Path, target: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
