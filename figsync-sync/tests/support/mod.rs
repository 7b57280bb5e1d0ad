//! Shared fixtures: an in-memory repository and a scratch workspace.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figsync_core::identity::identity;
use figsync_core::{Catalog, CollectionId, CollectionMetadata, FileId, RemoteFile};
use figsync_remote::{RemoteError, RemoteInventory, Repository, UploadReceipt};
use tempfile::TempDir;

/// Repository double keeping collections in memory and counting mutations.
#[derive(Default)]
pub struct MemoryRepository {
    collections: RefCell<BTreeMap<u64, BTreeMap<String, RemoteFile>>>,
    next_id: Cell<u64>,
    pub creates: Cell<usize>,
    pub uploads: Cell<usize>,
    pub deletes: Cell<usize>,
    pub match_queries: Cell<usize>,
    /// Every upload fails with a 503 once set.
    pub fail_uploads: Cell<bool>,
    /// Every upload fails reading the local file once set.
    pub fail_local_reads: Cell<bool>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        let repo = Self::default();
        repo.next_id.set(100);
        repo
    }

    pub fn with_collection(self, id: u64) -> Self {
        self.collections.borrow_mut().insert(id, BTreeMap::new());
        self
    }

    /// Store `content` as `name` directly, bypassing counters.
    pub fn seed_file(&self, collection: u64, name: &str, content: &[u8], file_id: u64) {
        let md5 = format!("{:x}", md5::compute(content));
        self.collections
            .borrow_mut()
            .entry(collection)
            .or_default()
            .insert(
                name.to_string(),
                RemoteFile {
                    id: FileId(file_id),
                    name: name.to_string(),
                    computed_md5: Some(md5),
                    size: Some(content.len() as u64),
                },
            );
    }

    pub fn files(&self, collection: u64) -> Vec<RemoteFile> {
        self.collections
            .borrow()
            .get(&collection)
            .map(|files| files.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn mutations(&self) -> usize {
        self.creates.get() + self.uploads.get() + self.deletes.get()
    }

    fn fresh_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn missing(collection: CollectionId) -> RemoteError {
        RemoteError::Api {
            status: 404,
            body: format!("article {collection} not found"),
        }
    }
}

impl Repository for MemoryRepository {
    fn collection_exists(&self, collection: CollectionId) -> Result<bool, RemoteError> {
        Ok(self.collections.borrow().contains_key(&collection.0))
    }

    fn create_collection(&self, _metadata: &CollectionMetadata) -> Result<CollectionId, RemoteError> {
        self.creates.set(self.creates.get() + 1);
        let id = self.fresh_id();
        self.collections.borrow_mut().insert(id, BTreeMap::new());
        Ok(CollectionId(id))
    }

    fn list_files(&self, collection: CollectionId) -> Result<RemoteInventory, RemoteError> {
        let collections = self.collections.borrow();
        let files = collections
            .get(&collection.0)
            .ok_or_else(|| Self::missing(collection))?;
        Ok(files.values().cloned().collect())
    }

    fn file_matches(
        &self,
        collection: CollectionId,
        name: &str,
        md5: &str,
    ) -> Result<Option<FileId>, RemoteError> {
        self.match_queries.set(self.match_queries.get() + 1);
        let inventory = self.list_files(collection)?;
        Ok(inventory
            .get(name)
            .filter(|f| f.computed_md5.as_deref() == Some(md5))
            .map(|f| f.id))
    }

    fn upload_if_needed(
        &self,
        collection: CollectionId,
        local: &Path,
        name: &str,
        force: bool,
    ) -> Result<UploadReceipt, RemoteError> {
        if self.fail_uploads.get() {
            return Err(RemoteError::Api {
                status: 503,
                body: "unavailable".into(),
            });
        }
        if self.fail_local_reads.get() {
            return Err(RemoteError::Io {
                path: local.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        let content = identity(local)?;
        let mut collections = self.collections.borrow_mut();
        let files = collections
            .get_mut(&collection.0)
            .ok_or_else(|| Self::missing(collection))?;

        if let Some(existing) = files.get(name) {
            if !force && existing.computed_md5.as_deref() == Some(content.md5.as_str()) {
                return Ok(UploadReceipt {
                    file_id: existing.id,
                    uploaded: false,
                });
            }
            self.deletes.set(self.deletes.get() + 1);
        }

        self.uploads.set(self.uploads.get() + 1);
        let id = FileId(self.fresh_id());
        files.insert(
            name.to_string(),
            RemoteFile {
                id,
                name: name.to_string(),
                computed_md5: Some(content.md5),
                size: Some(content.size),
            },
        );
        Ok(UploadReceipt {
            file_id: id,
            uploaded: true,
        })
    }
}

/// A scratch repository checkout: catalog, model metadata and artifacts.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    /// Catalog with tasks `discovery` (collection id `collection`, if any) and
    /// `geo_opt` (no collection), and models `mace` and `chgnet`.
    pub fn new(collection: Option<u64>) -> Self {
        let dir = TempDir::new().expect("workspace");
        let collection_line = collection
            .map(|id| format!("    collection_id: {id}\n"))
            .unwrap_or_default();
        let catalog = format!(
            "remote:\n  download_prefix: https://dl.test/files\n  collection_prefix: https://dl.test/articles\n\
tasks:\n  discovery:\n    label: Discovery\n    description: Find stable crystals.\n{collection_line}  geo_opt:\n    label: Geometry Optimization\n\
models:\n  - name: mace\n    metadata: models/mace.yml\n  - name: chgnet\n    metadata: models/chgnet.yml\n"
        );
        std::fs::create_dir_all(dir.path().join("models")).expect("models dir");
        std::fs::write(dir.path().join("figsync.yaml"), catalog).expect("catalog");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.path().join("figsync.yaml")
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::load_at(&self.catalog_path()).expect("load catalog")
    }

    pub fn model_path(&self, model: &str) -> PathBuf {
        self.dir.path().join("models").join(format!("{model}.yml"))
    }

    pub fn write_model(&self, model: &str, yaml: &str) {
        std::fs::write(self.model_path(model), yaml).expect("write model yaml");
    }

    pub fn read_model(&self, model: &str) -> String {
        std::fs::read_to_string(self.model_path(model)).expect("read model yaml")
    }

    pub fn write_artifact(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("artifact dir");
        std::fs::write(path, content).expect("write artifact");
    }

    /// Parsed `metrics.<task>` of a model document.
    pub fn metrics(&self, model: &str, task: &str) -> serde_yaml::Value {
        let doc: serde_yaml::Value = serde_yaml::from_str(&self.read_model(model)).expect("yaml");
        doc["metrics"][task].clone()
    }
}
