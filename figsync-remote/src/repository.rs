//! The remote repository seam.
//!
//! [`Repository`] is what the reconciliation engine talks to. The production
//! implementation is [`crate::FigshareClient`]; tests substitute an
//! in-memory store.

use std::collections::BTreeMap;
use std::path::Path;

use figsync_core::{CollectionId, CollectionMetadata, FileId, RemoteFile};

use crate::error::RemoteError;

/// Files currently attached to a collection, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteInventory {
    files: BTreeMap<String, RemoteFile>,
}

impl RemoteInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `file`, replacing any entry with the same name.
    pub fn insert(&mut self, file: RemoteFile) {
        self.files.insert(file.name.clone(), file);
    }

    pub fn get(&self, name: &str) -> Option<&RemoteFile> {
        self.files.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteFile> {
        self.files.values()
    }
}

impl FromIterator<RemoteFile> for RemoteInventory {
    fn from_iter<I: IntoIterator<Item = RemoteFile>>(iter: I) -> Self {
        let mut inventory = Self::new();
        for file in iter {
            inventory.insert(file);
        }
        inventory
    }
}

/// Result of [`Repository::upload_if_needed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReceipt {
    pub file_id: FileId,
    /// `false` when an identical file was already present and nothing was sent.
    pub uploaded: bool,
}

/// Operations the sync engine needs from a remote content repository.
///
/// Every method is a blocking network round trip. Failures are returned, never
/// swallowed.
pub trait Repository {
    fn collection_exists(&self, collection: CollectionId) -> Result<bool, RemoteError>;

    fn create_collection(&self, metadata: &CollectionMetadata)
        -> Result<CollectionId, RemoteError>;

    fn list_files(&self, collection: CollectionId) -> Result<RemoteInventory, RemoteError>;

    /// Id of the file named `name` if its content hash equals `md5`.
    ///
    /// Always queries the remote; a previously fetched inventory may be stale.
    fn file_matches(
        &self,
        collection: CollectionId,
        name: &str,
        md5: &str,
    ) -> Result<Option<FileId>, RemoteError>;

    /// Ensure `local` is stored as `name` in `collection`.
    ///
    /// A same-named file is replaced, never duplicated. Without `force`, an
    /// identical same-named file is kept and `uploaded` is `false`.
    fn upload_if_needed(
        &self,
        collection: CollectionId,
        local: &Path,
        name: &str,
        force: bool,
    ) -> Result<UploadReceipt, RemoteError>;
}
