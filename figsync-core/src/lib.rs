//! figsync core library: domain types, metadata trees, catalog, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes and domain structs
//! - [`error`]: [`MetadataError`]
//! - [`identity`]: content identity (MD5 + size) of local artifacts
//! - [`tree`]: file-reference walker and locator writer
//! - [`metadata`]: per-model metadata documents
//! - [`catalog`]: task catalog and run configuration

pub mod catalog;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod tree;
pub mod types;

pub use catalog::{Catalog, CollectionMetadata, ModelEntry, RemoteSettings, TaskEntry};
pub use error::MetadataError;
pub use metadata::ModelDocument;
pub use tree::{find_file_references, has_locator_slot, locator, set_locator, FileReference};
pub use types::{
    CollectionId, ContentIdentity, FileId, FileTypeFilter, KeyPath, ModelName, RemoteFile,
    SyncMode, TaskId, FILE_SUFFIX, LOCATOR_SUFFIX,
};
