//! Task catalog and run configuration.
//!
//! A single YAML document (conventionally `figsync.yaml`) names the modeling
//! tasks, their remote collections, the models to sync and the remote
//! endpoints. Relative paths inside it resolve against the catalog's own
//! directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, MetadataError};
use crate::metadata::write_atomic;
use crate::types::{CollectionId, FileId, ModelName, TaskId};

pub const DEFAULT_API_BASE: &str = "https://api.figshare.com/v2";
pub const DEFAULT_DOWNLOAD_PREFIX: &str = "https://figshare.com/ndownloader/files";
pub const DEFAULT_COLLECTION_PREFIX: &str = "https://figshare.com/articles/dataset";

/// Root of the catalog YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Directory artifact paths are relative to. Defaults to the catalog's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_root: Option<PathBuf>,
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub collection: CollectionDefaults,
    #[serde(default)]
    pub tasks: BTreeMap<TaskId, TaskEntry>,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// Remote endpoints and locator prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_download_prefix")]
    pub download_prefix: String,
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            download_prefix: default_download_prefix(),
            collection_prefix: default_collection_prefix(),
        }
    }
}

impl RemoteSettings {
    /// `<download_prefix>/<id>`
    pub fn download_url(&self, id: FileId) -> String {
        format!("{}/{id}", self.download_prefix.trim_end_matches('/'))
    }

    /// `<collection_prefix>/<id>`
    pub fn collection_url(&self, id: CollectionId) -> String {
        format!("{}/{id}", self.collection_prefix.trim_end_matches('/'))
    }
}

/// Shared fields for lazily created collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDefaults {
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,
    #[serde(default = "default_defined_type")]
    pub defined_type: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub categories: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl Default for CollectionDefaults {
    fn default() -> Self {
        Self {
            title_prefix: default_title_prefix(),
            defined_type: default_defined_type(),
            keywords: Vec::new(),
            categories: Vec::new(),
            homepage: None,
        }
    }
}

/// One modeling task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Pre-registered collection; absent until first created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<CollectionId>,
}

/// One model and the path of its metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: ModelName,
    /// Relative to the catalog directory unless absolute.
    pub metadata: PathBuf,
}

/// Request body for creating a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionMetadata {
    pub title: String,
    pub description: String,
    pub defined_type: String,
    pub tags: Vec<String>,
    pub categories: Vec<u64>,
}

impl Catalog {
    /// Load the catalog at `path`.
    pub fn load_at(path: &Path) -> Result<Self, MetadataError> {
        if !path.exists() {
            return Err(MetadataError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        serde_yaml::from_str(&contents).map_err(|e| MetadataError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Atomically save the catalog to `path`.
    pub fn save_at(&self, path: &Path) -> Result<(), MetadataError> {
        let yaml = serde_yaml::to_string(self)?;
        write_atomic(path, &yaml)
    }

    /// Directory that artifact relative paths resolve against.
    pub fn artifact_root(&self, catalog_path: &Path) -> PathBuf {
        let base = catalog_dir(catalog_path);
        match &self.artifact_root {
            Some(root) => base.join(root),
            None => base,
        }
    }

    /// Absolute path of a model's metadata document.
    pub fn model_document_path(&self, catalog_path: &Path, model: &ModelEntry) -> PathBuf {
        catalog_dir(catalog_path).join(&model.metadata)
    }

    pub fn task(&self, task: &TaskId) -> Option<&TaskEntry> {
        self.tasks.get(task)
    }

    pub fn model(&self, name: &ModelName) -> Option<&ModelEntry> {
        self.models.iter().find(|m| &m.name == name)
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.keys().cloned().collect()
    }

    pub fn model_names(&self) -> Vec<ModelName> {
        self.models.iter().map(|m| m.name.clone()).collect()
    }

    /// Metadata for creating the collection of `task`.
    pub fn collection_metadata(&self, task: &TaskId) -> Result<CollectionMetadata, MetadataError> {
        let entry = self.task(task).ok_or_else(|| MetadataError::UnknownTask {
            task: task.0.clone(),
        })?;
        let defaults = &self.collection;

        let mut description = format!(
            "This dataset contains model predictions for the {} task.\n\nTask description: {}",
            entry.label.to_lowercase(),
            entry.description,
        );
        if let Some(homepage) = &defaults.homepage {
            description.push_str(&format!("\n\nFor more information, visit: {homepage}"));
        }

        let mut tags = defaults.keywords.clone();
        tags.push(format!("task-{task}"));

        Ok(CollectionMetadata {
            title: format!("{} {}", defaults.title_prefix, entry.label)
                .trim()
                .to_string(),
            description,
            defined_type: defaults.defined_type.clone(),
            tags,
            categories: defaults.categories.clone(),
        })
    }

    /// Remember a newly created collection id for `task`.
    pub fn record_collection_id(
        &mut self,
        task: &TaskId,
        id: CollectionId,
    ) -> Result<(), MetadataError> {
        let entry = self.tasks.get_mut(task).ok_or_else(|| MetadataError::UnknownTask {
            task: task.0.clone(),
        })?;
        entry.collection_id = Some(id);
        Ok(())
    }
}

fn catalog_dir(catalog_path: &Path) -> PathBuf {
    match catalog_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_download_prefix() -> String {
    DEFAULT_DOWNLOAD_PREFIX.to_string()
}

fn default_collection_prefix() -> String {
    DEFAULT_COLLECTION_PREFIX.to_string()
}

fn default_title_prefix() -> String {
    "Model Predictions for".to_string()
}

fn default_defined_type() -> String {
    "dataset".to_string()
}
