//! Reconciliation engine: decide skip / update / create for each artifact.
//!
//! ## Per-artifact protocol
//!
//! 1. Resolve `<root>/<rel_path>`; a missing file is reported and skipped.
//! 2. Simulate: report `WouldUpload`. No remote call, no metadata change.
//! 3. Execute: hash locally; an unreadable file is reported and skipped.
//! 4. Without `force`, ask the remote for a match. A match is `Skipped`; its
//!    locator slot is backfilled only when the key is absent.
//! 5. Otherwise upload-if-needed. `Updated` when the name was in the initial
//!    inventory, else `Created`. The locator is always refreshed.
//!
//! Write-back of the tree is the caller's job, and only in execute mode.

use std::path::Path;

use serde_yaml::Mapping;

use figsync_core::identity::identity;
use figsync_core::{
    has_locator_slot, locator, set_locator, CollectionId, FileReference, ModelName,
    RemoteSettings, SyncMode, TaskId,
};
use figsync_remote::{RemoteInventory, Repository};

use crate::error::SyncError;
use crate::report::{FileAction, FileOutcome};

/// Result of reconciling one model's tree.
#[derive(Debug, Default)]
pub struct ModelSync {
    pub outcomes: Vec<FileOutcome>,
    /// The tree gained or changed at least one locator.
    pub mutated: bool,
}

/// Reconciles artifacts of one task against one remote collection.
pub struct Reconciler<'a, R: Repository + ?Sized> {
    pub repo: &'a R,
    pub settings: &'a RemoteSettings,
    pub task: &'a TaskId,
    /// `None` only in simulate mode before the collection exists.
    pub collection: Option<CollectionId>,
    /// Collection listing taken before any upload of this run.
    pub inventory: &'a RemoteInventory,
    pub mode: SyncMode,
    pub force: bool,
}

impl<'a, R: Repository + ?Sized> Reconciler<'a, R> {
    /// Process `refs` (walker order) for `model`, mutating `tree` in place.
    ///
    /// Local file problems are recorded per artifact; remote failures abort
    /// and propagate.
    pub fn reconcile(
        &self,
        model: &ModelName,
        root: &Path,
        tree: &mut Mapping,
        refs: Vec<FileReference>,
    ) -> Result<ModelSync, SyncError> {
        let mut result = ModelSync::default();

        for FileReference { key_path, rel_path } in refs {
            let local = root.join(&rel_path);
            let name = remote_name(&rel_path);
            let mut outcome = FileOutcome {
                model: model.clone(),
                key_path,
                rel_path,
                action: FileAction::MissingLocal,
                url: None,
            };

            if !local.is_file() {
                tracing::warn!(
                    task = %self.task,
                    model = %model,
                    path = %local.display(),
                    "referenced file not found, skipping"
                );
                result.outcomes.push(outcome);
                continue;
            }

            if self.mode.is_simulate() {
                tracing::info!("[dry-run] would upload: {name}");
                outcome.action = FileAction::WouldUpload;
                result.outcomes.push(outcome);
                continue;
            }

            let collection = self
                .collection
                .ok_or_else(|| SyncError::NoCollection(self.task.clone()))?;

            let content = match identity(&local) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(path = %local.display(), error = %err, "cannot hash file, skipping");
                    outcome.action = FileAction::Unreadable;
                    result.outcomes.push(outcome);
                    continue;
                }
            };

            if !self.force {
                if let Some(file_id) = self.repo.file_matches(collection, &name, &content.md5)? {
                    let url = self.settings.download_url(file_id);
                    if !has_locator_slot(tree, &outcome.key_path) {
                        set_locator(tree, &outcome.key_path, &url)?;
                        result.mutated = true;
                    }
                    tracing::debug!("unchanged: {name}");
                    outcome.action = FileAction::Skipped;
                    outcome.url = Some(url);
                    result.outcomes.push(outcome);
                    continue;
                }
            }

            let receipt = match self
                .repo
                .upload_if_needed(collection, &local, &name, self.force)
            {
                Ok(receipt) => receipt,
                Err(err) if err.is_local() => {
                    tracing::warn!(path = %local.display(), error = %err, "cannot read file for upload, skipping");
                    outcome.action = FileAction::Unreadable;
                    result.outcomes.push(outcome);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let url = self.settings.download_url(receipt.file_id);
            if locator(tree, &outcome.key_path) != Some(url.as_str()) {
                set_locator(tree, &outcome.key_path, &url)?;
                result.mutated = true;
            }
            outcome.action = if self.inventory.contains(&name) {
                FileAction::Updated
            } else {
                FileAction::Created
            };
            tracing::info!("{}: {name} -> {url}", outcome.action.label());
            outcome.url = Some(url);
            result.outcomes.push(outcome);
        }

        Ok(result)
    }
}

/// Name a local artifact is stored under remotely: its root-relative path.
pub fn remote_name(rel_path: &str) -> String {
    rel_path.trim_start_matches("./").replace('\\', "/")
}
