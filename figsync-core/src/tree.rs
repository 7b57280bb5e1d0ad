//! File-reference walker and locator writer for nested metadata mappings.
//!
//! A metadata tree is a [`serde_yaml::Mapping`]: nested mappings are nodes,
//! every other value is a leaf. Mappings keep insertion order, so the walk
//! below visits references in document order on every run.

use std::path::{Component, Path};

use serde_yaml::{Mapping, Value};

use crate::error::MetadataError;
use crate::types::{FileTypeFilter, KeyPath};

/// A file-reference leaf discovered in a metadata tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub key_path: KeyPath,
    /// Path relative to the artifact root.
    pub rel_path: String,
}

/// Collect every `*_file` leaf in `tree` that passes `filter`.
///
/// Depth-first, document order. Non-string keys, non-string values and keys
/// without the file suffix are ignored, as are values that are empty,
/// absolute or climb above the artifact root. Key paths are unique by
/// construction.
pub fn find_file_references(tree: &Mapping, filter: FileTypeFilter) -> Vec<FileReference> {
    let mut found = Vec::new();
    walk(tree, &KeyPath::new(Vec::new()), filter, &mut found);
    found
}

fn walk(node: &Mapping, prefix: &KeyPath, filter: FileTypeFilter, found: &mut Vec<FileReference>) {
    for (key, value) in node {
        let Some(key) = key.as_str() else { continue };
        let key_path = prefix.child(key);
        match value {
            Value::Mapping(child) => walk(child, &key_path, filter, found),
            Value::String(rel_path) if filter.matches(key) && stays_under_root(rel_path) => {
                found.push(FileReference {
                    key_path,
                    rel_path: rel_path.clone(),
                })
            }
            _ => {}
        }
    }
}

/// `true` for a non-empty relative path that never leaves its base directory.
fn stays_under_root(value: &str) -> bool {
    let mut depth = 0usize;
    for component in Path::new(value).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

/// Read the locator sibling of the leaf at `key_path`, if present.
pub fn locator<'a>(tree: &'a Mapping, key_path: &KeyPath) -> Option<&'a str> {
    let parent = parent(tree, key_path)?;
    let key = key_path.locator_key()?;
    parent.get(key.as_str()).and_then(Value::as_str)
}

/// `true` when the locator sibling key exists, whatever its value.
pub fn has_locator_slot(tree: &Mapping, key_path: &KeyPath) -> bool {
    match (parent(tree, key_path), key_path.locator_key()) {
        (Some(parent), Some(key)) => parent.contains_key(key.as_str()),
        _ => false,
    }
}

/// Set the locator sibling of the leaf at `key_path` to `value`.
///
/// The parent mapping must already exist; no intermediate structure is
/// created. An existing locator is overwritten in place.
pub fn set_locator(tree: &mut Mapping, key_path: &KeyPath, value: &str) -> Result<(), MetadataError> {
    let missing = || MetadataError::MissingParent {
        key_path: key_path.to_string(),
    };
    let key = key_path.locator_key().ok_or_else(missing)?;
    let parent = parent_mut(tree, key_path).ok_or_else(missing)?;
    parent.insert(Value::String(key), Value::String(value.to_owned()));
    Ok(())
}

fn parent<'a>(tree: &'a Mapping, key_path: &KeyPath) -> Option<&'a Mapping> {
    let (_, ancestors) = key_path.segments().split_last()?;
    ancestors
        .iter()
        .try_fold(tree, |node, segment| node.get(segment.as_str())?.as_mapping())
}

fn parent_mut<'a>(tree: &'a mut Mapping, key_path: &KeyPath) -> Option<&'a mut Mapping> {
    let (_, ancestors) = key_path.segments().split_last()?;
    ancestors.iter().try_fold(tree, |node, segment| {
        node.get_mut(segment.as_str())?.as_mapping_mut()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
