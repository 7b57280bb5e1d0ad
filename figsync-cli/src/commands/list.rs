//! `figsync list`: remote files of one task's collection.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use figsync_remote::Repository;

use super::{client, load_catalog, select_tasks};

/// Arguments for `figsync list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Task whose collection to list.
    pub task: String,
}

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "size")]
    size: String,
    #[tabled(rename = "md5")]
    md5: String,
    #[tabled(rename = "download url")]
    url: String,
}

impl ListArgs {
    pub fn run(self, catalog_path: &Path) -> Result<()> {
        let catalog = load_catalog(catalog_path)?;
        let task = select_tasks(&catalog, std::slice::from_ref(&self.task))?
            .into_iter()
            .next()
            .context("no task given")?;
        let Some(collection) = catalog.task(&task).and_then(|entry| entry.collection_id) else {
            bail!("task '{task}' has no collection yet; run `figsync sync --tasks {task}` first");
        };

        let repo = client(&catalog)?;
        let inventory = repo
            .list_files(collection)
            .with_context(|| format!("failed to list collection {collection}"))?;

        println!(
            "Task '{task}' | collection {} | {} files",
            catalog.remote.collection_url(collection),
            inventory.len()
        );
        if inventory.is_empty() {
            return Ok(());
        }

        let rows: Vec<FileRow> = inventory
            .iter()
            .map(|file| FileRow {
                name: file.name.clone(),
                id: file.id.to_string(),
                size: file.size.map_or_else(|| "-".to_string(), |s| s.to_string()),
                md5: file.computed_md5.clone().unwrap_or_else(|| "-".to_string()),
                url: catalog.remote.download_url(file.id),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
