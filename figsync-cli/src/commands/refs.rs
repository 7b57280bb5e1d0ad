//! `figsync refs`: offline view of file references in model metadata.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use figsync_core::{
    find_file_references, locator, FileTypeFilter, MetadataError, ModelDocument,
};

use super::{load_catalog, select_models, select_tasks};

/// Arguments for `figsync refs`.
#[derive(Args, Debug)]
pub struct RefsArgs {
    #[arg(long, num_args = 1..)]
    pub models: Vec<String>,

    #[arg(long, num_args = 1..)]
    pub tasks: Vec<String>,

    #[arg(long, default_value = "all")]
    pub file_type: FileTypeFilter,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct RefRow {
    task: String,
    model: String,
    key_path: String,
    file: String,
    exists_locally: bool,
    url: Option<String>,
}

#[derive(Tabled)]
struct RefTableRow {
    #[tabled(rename = "model")]
    model: String,
    #[tabled(rename = "key")]
    key_path: String,
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "local")]
    local: String,
    #[tabled(rename = "url")]
    url: String,
}

impl RefsArgs {
    pub fn run(self, catalog_path: &Path) -> Result<()> {
        let catalog = load_catalog(catalog_path)?;
        let tasks = select_tasks(&catalog, &self.tasks)?;
        let models = select_models(&catalog, &self.models)?;
        let root = catalog.artifact_root(catalog_path);

        let mut rows = Vec::new();
        for model in &models {
            let Some(entry) = catalog.model(model) else {
                continue;
            };
            let doc_path = catalog.model_document_path(catalog_path, entry);
            let doc = match ModelDocument::load_at(&doc_path) {
                Ok(doc) => doc,
                Err(MetadataError::NotFound { path }) => {
                    tracing::warn!(model = %model, path = %path.display(), "missing model metadata file");
                    continue;
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("failed to read metadata for '{model}'"))
                }
            };
            for task in &tasks {
                let Some(tree) = doc.task_metrics(task) else {
                    continue;
                };
                for reference in find_file_references(tree, self.file_type) {
                    rows.push(RefRow {
                        task: task.to_string(),
                        model: model.to_string(),
                        exists_locally: root.join(&reference.rel_path).is_file(),
                        url: locator(tree, &reference.key_path).map(str::to_string),
                        key_path: reference.key_path.to_string(),
                        file: reference.rel_path,
                    });
                }
            }
        }

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize refs JSON")?
            );
            return Ok(());
        }
        print_tables(&tasks, rows);
        Ok(())
    }
}

fn print_tables(tasks: &[figsync_core::TaskId], rows: Vec<RefRow>) {
    if rows.is_empty() {
        println!("No file references found.");
        return;
    }
    for task in tasks {
        let task_rows: Vec<RefTableRow> = rows
            .iter()
            .filter(|row| row.task == task.0)
            .map(|row| RefTableRow {
                model: row.model.clone(),
                key_path: row.key_path.clone(),
                file: row.file.clone(),
                local: if row.exists_locally {
                    "yes".green().to_string()
                } else {
                    "missing".red().to_string()
                },
                url: row.url.clone().unwrap_or_else(|| "-".to_string()),
            })
            .collect();
        if task_rows.is_empty() {
            continue;
        }
        println!("{}", task.to_string().to_uppercase().bold());
        let mut table = Table::new(task_rows);
        table.with(Style::rounded());
        println!("{table}");
    }
}
