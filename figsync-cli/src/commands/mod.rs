pub mod list;
pub mod refs;
pub mod sync;

use std::path::Path;

use anyhow::{bail, Context, Result};

use figsync_core::{Catalog, ModelName, TaskId};
use figsync_remote::FigshareClient;

/// Environment variable holding the Figshare personal token.
pub const TOKEN_ENV: &str = "FIGSHARE_TOKEN";

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    Catalog::load_at(path).with_context(|| format!("failed to load catalog {}", path.display()))
}

/// Requested tasks, or every catalog task when none were named.
pub fn select_tasks(catalog: &Catalog, requested: &[String]) -> Result<Vec<TaskId>> {
    let known = catalog.task_ids();
    select(requested, &known, "task")
}

/// Requested models, or every catalog model when none were named.
pub fn select_models(catalog: &Catalog, requested: &[String]) -> Result<Vec<ModelName>> {
    let known = catalog.model_names();
    select(requested, &known, "model")
}

fn select<T>(requested: &[String], known: &[T], kind: &str) -> Result<Vec<T>>
where
    T: Clone + ToString + for<'a> From<&'a str> + PartialEq,
{
    if requested.is_empty() {
        return Ok(known.to_vec());
    }
    let unknown: Vec<&str> = requested
        .iter()
        .map(String::as_str)
        .filter(|name| !known.contains(&T::from(*name)))
        .collect();
    if !unknown.is_empty() {
        let valid: Vec<String> = known.iter().map(ToString::to_string).collect();
        bail!(
            "unknown {kind}(s): {}; valid {kind}s: {}",
            unknown.join(", "),
            valid.join(", ")
        );
    }
    Ok(requested.iter().map(|name| T::from(name.as_str())).collect())
}

/// `FIGSHARE_TOKEN`, else `<config_dir>/figsync/token`.
///
/// `None` is not an error here: offline dry runs never authenticate, and the
/// client reports a missing token on its first request.
pub fn load_token() -> Result<Option<String>> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(Some(token));
        }
    }
    let Some(path) = dirs::config_dir().map(|dir| dir.join("figsync").join("token")) else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let token = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read token file {}", path.display()))?;
    let token = token.trim();
    Ok((!token.is_empty()).then(|| token.to_string()))
}

pub fn client(catalog: &Catalog) -> Result<FigshareClient> {
    Ok(FigshareClient::new(catalog.remote.api_base.clone(), load_token()?))
}
