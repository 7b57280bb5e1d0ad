//! Blocking client for the Figshare v2 REST API.
//!
//! Collections are Figshare "articles". Uploads follow the three-stage
//! protocol: register the file (`POST .../files`), send each part to the
//! upload service (`PUT <upload_url>/<partNo>`), then mark it complete
//! (`POST .../files/<id>`).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use figsync_core::identity::identity;
use figsync_core::{CollectionId, CollectionMetadata, ContentIdentity, FileId, RemoteFile};

use crate::backoff::RetryPolicy;
use crate::error::{io_err, RemoteError};
use crate::repository::{RemoteInventory, Repository, UploadReceipt};

const PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct FigshareClient {
    agent: ureq::Agent,
    api_base: String,
    token: Option<String>,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct Location {
    location: String,
    #[serde(default)]
    entity_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct FileRegistration<'a> {
    name: &'a str,
    md5: &'a str,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct UploadTarget {
    id: u64,
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadPlan {
    #[serde(default)]
    parts: Vec<UploadPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadPart {
    part_no: u64,
    start_offset: u64,
    end_offset: u64,
}

impl FigshareClient {
    /// Client for `api_base` (e.g. `https://api.figshare.com/v2`).
    ///
    /// `token` may be `None`; authenticated calls then fail with
    /// [`RemoteError::MissingToken`].
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .timeout_read(Duration::from_secs(300))
            .build();
        Self {
            agent,
            api_base: api_base.into(),
            token,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Remove a file from a collection.
    pub fn delete_file(&self, collection: CollectionId, file: FileId) -> Result<(), RemoteError> {
        let url = self.endpoint(&format!("account/articles/{collection}/files/{file}"));
        let auth = self.auth_header_value()?;
        self.retry.run(&url, || {
            self.agent.delete(&url).set("Authorization", &auth).call()?;
            Ok(())
        })?;
        tracing::info!(collection = %collection, file_id = %file, "deleted remote file");
        Ok(())
    }

    /// Upload `local` as a new file named `name`. Does not check for an existing one.
    pub fn upload_file(
        &self,
        collection: CollectionId,
        local: &Path,
        name: &str,
        content: &ContentIdentity,
    ) -> Result<FileId, RemoteError> {
        let files_url = self.endpoint(&format!("account/articles/{collection}/files"));
        let registration = FileRegistration {
            name,
            md5: &content.md5,
            size: content.size,
        };
        let created: Location = self.post_json(&files_url, &registration)?;
        let target: UploadTarget = self.get_json(&created.location)?;
        let plan: UploadPlan = self.get_json(&target.upload_url)?;

        let mut file = File::open(local).map_err(|e| io_err(local, e))?;
        for part in &plan.parts {
            let bytes = read_part(&mut file, local, part)?;
            let part_url = format!("{}/{}", target.upload_url, part.part_no);
            self.put_bytes(&part_url, &bytes)?;
            tracing::debug!(name, part = part.part_no, bytes = bytes.len(), "uploaded part");
        }

        let complete_url = self.endpoint(&format!(
            "account/articles/{collection}/files/{}",
            target.id
        ));
        self.post_empty(&complete_url)?;
        tracing::info!(collection = %collection, file_id = target.id, name, "uploaded file");
        Ok(FileId(target.id))
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn auth_header_value(&self) -> Result<String, RemoteError> {
        self.token
            .as_deref()
            .map(|token| format!("token {token}"))
            .ok_or(RemoteError::MissingToken)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RemoteError> {
        let auth = self.auth_header_value()?;
        self.retry.run(url, || {
            let response = self.agent.get(url).set("Authorization", &auth).call()?;
            decode(url, response)
        })
    }

    // POSTs create resources; they are sent once.
    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let auth = self.auth_header_value()?;
        let response = self
            .agent
            .post(url)
            .set("Authorization", &auth)
            .send_json(body)?;
        decode(url, response)
    }

    fn post_empty(&self, url: &str) -> Result<(), RemoteError> {
        let auth = self.auth_header_value()?;
        self.agent.post(url).set("Authorization", &auth).call()?;
        Ok(())
    }

    fn put_bytes(&self, url: &str, bytes: &[u8]) -> Result<(), RemoteError> {
        let auth = self.auth_header_value()?;
        self.retry.run(url, || {
            self.agent
                .put(url)
                .set("Authorization", &auth)
                .send_bytes(bytes)?;
            Ok(())
        })
    }
}

impl Repository for FigshareClient {
    fn collection_exists(&self, collection: CollectionId) -> Result<bool, RemoteError> {
        let url = self.endpoint(&format!("account/articles/{collection}"));
        match self.get_json::<serde_json::Value>(&url) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn create_collection(
        &self,
        metadata: &CollectionMetadata,
    ) -> Result<CollectionId, RemoteError> {
        let url = self.endpoint("account/articles");
        let created: Location = self.post_json(&url, metadata)?;
        let id = created
            .entity_id
            .or_else(|| id_from_location(&created.location))
            .ok_or_else(|| RemoteError::MalformedResponse {
                endpoint: url.clone(),
                detail: format!("no collection id in location '{}'", created.location),
            })?;
        tracing::info!(collection = id, title = %metadata.title, "created collection");
        Ok(CollectionId(id))
    }

    fn list_files(&self, collection: CollectionId) -> Result<RemoteInventory, RemoteError> {
        let url = self.endpoint(&format!("account/articles/{collection}/files"));
        let mut inventory = RemoteInventory::new();
        let mut page = 1usize;
        loop {
            let page_url = format!("{url}?page={page}&page_size={PAGE_SIZE}");
            let files: Vec<RemoteFile> = self.get_json(&page_url)?;
            let count = files.len();
            for file in files {
                inventory.insert(file);
            }
            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }
        Ok(inventory)
    }

    fn file_matches(
        &self,
        collection: CollectionId,
        name: &str,
        md5: &str,
    ) -> Result<Option<FileId>, RemoteError> {
        let inventory = self.list_files(collection)?;
        Ok(inventory
            .get(name)
            .filter(|file| file.computed_md5.as_deref() == Some(md5))
            .map(|file| file.id))
    }

    fn upload_if_needed(
        &self,
        collection: CollectionId,
        local: &Path,
        name: &str,
        force: bool,
    ) -> Result<UploadReceipt, RemoteError> {
        let content = identity(local)?;
        let inventory = self.list_files(collection)?;

        if let Some(existing) = inventory.get(name) {
            if !force && existing.computed_md5.as_deref() == Some(content.md5.as_str()) {
                tracing::debug!(name, file_id = %existing.id, "identical file already present");
                return Ok(UploadReceipt {
                    file_id: existing.id,
                    uploaded: false,
                });
            }
            self.delete_file(collection, existing.id)?;
        }

        let file_id = self.upload_file(collection, local, name, &content)?;
        Ok(UploadReceipt {
            file_id,
            uploaded: true,
        })
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, response: ureq::Response) -> Result<T, RemoteError> {
    response
        .into_json::<T>()
        .map_err(|source| RemoteError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
}

fn id_from_location(location: &str) -> Option<u64> {
    location.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

fn read_part(file: &mut File, path: &Path, part: &UploadPart) -> Result<Vec<u8>, RemoteError> {
    let len = part.end_offset.saturating_sub(part.start_offset) + 1;
    let mut buf = Vec::with_capacity(len as usize);
    file.seek(SeekFrom::Start(part.start_offset))
        .map_err(|e| io_err(path, e))?;
    file.by_ref()
        .take(len)
        .read_to_end(&mut buf)
        .map_err(|e| io_err(path, e))?;
    Ok(buf)
}
