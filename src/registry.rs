//! Model, dataset and space registry
//!
//! [`HubStore`] talks to the Hugging Face Hub over HTTP; [`LocalStore`] mirrors the
//! same layout on disk for offline runs and tests.

use crate::config::RegistryConfig;
use crate::error::{PredictorError, Result};
use base64::Engine;
use serde_json::json;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoKind {
    Dataset,
    Model,
    Space,
}

impl RepoKind {
    /// Segment used in API routes (`/api/{segment}/{id}/...`)
    fn api_segment(self) -> &'static str {
        match self {
            RepoKind::Dataset => "datasets",
            RepoKind::Model => "models",
            RepoKind::Space => "spaces",
        }
    }

    /// Prefix used in file URLs; models live at the root
    fn url_prefix(self) -> &'static str {
        match self {
            RepoKind::Dataset => "datasets/",
            RepoKind::Model => "",
            RepoKind::Space => "spaces/",
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            RepoKind::Dataset => "dataset",
            RepoKind::Model => "model",
            RepoKind::Space => "space",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub kind: RepoKind,
    /// `owner/name`
    pub id: String,
}

impl RepoId {
    pub fn dataset(id: impl Into<String>) -> Self {
        Self { kind: RepoKind::Dataset, id: id.into() }
    }

    pub fn model(id: impl Into<String>) -> Self {
        Self { kind: RepoKind::Model, id: id.into() }
    }

    pub fn space(id: impl Into<String>) -> Self {
        Self { kind: RepoKind::Space, id: id.into() }
    }

    fn split(&self) -> (Option<&str>, &str) {
        match self.id.split_once('/') {
            Some((owner, name)) => (Some(owner), name),
            None => (None, self.id.as_str()),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.url_prefix(), self.id)
    }
}

/// A file to publish, addressed by its path inside the repo
#[derive(Debug, Clone)]
pub struct RepoFile {
    pub path: String,
    pub content: Vec<u8>,
}

impl RepoFile {
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Self {
        Self { path: path.into(), content }
    }
}

pub trait ArtifactStore: Send + Sync {
    /// Download one file from the head of the repo
    fn fetch(&self, repo: &RepoId, path: &str) -> Result<Vec<u8>>;

    /// Create the repo; an existing repo is not an error
    fn create_repo(&self, repo: &RepoId, space_sdk: Option<&str>) -> Result<()>;

    /// Publish all `files` as one commit
    fn upload(&self, repo: &RepoId, files: &[RepoFile], message: &str) -> Result<()>;
}

/// Open the store selected by the configuration
pub fn open_store(config: &RegistryConfig) -> Result<Box<dyn ArtifactStore>> {
    Ok(match &config.local_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Using local registry");
            Box::new(LocalStore::new(dir))
        }
        None => {
            info!(endpoint = %config.endpoint, "Using Hugging Face Hub registry");
            Box::new(HubStore::new(&config.endpoint, config.token.clone())?)
        }
    })
}

fn unavailable(repo: &RepoId, file: &str, reason: impl fmt::Display) -> PredictorError {
    PredictorError::RegistryUnavailable {
        repo: repo.to_string(),
        file: file.to_string(),
        reason: reason.to_string(),
    }
}

/// Reject absolute paths and `..` so uploads stay inside the repo
fn validate_repo_path(path: &str) -> Result<()> {
    let ok = !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(PredictorError::InvalidData(format!("invalid repo path '{}'", path)))
    }
}

pub struct HubStore {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: Option<String>,
}

impl HubStore {
    pub fn new(endpoint: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("tourism-package-predictor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn file_url(&self, repo: &RepoId, path: &str) -> String {
        format!("{}/{}/resolve/main/{}", self.endpoint, repo, path)
    }

    fn require_token(&self, repo: &RepoId, file: &str) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| unavailable(repo, file, "HF_TOKEN is required to publish"))
    }
}

impl ArtifactStore for HubStore {
    fn fetch(&self, repo: &RepoId, path: &str) -> Result<Vec<u8>> {
        let url = self.file_url(repo, path);
        debug!(url = %url, "Fetching artifact");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().map_err(|e| unavailable(repo, path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(repo, path, format!("HTTP {}", status)));
        }

        let bytes = response.bytes().map_err(|e| unavailable(repo, path, e))?;
        info!(repo = %repo, file = path, size_bytes = bytes.len(), "Fetched artifact");
        Ok(bytes.to_vec())
    }

    fn create_repo(&self, repo: &RepoId, space_sdk: Option<&str>) -> Result<()> {
        let token = self.require_token(repo, "")?;
        let (organization, name) = repo.split();

        let mut body = json!({
            "name": name,
            "organization": organization,
            "type": repo.kind.type_name(),
            "private": false,
        });
        if let Some(sdk) = space_sdk {
            body["sdk"] = json!(sdk);
        }

        let response = self
            .client
            .post(format!("{}/api/repos/create", self.endpoint))
            .bearer_auth(token)
            .json(&body)
            .send()
            .map_err(|e| unavailable(repo, "", e))?;

        match response.status() {
            s if s.is_success() => {
                info!(repo = %repo, "Created repo");
                Ok(())
            }
            reqwest::StatusCode::CONFLICT => {
                debug!(repo = %repo, "Repo already exists");
                Ok(())
            }
            s => Err(unavailable(repo, "", format!("create failed with HTTP {}", s))),
        }
    }

    fn upload(&self, repo: &RepoId, files: &[RepoFile], message: &str) -> Result<()> {
        let token = self.require_token(repo, "")?;

        // NDJSON commit: a header line followed by one line per base64 file
        let mut payload = String::new();
        payload.push_str(&json!({"key": "header", "value": {"summary": message, "description": ""}}).to_string());
        payload.push('\n');
        for file in files {
            validate_repo_path(&file.path)?;
            let content = base64::engine::general_purpose::STANDARD.encode(&file.content);
            payload.push_str(
                &json!({"key": "file", "value": {"content": content, "path": file.path, "encoding": "base64"}})
                    .to_string(),
            );
            payload.push('\n');
        }

        let url = format!("{}/api/{}/{}/commit/main", self.endpoint, repo.kind.api_segment(), repo.id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(payload)
            .send()
            .map_err(|e| unavailable(repo, "", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(unavailable(repo, "", format!("commit failed with HTTP {}: {}", status, detail)));
        }

        info!(
            repo = %repo,
            files = files.len(),
            size_bytes = files.iter().map(|f| f.content.len()).sum::<usize>(),
            "Uploaded files"
        );
        Ok(())
    }
}

/// Directory-backed registry: `{root}/{datasets|models|spaces}/{owner}/{name}/{path}`
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn repo_dir(&self, repo: &RepoId) -> PathBuf {
        self.root.join(repo.kind.api_segment()).join(&repo.id)
    }
}

impl ArtifactStore for LocalStore {
    fn fetch(&self, repo: &RepoId, path: &str) -> Result<Vec<u8>> {
        validate_repo_path(path)?;
        let file = self.repo_dir(repo).join(path);
        let bytes = std::fs::read(&file).map_err(|e| unavailable(repo, path, e))?;
        debug!(file = %file.display(), size_bytes = bytes.len(), "Read local artifact");
        Ok(bytes)
    }

    fn create_repo(&self, repo: &RepoId, space_sdk: Option<&str>) -> Result<()> {
        let dir = self.repo_dir(repo);
        std::fs::create_dir_all(&dir)?;
        if let Some(sdk) = space_sdk {
            std::fs::write(dir.join(".sdk"), sdk)?;
        }
        Ok(())
    }

    fn upload(&self, repo: &RepoId, files: &[RepoFile], message: &str) -> Result<()> {
        let dir = self.repo_dir(repo);
        for file in files {
            validate_repo_path(&file.path)?;
            let target = dir.join(&file.path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, &file.content)?;
        }
        info!(repo = %repo, files = files.len(), message, "Wrote files to local registry");
        Ok(())
    }
}
