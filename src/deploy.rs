//! Deployment step: push the dashboard sources to a Docker space

use crate::error::{PredictorError, Result};
use crate::registry::{ArtifactStore, RepoFile, RepoId};
use std::path::Path;
use tracing::info;

pub const SPACE_SDK: &str = "docker";

/// Files that must exist at the project root before anything is uploaded
pub const REQUIRED_FILES: [&str; 2] = ["Dockerfile", "Cargo.toml"];

const OPTIONAL_FILES: [&str; 1] = ["Cargo.lock"];
const SOURCE_DIR: &str = "src";

/// Gather the container definition, the manifest and every file under `src/`
pub fn collect_deploy_files(root: &Path) -> Result<Vec<RepoFile>> {
    let mut files = Vec::new();

    for name in REQUIRED_FILES {
        let path = root.join(name);
        if !path.is_file() {
            return Err(PredictorError::InvalidData(format!(
                "required deployment file '{}' not found",
                path.display()
            )));
        }
        files.push(RepoFile::new(name, std::fs::read(&path)?));
    }

    for name in OPTIONAL_FILES {
        let path = root.join(name);
        if path.is_file() {
            files.push(RepoFile::new(name, std::fs::read(&path)?));
        }
    }

    let src = root.join(SOURCE_DIR);
    if !src.is_dir() {
        return Err(PredictorError::InvalidData(format!(
            "source directory '{}' not found",
            src.display()
        )));
    }
    collect_dir(root, &src, &mut files)?;

    Ok(files)
}

fn collect_dir(root: &Path, dir: &Path, files: &mut Vec<RepoFile>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            collect_dir(root, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            // repo paths always use forward slashes
            let repo_path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(RepoFile::new(repo_path, std::fs::read(&path)?));
        }
    }
    Ok(())
}

/// Create the space if needed and upload all files in one commit
pub fn deploy(store: &dyn ArtifactStore, space: &RepoId, files: &[RepoFile]) -> Result<()> {
    store.create_repo(space, Some(SPACE_SDK))?;
    store.upload(space, files, "Deploy tourism package predictor dashboard")?;
    info!(space = %space, files = files.len(), "Deployed dashboard");
    Ok(())
}
