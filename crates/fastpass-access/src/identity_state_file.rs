use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fastpass_core::UserId;
use serde::{Deserialize, Serialize};

pub const IDENTITY_STATE_SCHEMA_VERSION: u32 = 1;
pub const IDENTITY_STATE_FILE_NAME: &str = "identity-state.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// On-disk shape of the identity state file.
pub struct IdentityStateDocument {
    pub schema_version: u32,
    #[serde(default)]
    pub consented_users: Vec<UserId>,
    #[serde(default)]
    pub submitted_users: Vec<UserId>,
}

impl Default for IdentityStateDocument {
    fn default() -> Self {
        Self {
            schema_version: IDENTITY_STATE_SCHEMA_VERSION,
            consented_users: Vec::new(),
            submitted_users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
/// JSON file holding consent and submission records across restarts.
pub struct IdentityStateFile {
    path: PathBuf,
}

impl IdentityStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_state_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(IDENTITY_STATE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Loads the document. A missing file is an empty state, not an error.
    pub fn load(&self) -> Result<IdentityStateDocument> {
        if !self.path.exists() {
            return Ok(IdentityStateDocument::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read identity state {}", self.path.display()))?;
        let document = serde_json::from_str::<IdentityStateDocument>(&raw)
            .with_context(|| format!("failed to parse identity state {}", self.path.display()))?;
        if document.schema_version != IDENTITY_STATE_SCHEMA_VERSION {
            bail!(
                "unsupported identity state schema: expected {}, found {}",
                IDENTITY_STATE_SCHEMA_VERSION,
                document.schema_version
            );
        }
        Ok(document)
    }

    pub fn save(&self, document: &IdentityStateDocument) -> Result<()> {
        let mut payload = serde_json::to_string_pretty(document)
            .context("failed to serialize identity state")?;
        payload.push('\n');
        replace_file_contents(&self.path, &payload)
            .with_context(|| format!("failed to write identity state {}", self.path.display()))
    }
}

/// Writes to a sibling temp file and renames it over `path`, so a crash never
/// leaves a truncated state file behind.
fn replace_file_contents(path: &Path, content: &str) -> Result<()> {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        bail!("state path '{}' has no file name", path.display());
    };
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let staging = parent.join(format!(".{file_name}.staging-{}", std::process::id()));
    std::fs::write(&staging, content)
        .with_context(|| format!("failed to write {}", staging.display()))?;
    std::fs::rename(&staging, path).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            staging.display(),
            path.display()
        )
    })
}
