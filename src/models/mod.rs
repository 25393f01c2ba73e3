use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use utoipa::ToSchema;

use crate::utils::validation::resolve_content_type;

/// A user-chosen blob: original name, resolved MIME type and the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: mime::Mime,
    pub data: Bytes,
}

impl SelectedFile {
    /// Builds a selection, resolving the MIME type from the declared value
    /// first and the file signature second.
    pub fn new(name: impl Into<String>, declared_type: Option<&str>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let content_type = resolve_content_type(declared_type, &data);
        Self {
            name: name.into(),
            content_type,
            data,
        }
    }

    /// Reads a file from disk. The selection keeps the final path component
    /// as its name.
    pub async fn from_path(path: &Path, declared_type: Option<&str>) -> anyhow::Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Path has no file name: {}", path.display()))?
            .to_string();
        let data = tokio::fs::read(path).await?;
        Ok(Self::new(name, declared_type, data))
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_image(&self) -> bool {
        self.content_type.type_() == mime::IMAGE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

/// Serializable view of the upload session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionSnapshot {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: Option<usize>,
    pub is_image: bool,
    pub status: UploadStatus,
    pub preview_url: Option<String>,
    pub error_message: Option<String>,
    pub object_key: Option<String>,
    /// False while an upload is in flight or when nothing is selected.
    pub can_upload: bool,
}
