use std::sync::Arc;
use thiserror::Error;

use crate::models::{SelectedFile, SessionSnapshot, UploadStatus};
use crate::utils::preview::{is_local_preview, local_preview};

/// Terminal failure of one upload attempt. Messages are the remote ones,
/// passed through untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Upload error: {0}")]
    Store(String),

    #[error("Public URL error: {0}")]
    UrlResolution(String),
}

/// Why `begin_upload` declined to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoFile,
    InProgress,
}

/// Claim on an in-flight upload. Carries the selection it was started for.
#[derive(Debug)]
pub struct UploadTicket {
    epoch: u64,
    file: Arc<SelectedFile>,
}

impl UploadTicket {
    pub fn file(&self) -> &SelectedFile {
        &self.file
    }
}

/// What committing an upload result did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Succeeded { object_key: String, public_url: String },
    Failed(UploadError),
    /// A new file was selected while the upload ran; the result was dropped.
    Superseded,
}

/// In-memory state of one widget. No I/O happens here.
#[derive(Debug)]
pub struct UploadSession {
    selected_file: Option<Arc<SelectedFile>>,
    preview_url: Option<String>,
    status: UploadStatus,
    error_message: Option<String>,
    object_key: Option<String>,
    epoch: u64,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            selected_file: None,
            preview_url: None,
            status: UploadStatus::Idle,
            error_message: None,
            object_key: None,
            epoch: 0,
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_deref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    /// The selected image while the preview still points at it rather than
    /// at the uploaded object.
    pub fn local_preview_file(&self) -> Option<Arc<SelectedFile>> {
        self.preview_url
            .as_deref()
            .filter(|url| is_local_preview(url))
            .and(self.selected_file.clone())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn object_key(&self) -> Option<&str> {
        self.object_key.as_deref()
    }

    pub fn can_upload(&self) -> bool {
        self.selected_file.is_some() && self.status != UploadStatus::Uploading
    }

    /// Replaces the selection and resets the outcome of any previous upload.
    ///
    /// While an upload is in flight the status stays `Uploading`; the
    /// in-flight result is dropped when it lands.
    pub fn select_file(&mut self, file: SelectedFile) {
        self.preview_url = local_preview(&file);
        self.selected_file = Some(Arc::new(file));
        self.error_message = None;
        self.object_key = None;
        self.epoch += 1;
        if self.status != UploadStatus::Uploading {
            self.status = UploadStatus::Idle;
        }
    }

    /// Moves the session to `Uploading` and hands out the ticket for it.
    pub fn begin_upload(&mut self) -> Result<UploadTicket, SkipReason> {
        if self.status == UploadStatus::Uploading {
            return Err(SkipReason::InProgress);
        }
        let file = self.selected_file.clone().ok_or(SkipReason::NoFile)?;

        self.status = UploadStatus::Uploading;
        self.error_message = None;
        self.object_key = None;

        Ok(UploadTicket {
            epoch: self.epoch,
            file,
        })
    }

    /// Records the outcome of the upload started with `ticket`.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        outcome: Result<(String, String), UploadError>,
    ) -> Completion {
        if ticket.epoch != self.epoch {
            self.status = UploadStatus::Idle;
            return Completion::Superseded;
        }

        match outcome {
            Ok((object_key, public_url)) => {
                self.status = UploadStatus::Succeeded;
                self.preview_url = Some(public_url.clone());
                self.object_key = Some(object_key.clone());
                self.error_message = None;
                Completion::Succeeded {
                    object_key,
                    public_url,
                }
            }
            Err(err) => {
                self.status = UploadStatus::Failed;
                self.error_message = Some(err.to_string());
                Completion::Failed(err)
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let file = self.selected_file.as_deref();
        SessionSnapshot {
            file_name: file.map(|f| f.name.clone()),
            content_type: file.map(|f| f.content_type.to_string()),
            size: file.map(SelectedFile::size),
            is_image: file.is_some_and(SelectedFile::is_image),
            status: self.status,
            preview_url: self.preview_url.clone(),
            error_message: self.error_message.clone(),
            object_key: self.object_key.clone(),
            can_upload: self.can_upload(),
        }
    }
}
