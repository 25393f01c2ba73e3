use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::{SelectedFile, SessionSnapshot};
use crate::services::notifier::{UploadHook, UploadSucceeded};
use crate::services::session::{Completion, SkipReason, UploadError, UploadSession, UploadTicket};
use crate::services::storage::ObjectStore;
use crate::utils::object_key::KeyStrategy;

/// Result of one `upload` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded {
        object_key: String,
        public_url: String,
    },
    Failed(UploadError),
    Skipped(SkipReason),
    Superseded,
}

impl From<Completion> for UploadOutcome {
    fn from(completion: Completion) -> Self {
        match completion {
            Completion::Succeeded {
                object_key,
                public_url,
            } => UploadOutcome::Succeeded {
                object_key,
                public_url,
            },
            Completion::Failed(err) => UploadOutcome::Failed(err),
            Completion::Superseded => UploadOutcome::Superseded,
        }
    }
}

/// Drives one upload session against an injected object store.
///
/// The session lock is never held across a remote call, so snapshots and
/// selections stay responsive while an upload runs. Hooks run under the lock.
pub struct UploadWidget {
    store: Arc<dyn ObjectStore>,
    key_strategy: KeyStrategy,
    hooks: Vec<Arc<dyn UploadHook>>,
    session: Mutex<UploadSession>,
}

impl UploadWidget {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            key_strategy: KeyStrategy::default(),
            hooks: Vec::new(),
            session: Mutex::new(UploadSession::new()),
        }
    }

    pub fn with_key_strategy(mut self, key_strategy: KeyStrategy) -> Self {
        self.key_strategy = key_strategy;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn UploadHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn local_preview_file(&self) -> Option<Arc<SelectedFile>> {
        self.session.lock().await.local_preview_file()
    }

    pub async fn select_file(&self, file: SelectedFile) -> SessionSnapshot {
        info!(
            "📎 Selected {} ({}, {} bytes)",
            file.name,
            file.content_type,
            file.size()
        );
        let mut session = self.session.lock().await;
        session.select_file(file);
        for hook in &self.hooks {
            hook.on_select().await;
        }
        session.snapshot()
    }

    pub async fn upload(&self) -> UploadOutcome {
        let ticket = match self.session.lock().await.begin_upload() {
            Ok(ticket) => ticket,
            Err(reason) => {
                tracing::debug!("Upload skipped: {:?}", reason);
                return UploadOutcome::Skipped(reason);
            }
        };

        let file_name = ticket.file().name.clone();
        let size = ticket.file().size();
        let result = self.run_pipeline(&ticket).await;

        // Hooks run before the lock is released so a reader never sees the
        // committed success without its side effects.
        let mut session = self.session.lock().await;
        let completion = session.finish_upload(ticket, result);

        match &completion {
            Completion::Succeeded {
                object_key,
                public_url,
            } => {
                let event = UploadSucceeded {
                    file_name,
                    object_key: object_key.clone(),
                    public_url: public_url.clone(),
                    size,
                };
                for hook in &self.hooks {
                    hook.on_success(&event).await;
                }
            }
            Completion::Failed(err) => warn!("❌ Upload of {} failed: {}", file_name, err),
            Completion::Superseded => {
                info!("↩️  Upload of {} finished after a new selection, result dropped", file_name)
            }
        }
        drop(session);

        completion.into()
    }

    /// Store then resolve. The second call only runs once the first succeeded.
    async fn run_pipeline(&self, ticket: &UploadTicket) -> Result<(String, String), UploadError> {
        let file = ticket.file();
        let key = self.key_strategy.object_key(file);

        info!(
            "⬆️  Uploading {} to {}/{}",
            file.name,
            self.store.bucket(),
            key
        );

        self.store
            .store(&key, file.data.clone(), file.content_type.essence_str())
            .await
            .map_err(|e| UploadError::Store(e.to_string()))?;

        let public_url = self
            .store
            .public_url(&key)
            .await
            .map_err(|e| UploadError::UrlResolution(e.to_string()))?;

        Ok((key, public_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadStatus;
    use crate::services::memory::MemoryObjectStore;
    use crate::services::notifier::CelebrationHook;

    fn widget() -> (Arc<MemoryObjectStore>, UploadWidget) {
        let store = Arc::new(MemoryObjectStore::new("image_uploader", "http://localhost/objects"));
        (store.clone(), UploadWidget::new(store))
    }

    #[tokio::test]
    async fn test_round_trip_through_memory_store() {
        let (store, widget) = widget();
        widget
            .select_file(SelectedFile::new("cat.png", Some("image/png"), &b"\x89PNG"[..]))
            .await;

        let outcome = widget.upload().await;
        assert_eq!(
            outcome,
            UploadOutcome::Succeeded {
                object_key: "cat.png".to_string(),
                public_url: "http://localhost/objects/image_uploader/cat.png".to_string(),
            }
        );
        assert_eq!(store.get("cat.png").unwrap().content_type, "image/png");

        let snapshot = widget.snapshot().await;
        assert_eq!(snapshot.status, UploadStatus::Succeeded);
        assert_eq!(
            snapshot.preview_url.as_deref(),
            Some("http://localhost/objects/image_uploader/cat.png")
        );
    }

    #[tokio::test]
    async fn test_key_strategy_is_applied() {
        let store = Arc::new(MemoryObjectStore::new("b", "http://x"));
        let widget = UploadWidget::new(store.clone()).with_key_strategy(KeyStrategy::ContentHash);
        widget
            .select_file(SelectedFile::new("a.txt", Some("text/plain"), &b"hello world"[..]))
            .await;
        widget.upload().await;
        assert!(store.get("b94d27b9934d3e08-a.txt").is_some());
    }

    #[tokio::test]
    async fn test_hook_runs_on_success_only() {
        let (_store, widget) = widget();
        let celebration = Arc::new(CelebrationHook::default());
        let widget = widget.with_hook(celebration.clone());

        assert_eq!(widget.upload().await, UploadOutcome::Skipped(SkipReason::NoFile));
        assert!(celebration.take().is_none());

        widget
            .select_file(SelectedFile::new("a.txt", None, &b"abc"[..]))
            .await;
        widget.upload().await;
        assert!(celebration.take().is_some());
    }

    #[tokio::test]
    async fn test_new_selection_disarms_celebration() {
        let (_store, widget) = widget();
        let celebration = Arc::new(CelebrationHook::default());
        let widget = widget.with_hook(celebration.clone());

        widget
            .select_file(SelectedFile::new("a.txt", None, &b"abc"[..]))
            .await;
        widget.upload().await;
        widget
            .select_file(SelectedFile::new("b.txt", None, &b"def"[..]))
            .await;
        assert!(celebration.take().is_none());
    }
}
