use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Emitted once per successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSucceeded {
    pub file_name: String,
    pub object_key: String,
    pub public_url: String,
    pub size: usize,
}

/// Post-success notification. Hooks run after the session has committed the
/// result and cannot change it.
#[async_trait]
pub trait UploadHook: Send + Sync {
    async fn on_success(&self, event: &UploadSucceeded);

    /// A new file was selected; whatever the last success left behind is stale.
    async fn on_select(&self) {}
}

pub struct LogHook;

#[async_trait]
impl UploadHook for LogHook {
    async fn on_success(&self, event: &UploadSucceeded) {
        info!(
            file_name = %event.file_name,
            object_key = %event.object_key,
            size = event.size,
            "✅ Uploaded, public URL: {}",
            event.public_url
        );
    }
}

/// Parameters of the confetti burst drawn by the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Celebration {
    pub particle_count: u32,
    pub spread: u32,
    pub origin_y: f32,
}

impl Default for Celebration {
    fn default() -> Self {
        Self {
            particle_count: 100,
            spread: 70,
            origin_y: 0.6,
        }
    }
}

/// One-shot celebration: armed by a success, consumed by the next render.
#[derive(Default)]
pub struct CelebrationHook {
    pending: AtomicBool,
    celebration: Celebration,
}

impl CelebrationHook {
    pub fn new(celebration: Celebration) -> Self {
        Self {
            pending: AtomicBool::new(false),
            celebration,
        }
    }

    /// Returns the burst at most once per success.
    pub fn take(&self) -> Option<Celebration> {
        self.pending
            .swap(false, Ordering::AcqRel)
            .then_some(self.celebration)
    }
}

#[async_trait]
impl UploadHook for CelebrationHook {
    async fn on_success(&self, event: &UploadSucceeded) {
        tracing::debug!("🎉 Celebrating upload of {}", event.file_name);
        self.pending.store(true, Ordering::Release);
    }

    async fn on_select(&self) {
        self.pending.store(false, Ordering::Release);
    }
}
