pub mod memory;
pub mod notifier;
pub mod session;
pub mod storage;
pub mod supabase;
pub mod upload_widget;
