use crate::config::{StorageBackend, UploaderConfig};
use crate::services::memory::MemoryObjectStore;
use crate::services::storage::{ObjectStore, S3ObjectStore};
use crate::services::supabase::SupabaseObjectStore;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

/// The configured store, plus a direct handle when it lives in memory so the
/// server can serve its objects.
#[derive(Clone)]
pub struct StorageHandle {
    pub store: Arc<dyn ObjectStore>,
    pub memory: Option<Arc<MemoryObjectStore>>,
}

pub async fn setup_storage(config: &UploaderConfig) -> anyhow::Result<StorageHandle> {
    match config.storage_backend {
        StorageBackend::S3 => setup_s3(config).await,
        StorageBackend::Supabase => {
            let url = UploaderConfig::require(&config.supabase_url, "SUPABASE_URL")?;
            let key = UploaderConfig::require(&config.supabase_key, "SUPABASE_KEY")?;

            info!("☁️  Supabase Storage: {} (Bucket: {})", url, config.bucket);

            let store = SupabaseObjectStore::new(
                url,
                key.to_string(),
                config.bucket.clone(),
                config.supabase_upsert,
            )?;
            Ok(StorageHandle {
                store: Arc::new(store),
                memory: None,
            })
        }
        StorageBackend::Memory => {
            let base = config
                .public_base_url
                .clone()
                .unwrap_or_else(|| "http://localhost:3000/objects".to_string());

            info!("🧠 In-memory storage (Bucket: {})", config.bucket);

            let store = Arc::new(MemoryObjectStore::new(config.bucket.clone(), base));
            Ok(StorageHandle {
                store: store.clone(),
                memory: Some(store),
            })
        }
    }
}

async fn setup_s3(config: &UploaderConfig) -> anyhow::Result<StorageHandle> {
    let endpoint_url = UploaderConfig::require(&config.s3_endpoint, "S3_ENDPOINT")?;
    let access_key = UploaderConfig::require(&config.s3_access_key, "S3_ACCESS_KEY")?;
    let secret_key = UploaderConfig::require(&config.s3_secret_key, "S3_SECRET_KEY")?;
    let bucket = config.bucket.clone();

    info!("☁️  S3 Storage: {} (Bucket: {})", endpoint_url, bucket);

    let aws_config = aws_config::from_env()
        .endpoint_url(endpoint_url)
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key, secret_key, None, None, "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    // Ensure bucket exists
    match s3_client.head_bucket().bucket(&bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
        Err(_) => {
            info!("🪣 Bucket '{}' not found, creating...", bucket);
            if let Err(e) = s3_client.create_bucket().bucket(&bucket).send().await {
                tracing::error!("❌ Failed to create bucket '{}': {}", bucket, e);
            } else {
                info!("✅ Bucket '{}' created successfully", bucket);
            }
        }
    }

    let public_base_url = config
        .public_base_url
        .clone()
        .unwrap_or_else(|| endpoint_url.to_string());

    Ok(StorageHandle {
        store: Arc::new(S3ObjectStore::new(s3_client, bucket, public_base_url)),
        memory: None,
    })
}
