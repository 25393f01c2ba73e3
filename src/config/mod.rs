use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::utils::object_key::KeyStrategy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where uploaded objects go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Supabase,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s3" | "minio" => Ok(StorageBackend::S3),
            "supabase" => Ok(StorageBackend::Supabase),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StorageBackend::S3 => "s3",
            StorageBackend::Supabase => "supabase",
            StorageBackend::Memory => "memory",
        })
    }
}

/// Uploader configuration
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Storage backend: "s3", "supabase" or "memory" (default: "s3")
    pub storage_backend: StorageBackend,

    /// Bucket holding the uploads (default: "image_uploader")
    pub bucket: String,

    /// S3-compatible endpoint, e.g. a MinIO server
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,

    /// S3 region (default: "us-east-1")
    pub s3_region: String,

    /// Base of public object URLs for the S3 and memory backends.
    /// Falls back to the S3 endpoint.
    pub public_base_url: Option<String>,

    /// Supabase project URL
    pub supabase_url: Option<String>,
    /// Supabase API key (anon or service role)
    pub supabase_key: Option<String>,
    /// Overwrite existing objects on Supabase (default: true)
    pub supabase_upsert: bool,

    /// How object keys are derived from file names (default: original)
    pub key_strategy: KeyStrategy,

    /// Maximum file size in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// Show the celebration after a successful upload (default: true)
    pub celebrate: bool,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::S3,
            bucket: "image_uploader".to_string(),
            s3_endpoint: None,
            s3_access_key: None,
            s3_secret_key: None,
            s3_region: "us-east-1".to_string(),
            public_base_url: None,
            supabase_url: None,
            supabase_key: None,
            supabase_upsert: true,
            key_strategy: KeyStrategy::OriginalName,
            max_file_size: crate::utils::validation::MAX_FILE_SIZE,
            celebrate: true,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse().map_err(|e: T::Err| {
            ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }
        }),
        _ => Ok(default),
    }
}

fn flag_var(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v.to_lowercase() != "false" && v != "0")
        .unwrap_or(default)
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl UploaderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();

        Ok(Self {
            storage_backend: parse_var("STORAGE_BACKEND", default.storage_backend)?,
            bucket: optional_var("STORAGE_BUCKET").unwrap_or(default.bucket),
            s3_endpoint: optional_var("S3_ENDPOINT"),
            s3_access_key: optional_var("S3_ACCESS_KEY"),
            s3_secret_key: optional_var("S3_SECRET_KEY"),
            s3_region: optional_var("S3_REGION").unwrap_or(default.s3_region),
            public_base_url: optional_var("PUBLIC_BASE_URL"),
            supabase_url: optional_var("SUPABASE_URL"),
            supabase_key: optional_var("SUPABASE_KEY"),
            supabase_upsert: flag_var("SUPABASE_UPSERT", default.supabase_upsert),
            key_strategy: parse_var("OBJECT_KEY_STRATEGY", default.key_strategy)?,
            max_file_size: parse_var("MAX_FILE_SIZE", default.max_file_size)?,
            celebrate: flag_var("CELEBRATE", default.celebrate),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        })
    }

    /// Create config for development (in-memory bucket)
    pub fn development() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            public_base_url: Some("http://localhost:3000/objects".to_string()),
            ..Self::default()
        }
    }

    pub fn require<'a>(
        value: &'a Option<String>,
        name: &'static str,
    ) -> Result<&'a str, ConfigError> {
        value.as_deref().ok_or(ConfigError::Missing(name))
    }
}
