use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use url::Url;

use crate::services::storage::{ObjectStore, encode_key};

/// Error body returned by the Supabase Storage API.
#[derive(Debug, Deserialize)]
struct StorageApiError {
    message: Option<String>,
    error: Option<String>,
}

/// Supabase Storage over its REST API.
pub struct SupabaseObjectStore {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    bucket: String,
    upsert: bool,
}

impl SupabaseObjectStore {
    pub fn new(base_url: &str, api_key: String, bucket: String, upsert: bool) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| anyhow!("Invalid Supabase URL '{}': {}", base_url, e))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            bucket,
            upsert,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| anyhow!("Invalid storage path '{}': {}", path, e))
    }

    fn object_endpoint(&self, key: &str) -> Result<Url> {
        self.endpoint(&format!(
            "storage/v1/object/{}/{}",
            encode_key(&self.bucket),
            encode_key(key)
        ))
    }

    fn public_endpoint(&self, key: &str) -> Result<Url> {
        self.endpoint(&format!(
            "storage/v1/object/public/{}/{}",
            encode_key(&self.bucket),
            encode_key(key)
        ))
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert("apikey", HeaderValue::from_str(&self.api_key)?);
        Ok(headers)
    }
}

/// Pulls the remote message out of an error response body.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<StorageApiError>(body)
        .ok()
        .and_then(|e| e.message.or(e.error))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        })
}

#[async_trait]
impl ObjectStore for SupabaseObjectStore {
    async fn store(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        let url = self.object_endpoint(key)?;
        let response = self
            .http
            .post(url)
            .headers(self.auth_headers()?)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if self.upsert { "true" } else { "false" })
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            "Supabase upload failed: bucket={}, key={}, status={}",
            self.bucket,
            key,
            status
        );
        Err(anyhow!(error_message(status, &body)))
    }

    async fn public_url(&self, key: &str) -> Result<String> {
        Ok(self.public_endpoint(key)?.to_string())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn health_check(&self) -> bool {
        let Ok(url) = self.endpoint(&format!("storage/v1/bucket/{}", encode_key(&self.bucket)))
        else {
            return false;
        };
        let Ok(headers) = self.auth_headers() else {
            return false;
        };
        match self.http.get(url).headers(headers).send().await {
            Ok(res) => res.status().is_success(),
            Err(_) => false,
        }
    }
}
