use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left unescaped in object keys when building public URLs.
/// `/` stays so nested keys keep their path shape.
pub const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// The two capabilities the upload widget needs from a bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `data` under `key`. A second store under the same key replaces
    /// the first object.
    async fn store(&self, key: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Resolves the public URL of a previously stored object.
    async fn public_url(&self, key: &str) -> Result<String>;

    fn bucket(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;
}

pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ENCODE_SET).to_string()
}

/// Prefers the remote error message over the SDK's generic display.
fn remote_message<E>(err: &E) -> String
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match err.message() {
        Some(msg) if !msg.is_empty() => msg.to_string(),
        _ => match err.code() {
            Some(code) => code.to_string(),
            None => DisplayErrorContext(err).to_string(),
        },
    }
}

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, encode_key(key))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn store(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    "S3 put_object failed: bucket={}, key={}, error={}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                );
                anyhow!(remote_message(&e))
            })?;
        Ok(())
    }

    async fn public_url(&self, key: &str) -> Result<String> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(self.object_url(key)),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Err(anyhow!("not found"))
                } else {
                    Err(anyhow!(remote_message(&service_error)))
                }
            }
        }
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn health_check(&self) -> bool {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
    }
}
