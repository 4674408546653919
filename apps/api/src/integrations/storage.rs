//! Audio bucket. Synthesized MP3s are uploaded here and served by URL.

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use super::IntegrationError;

#[async_trait]
pub trait AudioStorage: Send + Sync {
    /// Stores `audio` under `key` and returns a URL a browser can play.
    async fn put_audio(&self, key: &str, audio: Bytes) -> Result<String, IntegrationError>;
}

/// Connection settings for an S3-compatible bucket (AWS, MinIO, Supabase Storage).
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub public_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

pub struct S3AudioStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
}

impl S3AudioStorage {
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "course-audio-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&settings.endpoint)
            .load()
            .await;

        info!(bucket = %settings.bucket, "S3 audio storage initialized");

        Self {
            client: aws_sdk_s3::Client::new(&s3_config),
            bucket: settings.bucket.clone(),
            public_url: settings.public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AudioStorage for S3AudioStorage {
    async fn put_audio(&self, key: &str, audio: Bytes) -> Result<String, IntegrationError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("audio/mpeg")
            .body(ByteStream::from(audio))
            .send()
            .await
            .map_err(|e| IntegrationError::Storage(format!("upload of {key} failed: {e}")))?;

        Ok(public_object_url(&self.public_url, &self.bucket, key))
    }
}

pub fn public_object_url(public_url: &str, bucket: &str, key: &str) -> String {
    format!("{public_url}/{bucket}/{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_object_url() {
        assert_eq!(
            public_object_url("https://cdn.example.com", "course-audio", "c1/short_podcast.mp3"),
            "https://cdn.example.com/course-audio/c1/short_podcast.mp3"
        );
    }
}
