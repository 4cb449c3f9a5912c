use async_trait::async_trait;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::source::{is_dicom_key, DicomSource};
use crate::error::IoError;

/// S3-backed implementation of `DicomSource`.
///
/// Reads whole objects from S3 or S3-compatible storage (MinIO, etc.).
/// The key is used as the object key within the bucket.
#[derive(Clone)]
pub struct S3Source {
    client: Client,
    bucket: String,
}

impl S3Source {
    /// Create a new S3Source for the given bucket.
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Get the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl DicomSource for S3Source {
    async fn read(&self, key: &str) -> Result<Bytes, IoError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let is_not_found = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);

                let status_is_404 = e
                    .raw_response()
                    .map(|r| r.status().as_u16() == 404)
                    .unwrap_or(false);

                if is_not_found || status_is_404 {
                    IoError::NotFound(format!("s3://{}/{}", self.bucket, key))
                } else {
                    IoError::S3(e.to_string())
                }
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| IoError::Connection(e.to_string()))?
            .into_bytes();

        debug!(bucket = %self.bucket, key = key, bytes = data.len(), "Read DICOM object");
        Ok(data)
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, IoError> {
        let mut files = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .max_keys(1000);

            if let Some(prefix) = prefix {
                request = request.prefix(prefix);
            }
            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let result = request.send().await.map_err(|e| IoError::S3(e.to_string()))?;

            for obj in result.contents() {
                if let Some(key) = obj.key() {
                    if is_dicom_key(key) {
                        files.push(key.to_string());
                    }
                }
            }

            if result.is_truncated() == Some(true) {
                continuation_token = result.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        files.sort();
        Ok(files)
    }

    fn identifier(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services usually need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
