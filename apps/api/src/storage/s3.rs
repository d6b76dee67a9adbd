use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use super::{record_key, DocumentSource, FetchedDocument, RecordSink, StorageError};
use crate::config::Config;
use crate::models::{CvRecord, DocumentKind};

/// Source documents and extracted records in one bucket. A file id is the
/// source object's key.
#[derive(Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    output_prefix: String,
}

impl S3Storage {
    /// Client configured for MinIO (local) or AWS (production).
    pub async fn connect(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "cv-etl-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.s3_bucket.clone(),
            output_prefix: config.s3_output_prefix.clone(),
        }
    }
}

#[async_trait]
impl DocumentSource for S3Storage {
    async fn fetch(&self, file_id: &str) -> Result<FetchedDocument, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(file_id)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::NotFound(file_id.to_string())
                } else {
                    StorageError::Backend(service_error.to_string())
                }
            })?;

        let file_name = file_id.rsplit('/').next().unwrap_or(file_id).to_string();
        let kind = DocumentKind::detect(&file_name, response.content_type())
            .ok_or_else(|| StorageError::Unsupported(file_name.clone()))?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(FetchedDocument {
            file_id: file_id.to_string(),
            file_name,
            kind,
            bytes,
        })
    }
}

#[async_trait]
impl RecordSink for S3Storage {
    async fn persist(&self, record: &CvRecord) -> Result<String, StorageError> {
        let key = record_key(&self.output_prefix, &record.metadata.source_file_id);
        let body = serde_json::to_vec_pretty(record)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        info!(bucket = %self.bucket, key = %key, "Record persisted");
        Ok(key)
    }
}
