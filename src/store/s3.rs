//! S3-compatible store backend.

use async_trait::async_trait;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client;

use super::body::read_body;
use super::{error_chain, ObjectStore, StoreError, StoredObject};
use crate::config::S3Settings;

/// Store backed by a single bucket
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Build a client for the bucket from static credentials.
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "bundle-shim",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()))
            .endpoint_url(&settings.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;

        // Custom endpoints (R2, MinIO, LocalStack) require path-style
        // addressing (endpoint/bucket/key) instead of bucket.endpoint/key.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: settings.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_keys(&self, prefix: &str, max_keys: usize) -> Result<Vec<String>, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(i32::try_from(max_keys).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| StoreError::S3 {
                operation: "ListObjectsV2",
                key: prefix.to_string(),
                message: error_chain(&e),
            })?;

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(ToString::to_string))
            .collect())
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(GetObjectError::is_no_such_key) {
                    StoreError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    StoreError::S3 {
                        operation: "GetObject",
                        key: key.to_string(),
                        message: error_chain(&e),
                    }
                }
            })?;

        let content_type = output.content_type().map(ToString::to_string);
        let etag = output.e_tag().map(ToString::to_string);
        let body = read_body(output.body)
            .await
            .map_err(|e| StoreError::Body {
                key: key.to_string(),
                message: error_chain(&e),
            })?;

        Ok(StoredObject {
            content_type,
            etag,
            body: Some(body),
        })
    }

    fn backend(&self) -> &'static str {
        "s3"
    }
}
