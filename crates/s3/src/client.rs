//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from sup-core.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

use sup_core::{
    EndpointConfig, Error, ListResult, Metadata, ObjectInfo, ObjectStat, ObjectStore, Result,
};

/// Region that must not be sent as a bucket location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    region: String,
}

impl S3Client {
    /// Create a new S3 client for an endpoint
    pub async fn new(endpoint: EndpointConfig) -> Result<Self> {
        endpoint.validate()?;

        // Build credentials provider
        let credentials = aws_credential_types::Credentials::new(
            endpoint.access_key.clone(),
            endpoint.secret_key.clone(),
            None, // session token
            None, // expiry
            "sup-static-credentials",
        );

        // Build SDK config
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(endpoint.region.clone()))
            .endpoint_url(&endpoint.url)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(endpoint.force_path_style())
            .build();

        tracing::debug!(endpoint = %endpoint.url, region = %endpoint.region, "created S3 client");

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            region: endpoint.region,
        })
    }
}

/// Map an SDK error message to a core error
///
/// `subject` names the bucket or object for not-found errors.
fn classify_error(message: String, subject: &str) -> Error {
    if message.contains("NotFound") || message.contains("NoSuchKey") || message.contains("NoSuchBucket")
    {
        Error::NotFound(subject.to_string())
    } else if message.contains("AccessDenied")
        || message.contains("InvalidAccessKeyId")
        || message.contains("SignatureDoesNotMatch")
    {
        Error::Auth(message)
    } else if message.contains("BucketAlreadyExists") || message.contains("BucketAlreadyOwnedByYou")
    {
        Error::Conflict(format!("Bucket already exists: {subject}"))
    } else {
        Error::Network(message)
    }
}

fn sdk_error<E>(err: E, subject: &str) -> Error
where
    E: std::error::Error,
{
    classify_error(DisplayErrorContext(&err).to_string(), subject)
}

/// Convert an SDK timestamp, keeping sub-second precision
fn to_timestamp(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(dt.secs(), dt.subsec_nanos() as i32).ok()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: tokio::fs::File,
        content_type: Option<String>,
        metadata: &Metadata,
    ) -> Result<()> {
        let length = body.metadata().await?.len();
        let stream = ByteStream::read_from()
            .file(body)
            .build()
            .await
            .map_err(|e| Error::General(format!("Failed to read upload body: {e}")))?;

        let mut request = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(length as i64)
            .body(stream);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        if !metadata.is_empty() {
            request = request.set_metadata(Some(metadata.clone()));
        }

        request
            .send()
            .await
            .map_err(|e| sdk_error(e, &format!("{bucket}/{key}")))?;

        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectStat> {
        let response = self
            .inner
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(e, &format!("{bucket}/{key}")))?;

        Ok(ObjectStat {
            key: key.to_string(),
            size: response.content_length().unwrap_or(0).max(0) as u64,
            last_modified: response.last_modified().and_then(to_timestamp),
            metadata: response.metadata().cloned().unwrap_or_default(),
        })
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match sdk_error(e, bucket) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.inner.create_bucket().bucket(bucket);

        if self.region != DEFAULT_REGION {
            let constraint = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build();
            request = request.create_bucket_configuration(constraint);
        }

        request.send().await.map_err(|e| sdk_error(e, bucket))?;

        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| sdk_error(e, "buckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                let mut info = ObjectInfo::bucket(b.name().unwrap_or_default());
                info.last_modified = b.creation_date().and_then(to_timestamp);
                info
            })
            .collect();

        Ok(buckets)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListResult> {
        let mut request = self.inner.list_objects_v2().bucket(bucket).max_keys(1000);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let response = request.send().await.map_err(|e| sdk_error(e, bucket))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let size = object.size().unwrap_or(0).max(0) as u64;
                let mut info = ObjectInfo::file(object.key().unwrap_or_default(), size);
                info.last_modified = object.last_modified().and_then(to_timestamp);
                info
            })
            .collect();

        let continuation_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(|s| s.to_string())
        } else {
            None
        };

        Ok(ListResult {
            items,
            continuation_token,
        })
    }
}
