pub use aws_sdk_s3::Error;
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};

use crate::{
    config,
    content::{ContentError, ContentInfo, ContentStore},
};

/// Content store backed by an S3-compatible bucket.
///
/// Objects are keyed by their content hash, so the bucket never holds
/// two copies of the same payload.
pub struct S3ContentStore {
    bucket: String,
    max_file_size: usize,
    client: Client,
}

impl S3ContentStore {
    /// Create new [`S3ContentStore`] from the provided [`S3Storage`] configuration.
    ///
    /// [`S3Storage`]: config::S3Storage
    pub async fn new(config: &config::S3Storage, max_file_size: usize) -> S3ContentStore {
        let sdk_config = aws_config::from_env()
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                &config.access_key_id,
                &config.secret_access_key,
                None,
                None,
                "s3-client",
            ))
            .load()
            .await;

        S3ContentStore {
            bucket: config.bucket.clone(),
            max_file_size,
            client: Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl ContentStore for S3ContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentInfo, ContentError> {
        if data.len() > self.max_file_size {
            return Err(ContentError::TooLarge {
                size: data.len(),
                limit: self.max_file_size,
            });
        }

        let info = ContentInfo::describe(data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&info.hash)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(Error::from)?;

        Ok(info)
    }

    async fn get(&self, hash: &str) -> Result<Vec<u8>, ContentError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(hash)
            .send()
            .await
            .map_err(Error::from)
        {
            Ok(output) => output,
            Err(Error::NoSuchKey(_)) => return Err(ContentError::NotFound(hash.to_string())),
            Err(err) => return Err(err.into()),
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| ContentError::IoError(std::io::Error::new(std::io::ErrorKind::Other, err)))?;

        Ok(bytes.into_bytes().to_vec())
    }
}
