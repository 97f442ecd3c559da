//! Text inputs that may live on local disk or in S3.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::utils::io;

const S3_SCHEME: &str = "s3://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    S3 { bucket: String, key: String },
}

impl Location {
    /// `s3://bucket/key` becomes an S3 location; anything else is a local path.
    pub fn parse(raw: &str) -> Result<Self> {
        let Some(rest) = raw.strip_prefix(S3_SCHEME) else {
            return Ok(Location::Local(PathBuf::from(raw)));
        };

        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok(Location::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            _ => Err(Error::validation_invalid_argument(
                "location",
                "S3 URIs must look like s3://bucket/key",
                Some(raw.to_string()),
                None,
            )),
        }
    }

    pub fn is_s3(&self) -> bool {
        matches!(self, Location::S3 { .. })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::S3 { bucket, key } => write!(f, "{}{}/{}", S3_SCHEME, bucket, key),
        }
    }
}

/// Reads whole text objects.
pub trait ObjectReader {
    fn read_to_string(&self, location: &Location) -> Result<String>;
}

/// Local files through `std::fs`, S3 objects through the AWS default credential chain.
#[derive(Debug, Default)]
pub struct DefaultReader;

impl ObjectReader for DefaultReader {
    fn read_to_string(&self, location: &Location) -> Result<String> {
        match location {
            Location::Local(path) => {
                let content = io::read_file(path, &format!("read {}", path.display()))?;
                log::debug!("Read local file: {}", path.display());
                Ok(content)
            }
            Location::S3 { bucket, key } => {
                let content = read_s3_object(bucket, key)
                    .map_err(|e| Error::remote_read_failed(location.to_string(), e))?;
                log::debug!("Read from S3: {}", location);
                Ok(content)
            }
        }
    }
}

fn read_s3_object(bucket: &str, key: &str) -> std::result::Result<String, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| e.to_string())?;

    runtime.block_on(async {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = aws_sdk_s3::Client::new(&config);

        let object = client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| aws_sdk_s3::error::DisplayErrorContext(e).to_string())?;
        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| e.to_string())?
            .into_bytes();

        String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
    })
}
