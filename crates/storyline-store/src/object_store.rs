//! Object storage abstraction
//!
//! Story media and audio live in a public bucket on the platform. The
//! service only needs to upload bytes without overwriting and to learn the
//! public URL of what it uploaded: `{public_base_url}/{bucket}/{path}`.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Metadata of an uploaded object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub size: u64,
    pub public_url: String,
}

/// Bucket storage on the platform
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `data` to `path` in `bucket`
    ///
    /// Never overwrites: an existing object at `path` is an error.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StoreResult<StoredObject>;
}

/// Public URL of `path` in `bucket`
pub fn public_object_url(public_base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/{}/{}",
        public_base_url.trim_end_matches('/'),
        bucket,
        path.trim_start_matches('/')
    )
}
