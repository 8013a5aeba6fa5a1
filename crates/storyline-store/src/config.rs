//! Configuration for the platform-backed story service

use serde::{Deserialize, Serialize};

/// Settings for talking to the hosted platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Storage bucket story media and audio are uploaded to
    pub bucket: String,
    /// Base URL public object URLs are built from
    pub public_base_url: String,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            bucket: "post-images".to_string(),
            public_base_url: "https://storage.local/object/public".to_string(),
            max_upload_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

impl PlatformConfig {
    /// Set the bucket name
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Set the public base URL
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    /// Set the upload size limit
    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_setters() {
        let config = PlatformConfig::default()
            .with_bucket("stories")
            .with_public_base_url("https://cdn.example")
            .with_max_upload_bytes(1024);
        assert_eq!(config.bucket, "stories");
        assert_eq!(config.public_base_url, "https://cdn.example");
        assert_eq!(config.max_upload_bytes, 1024);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: PlatformConfig = serde_json::from_str(r#"{"max_upload_bytes": 10}"#).unwrap();
        assert_eq!(config.max_upload_bytes, 10);
        assert_eq!(config.bucket, "post-images");
    }
}
