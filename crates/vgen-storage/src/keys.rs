//! Object key rules and public URL construction.

use crate::error::{StorageError, StorageResult};

/// Reject keys that would escape their owner prefix or address the bucket root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.ends_with('/') {
        return Err(StorageError::invalid_key(key));
    }
    if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(StorageError::invalid_key(key));
    }
    Ok(())
}

/// Public URL of `key` under the bucket's public base URL.
///
/// Each path segment is percent-encoded; the separators are kept.
pub fn public_url_for(base_url: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect();
    format!("{}/{}", base_url.trim_end_matches('/'), encoded.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("user-1/job-1.mp4").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/user-1/job-1.mp4").is_err());
        assert!(validate_key("user-1/../job-1.mp4").is_err());
        assert!(validate_key("user-1//job-1.mp4").is_err());
        assert!(validate_key("user-1/").is_err());
    }

    #[test]
    fn test_public_url_for() {
        assert_eq!(
            public_url_for("https://videos.example.com/", "user-1/job-1.mp4"),
            "https://videos.example.com/user-1/job-1.mp4"
        );
        assert_eq!(
            public_url_for("https://videos.example.com", "user 1/job-1.mp4"),
            "https://videos.example.com/user%201/job-1.mp4"
        );
    }
}
