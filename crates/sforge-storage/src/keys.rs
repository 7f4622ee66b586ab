//! Object key layout.

use crate::error::{StorageError, StorageResult};

/// Prefix for rendered videos. The bucket is private; access is via presigned URLs only.
pub const OUTPUT_PREFIX: &str = "private/outputs";

/// Key for a rendered file: `private/outputs/<run-id>_<file name>`.
pub fn output_key(run_id: &str, file_name: &str) -> StorageResult<String> {
    let file_name = file_name.trim();
    if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
        return Err(StorageError::InvalidKey(file_name.to_string()));
    }
    if run_id.is_empty() || run_id.contains('/') {
        return Err(StorageError::InvalidKey(run_id.to_string()));
    }
    Ok(format!("{}/{}_{}", OUTPUT_PREFIX, run_id, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_key() {
        assert_eq!(
            output_key("1b4e28ba", "final.mp4").unwrap(),
            "private/outputs/1b4e28ba_final.mp4"
        );
    }

    #[test]
    fn test_rejects_path_components() {
        assert!(output_key("run", "../etc/passwd").is_err());
        assert!(output_key("run", "a/b.mp4").is_err());
        assert!(output_key("", "final.mp4").is_err());
        assert!(output_key("run", "  ").is_err());
    }
}
