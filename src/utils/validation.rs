use anyhow::{Result, anyhow};

/// Maximum file size: 50 MB
pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        }));
    }
    Ok(())
}

/// Validates that a selection carries a usable name
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "File name must not be empty".to_string(),
        }));
    }
    Ok(())
}

/// Picks the MIME type for a selection.
///
/// A parseable declared type is used as-is (parameters dropped). Otherwise the
/// magic bytes decide, falling back to `application/octet-stream`.
pub fn resolve_content_type(declared: Option<&str>, data: &[u8]) -> mime::Mime {
    let declared = declared
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<mime::Mime>().ok())
        .map(|m| m.essence_str().parse::<mime::Mime>().unwrap_or(m));

    if let Some(m) = declared {
        return m;
    }

    infer::get(data)
        .and_then(|kind| kind.mime_type().parse().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, MAX_FILE_SIZE).is_ok());
        assert!(validate_file_size(MAX_FILE_SIZE, MAX_FILE_SIZE).is_ok());
        assert!(validate_file_size(MAX_FILE_SIZE + 1, MAX_FILE_SIZE).is_err());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("report.pdf").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("   ").is_err());
    }

    #[test]
    fn test_resolve_declared_type() {
        assert_eq!(
            resolve_content_type(Some("image/jpeg"), b"not really a jpeg"),
            mime::IMAGE_JPEG
        );
        assert_eq!(
            resolve_content_type(Some("text/plain; charset=utf-8"), b"hi"),
            mime::TEXT_PLAIN
        );
    }

    #[test]
    fn test_resolve_falls_back_to_magic_bytes() {
        let gif = b"GIF89a\x01\x00\x01\x00";
        assert_eq!(resolve_content_type(None, gif), mime::IMAGE_GIF);
        assert_eq!(resolve_content_type(Some("not a mime"), gif), mime::IMAGE_GIF);
        assert_eq!(resolve_content_type(Some(""), gif), mime::IMAGE_GIF);
    }

    #[test]
    fn test_resolve_unknown_bytes() {
        assert_eq!(
            resolve_content_type(None, b"hello world, just text"),
            mime::APPLICATION_OCTET_STREAM
        );
    }
}
