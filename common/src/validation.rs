//! アップロード画像の検証

use crate::error::ValidationError;

/// 受け付ける最大ファイルサイズ（5MB）
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// MIMEタイプとサイズを検証
///
/// MIMEタイプが "image/" で始まらない、または5MBを超える場合はエラー。
pub fn validate_upload(mime_type: &str, size: u64) -> Result<(), ValidationError> {
    if !mime_type.starts_with("image/") {
        return Err(ValidationError::NotAnImage(mime_type.to_string()));
    }

    if size > MAX_FILE_SIZE {
        return Err(ValidationError::TooLarge {
            size,
            max: MAX_FILE_SIZE,
        });
    }

    Ok(())
}

/// "image/jpeg" → "JPEG"
pub fn format_label(mime_type: &str) -> String {
    mime_type
        .split('/')
        .nth(1)
        .map(|s| s.split(';').next().unwrap_or(s))
        .unwrap_or(mime_type)
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_image_within_limit() {
        assert!(validate_upload("image/jpeg", 2 * 1024 * 1024).is_ok());
        assert!(validate_upload("image/png", MAX_FILE_SIZE).is_ok());
    }

    #[test]
    fn test_rejects_non_image() {
        for mime in ["text/plain", "application/pdf", "video/mp4", ""] {
            let err = validate_upload(mime, 10).unwrap_err();
            assert!(matches!(err, ValidationError::NotAnImage(_)), "{}", mime);
        }
    }

    #[test]
    fn test_rejects_oversize_regardless_of_type() {
        let err = validate_upload("image/png", MAX_FILE_SIZE + 1).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
        assert!(validate_upload("application/zip", MAX_FILE_SIZE + 1).is_err());
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label("image/jpeg"), "JPEG");
        assert_eq!(format_label("image/webp"), "WEBP");
        assert_eq!(format_label("image/svg+xml; charset=utf-8"), "SVG+XML");
    }
}
