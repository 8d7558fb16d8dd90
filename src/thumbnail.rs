//! 履歴表示用サムネイル生成
//!
//! 長辺150px以内に縮小したJPEG（品質70）をData URLで返す。
//! 元画像が既に小さい場合は拡大しない。

use crate::error::{DetectError, Result};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;

pub const THUMBNAIL_MAX_SIZE: u32 = 150;
const THUMBNAIL_JPEG_QUALITY: u8 = 70;

pub fn create_thumbnail(bytes: &[u8]) -> Result<String> {
    let image = image::load_from_memory(bytes)?;

    let image = if image.width() > THUMBNAIL_MAX_SIZE || image.height() > THUMBNAIL_MAX_SIZE {
        image.thumbnail(THUMBNAIL_MAX_SIZE, THUMBNAIL_MAX_SIZE)
    } else {
        image
    };

    // JPEGはアルファ非対応
    let rgb = image.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, THUMBNAIL_JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| DetectError::Thumbnail(e.to_string()))?;

    Ok(to_data_url("image/jpeg", &jpeg))
}

pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
