//! 選択された画像ファイルの読み込み
//!
//! MIMEタイプは中身のシグネチャから判定し、判定できなければ拡張子で補う。

use crate::error::{DetectError, Result};
use deepfake_detect_common::{format_file_size, format_label, Dimensions};
use std::io::Cursor;
use std::path::{Path, PathBuf};

const EXTENSION_MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("txt", "text/plain"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
];

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// 選択された画像（メモリ上に保持）
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DetectError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = detect_mime_type(path, &bytes);
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        Ok(Self::from_bytes(path, file_name, mime_type, bytes))
    }

    pub fn from_bytes(
        path: PathBuf,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            path,
            file_name,
            mime_type,
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// 画像をデコードせずにサイズだけ取得
    pub fn dimensions(&self) -> Result<Dimensions> {
        let (width, height) = image::ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(Dimensions { width, height })
    }

    pub fn format_label(&self) -> String {
        format_label(&self.mime_type)
    }

    pub fn file_size_label(&self) -> String {
        format_file_size(self.size)
    }

    /// 履歴に残す元画像の参照
    pub fn url(&self) -> String {
        self.path.display().to_string()
    }
}

pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }

    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .and_then(|ext| {
            EXTENSION_MIME_TYPES
                .iter()
                .find(|(e, _)| *e == ext)
                .map(|(_, mime)| mime.to_string())
        })
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}
