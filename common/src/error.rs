//! エラー型定義

use crate::status::AnalysisStatus;
use thiserror::Error;

/// ワークフロー規則の違反
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: AnalysisStatus,
        to: AnalysisStatus,
    },
}

/// 画像選択時の検証エラー（状態は遷移しない）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please upload an image file (JPEG, PNG, etc.), got '{0}'")]
    NotAnImage(String),

    #[error("Image size must be less than 5MB ({size} bytes > {max} bytes)")]
    TooLarge { size: u64, max: u64 },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
