use deepfake_detect_common::{AnalysisStatus, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像検証エラー: {0}")]
    Validation(#[from] ValidationError),

    #[error("解析中のため新しい画像を受け付けられません")]
    Busy,

    #[error("モデルが選択されていません。`--model xception` などで指定してください")]
    NoModelSelected,

    #[error("状態遷移エラー: {from} -> {to}")]
    InvalidTransition {
        from: AnalysisStatus,
        to: AnalysisStatus,
    },

    #[error("解析がキャンセルされました")]
    Cancelled,

    #[error("推論エンドポイント呼び出しエラー: {0}")]
    Detector(String),

    #[error("推論レスポンスのパースに失敗: {0}")]
    DetectorParse(String),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("画像読み込みエラー: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("サムネイル生成エラー: {0}")]
    Thumbnail(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl From<deepfake_detect_common::Error> for DetectError {
    fn from(err: deepfake_detect_common::Error) -> Self {
        use deepfake_detect_common::Error as CommonError;

        match err {
            CommonError::Validation(e) => DetectError::Validation(e),
            CommonError::InvalidTransition { from, to } => {
                DetectError::InvalidTransition { from, to }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
