//! 解析結果の型定義
//!
//! CLIと他のフロントエンドで共有される型:
//! - AnalysisResult: 1回の判定結果（生成後は不変）
//! - HistoryItem: 履歴に保存される判定結果のラッパー
//!
//! JSONのフィールド名は既存の履歴データと互換のcamelCase

use crate::catalog::{ModelMetrics, ModelType};
use serde::{Deserialize, Serialize};

/// 操作の痕跡があるとモデルが判断した矩形領域
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlaggedRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
}

/// 画像サイズ（px）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// 画像メタデータ
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    /// "JPEG" / "PNG" など（MIMEサブタイプの大文字）
    pub format: String,
    pub dimensions: Dimensions,
    /// "512 bytes" / "1.5 KB" / "2.0 MB"
    pub file_size: String,
}

/// 判定結果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub is_deepfake: bool,

    /// 判定ラベルに対する確信度 [0, 1]
    pub confidence_score: f64,

    /// 判定に要した時間（秒）
    pub detection_time: f64,

    /// ISO 8601
    pub detection_date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub areas: Option<Vec<FlaggedRegion>>,

    pub metadata: ImageMetadata,

    pub metrics: ModelMetrics,
}

impl AnalysisResult {
    /// 確信度の百分率（四捨五入）
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence_score.clamp(0.0, 1.0) * 100.0).round() as u32
    }

    /// 履歴一覧の区分
    pub fn verdict(&self) -> Verdict {
        Verdict::of(self)
    }

    /// 結果詳細の区分
    pub fn likelihood(&self) -> Likelihood {
        Likelihood::of(self)
    }

    pub fn flagged_regions(&self) -> &[FlaggedRegion] {
        self.areas.as_deref().unwrap_or(&[])
    }
}

/// 表示用の判定区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Deepfake,
    Authentic,
    Uncertain,
}

impl Verdict {
    /// 本物判定でもこれ以下の確信度は「不確実」扱い
    pub const AUTHENTIC_THRESHOLD_PERCENT: u32 = 85;

    pub fn of(result: &AnalysisResult) -> Self {
        if result.is_deepfake {
            Verdict::Deepfake
        } else if result.confidence_percent() > Self::AUTHENTIC_THRESHOLD_PERCENT {
            Verdict::Authentic
        } else {
            Verdict::Uncertain
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Deepfake => "Deepfake",
            Verdict::Authentic => "Authentic",
            Verdict::Uncertain => "Uncertain",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 詳細表示用の判定区分（確信度が過半かどうかで分ける）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Likelihood {
    LikelyDeepfake,
    LikelyReal,
    Uncertain,
}

impl Likelihood {
    pub const MAJORITY_PERCENT: u32 = 50;

    pub fn of(result: &AnalysisResult) -> Self {
        if result.confidence_percent() <= Self::MAJORITY_PERCENT {
            Likelihood::Uncertain
        } else if result.is_deepfake {
            Likelihood::LikelyDeepfake
        } else {
            Likelihood::LikelyReal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Likelihood::LikelyDeepfake => "Likely DeepFake",
            Likelihood::LikelyReal => "Likely Real",
            Likelihood::Uncertain => "Uncertain",
        }
    }
}

impl std::fmt::Display for Likelihood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 履歴エントリ（成功した解析ごとに1件、変更されない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub image_url: String,
    /// data:image/jpeg;base64,...
    pub thumbnail_url: String,
    pub timestamp: String,
    pub result: AnalysisResult,
    pub model_used: ModelType,
}

/// バイト数を表示用文字列に変換
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} bytes", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
