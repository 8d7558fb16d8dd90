//! 判定エンドポイント連携
//!
//! - Detector: 画像とモデルを受け取りラベルと確信度分布を返す外部サービス
//! - CancelToken: リセット時に進行中の呼び出しを打ち切るためのシグナル
//! - build_result: 予測結果から AnalysisResult を組み立てる

mod gradio;

pub use gradio::{parse_event_stream, GradioDetector};

use crate::error::{DetectError, Result};
use crate::media::ImageFile;
use deepfake_detect_common::{AnalysisResult, FlaggedRegion, ImageMetadata, ModelType};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// 偽物判定を示すラベル
pub const FAKE_LABEL: &str = "Fake";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfidence {
    pub label: String,
    pub confidence: f64,
}

/// エンドポイントの予測結果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    #[serde(default)]
    pub confidences: Vec<LabelConfidence>,
    /// エンドポイントが領域を返した場合のみ
    #[serde(default)]
    pub regions: Vec<FlaggedRegion>,
}

impl Prediction {
    pub fn is_fake(&self) -> bool {
        self.label == FAKE_LABEL
    }

    /// 予測ラベルの確信度（見つからなければ0）
    pub fn confidence_of_label(&self) -> f64 {
        self.confidences
            .iter()
            .find(|c| c.label == self.label)
            .map(|c| c.confidence)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
    }
}

/// 判定サービス
pub trait Detector {
    fn detect(
        &self,
        image: &ImageFile,
        model: ModelType,
        cancel: CancelToken,
    ) -> impl Future<Output = Result<Prediction>> + Send;
}

/// キャンセル通知の送信側（複製してCtrl-Cハンドラなどへ渡せる）
#[derive(Debug, Clone)]
pub struct CancelSource {
    tx: Arc<watch::Sender<bool>>,
}

/// キャンセル通知の受信側
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// キャンセル状態を解除して次の解析に備える
    pub fn rearm(&self) {
        self.tx.send_replace(false);
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// キャンセルされない（テストや単発呼び出し用）
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // 送信側を残さなければ changed() はエラーで返る → pending 扱い
        drop(tx);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// キャンセルされるまで待つ
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// future をキャンセルと競合させる
    pub async fn run<F, T>(&mut self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(DetectError::Cancelled),
            res = fut => res,
        }
    }
}

/// 予測結果から判定結果を組み立てる
pub fn build_result(
    prediction: &Prediction,
    image: &ImageFile,
    model: ModelType,
    detection_time: f64,
) -> Result<AnalysisResult> {
    let dimensions = image.dimensions()?;
    let is_deepfake = prediction.is_fake();

    // 本物判定の場合は領域を持たない
    let areas = if is_deepfake {
        Some(prediction.regions.clone())
    } else {
        Some(Vec::new())
    };

    Ok(AnalysisResult {
        is_deepfake,
        confidence_score: prediction.confidence_of_label(),
        detection_time,
        detection_date: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        areas,
        metadata: ImageMetadata {
            format: image.format_label(),
            dimensions,
            file_size: image.file_size_label(),
        },
        metrics: model.metrics(),
    })
}
