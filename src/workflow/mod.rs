//! 解析ワークフロー
//!
//! 画像選択 → 進捗シミュレーション（3段階）→ リモート判定 → 履歴保存
//!
//! 状態は `AnalysisStatus` の1値で管理し、遷移はすべて
//! `AnalysisStatus::transition` を通す。進行中の判定呼び出しには
//! `CancelToken` を渡し、リセット後に古い応答が状態を書き換えることはない。

mod progress;

pub use progress::run_phase;

use crate::detector::{build_result, CancelSource, CancelToken, Detector};
use crate::error::{DetectError, Result};
use crate::history::{HistoryLog, KeyValueStore};
use crate::media::ImageFile;
use crate::thumbnail::create_thumbnail;
use deepfake_detect_common::{
    default_phases, validate_upload, AnalysisResult, AnalysisStatus, HistoryItem, ModelType,
    PhaseSpec, ProcessingStage,
};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// 購読者へ通知する状態
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorkflowSnapshot {
    pub status: AnalysisStatus,
    pub stage: Option<ProcessingStage>,
    pub progress: f32,
}

pub struct AnalysisWorkflow<D, S> {
    detector: D,
    history: HistoryLog<S>,
    phases: [PhaseSpec; 3],
    status: AnalysisStatus,
    selected_model: Option<ModelType>,
    selected_image: Option<ImageFile>,
    image_url: Option<String>,
    result: Option<AnalysisResult>,
    last_error: Option<String>,
    cancel: CancelSource,
    snapshot_tx: watch::Sender<WorkflowSnapshot>,
}

impl<D: Detector, S: KeyValueStore> AnalysisWorkflow<D, S> {
    pub fn new(detector: D, history: HistoryLog<S>) -> Self {
        let (snapshot_tx, _rx) = watch::channel(WorkflowSnapshot::default());

        Self {
            detector,
            history,
            phases: default_phases(),
            status: AnalysisStatus::Idle,
            selected_model: None,
            selected_image: None,
            image_url: None,
            result: None,
            last_error: None,
            cancel: CancelSource::new(),
            snapshot_tx,
        }
    }

    // =============================================
    // 参照
    // =============================================

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn progress(&self) -> f32 {
        self.snapshot_tx.borrow().progress
    }

    pub fn stage(&self) -> Option<ProcessingStage> {
        self.snapshot_tx.borrow().stage
    }

    pub fn selected_model(&self) -> Option<ModelType> {
        self.selected_model
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn history(&self) -> Vec<HistoryItem> {
        self.history.items()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// 現在の解析を外部（Ctrl-Cなど）から打ち切るためのハンドル
    ///
    /// ワークフローの生存期間中は同じものを指すので、画像選択の前に取得してもよい。
    pub fn cancel_handle(&self) -> CancelSource {
        self.cancel.clone()
    }

    // =============================================
    // 状態遷移
    // =============================================

    fn set_status(&mut self, next: AnalysisStatus) -> Result<()> {
        self.status = self.status.transition(next)?;
        debug!(status = %self.status, "状態遷移");
        self.snapshot_tx.send_modify(|s| s.status = next);
        Ok(())
    }

    fn set_stage(&mut self, stage: Option<ProcessingStage>) {
        self.snapshot_tx.send_modify(|s| {
            s.stage = stage;
            s.progress = 0.0;
        });
    }

    pub fn select_model(&mut self, model: ModelType) -> Result<()> {
        if self.status.is_in_flight() {
            return Err(DetectError::Busy);
        }
        info!(model = %model, "モデル選択");
        self.selected_model = Some(model);
        Ok(())
    }

    /// 画像を選択して解析を開始できる状態（uploading）にする
    ///
    /// 検証に失敗した場合は状態を変えずにエラーを返す。
    pub fn select_image(&mut self, file: ImageFile) -> Result<()> {
        if self.status.is_in_flight() {
            return Err(DetectError::Busy);
        }
        if self.selected_model.is_none() {
            return Err(DetectError::NoModelSelected);
        }
        validate_upload(&file.mime_type, file.size)?;

        self.set_status(AnalysisStatus::Uploading)?;
        info!(file = %file.file_name, size = file.size, "画像選択");

        // 前回のリセットで立ったキャンセルを下ろす（ハンドルは使い回す）
        self.cancel.rearm();
        self.image_url = Some(file.url());
        self.selected_image = Some(file);
        self.result = None;
        self.last_error = None;
        self.set_stage(Some(ProcessingStage::Uploading));
        Ok(())
    }

    /// 進捗シミュレーションを実行し、完了後に判定を行う
    pub async fn run(&mut self) -> Result<&AnalysisResult> {
        if self.status != AnalysisStatus::Uploading {
            return Err(DetectError::InvalidTransition {
                from: self.status,
                to: AnalysisStatus::Processing,
            });
        }

        let mut cancel = self.cancel.token();
        for spec in self.phases {
            if spec.stage.status() != self.status {
                self.set_status(spec.stage.status())?;
            }
            self.set_stage(Some(spec.stage));
            debug!(stage = ?spec.stage, "段階開始");

            let tx = &self.snapshot_tx;
            let phase = run_phase(&spec, |p| tx.send_modify(|s| s.progress = p));
            let finished = cancel
                .run(async {
                    phase.await;
                    Ok(())
                })
                .await;

            if let Err(e) = finished {
                info!("進捗シミュレーション中にキャンセル");
                self.reset();
                return Err(e);
            }
        }

        self.complete_analysis().await
    }

    /// 判定を呼び出し、結果を履歴に保存して complete にする
    ///
    /// 失敗時は error に遷移し履歴は変更しない。
    pub async fn complete_analysis(&mut self) -> Result<&AnalysisResult> {
        if self.status != AnalysisStatus::Processing {
            return Err(DetectError::InvalidTransition {
                from: self.status,
                to: AnalysisStatus::Complete,
            });
        }

        let (Some(image), Some(model)) = (self.selected_image.as_ref(), self.selected_model) else {
            error!("画像またはモデルが未選択のまま判定に到達");
            self.fail("画像またはモデルが未選択です".into())?;
            return Err(DetectError::NoModelSelected);
        };

        let outcome = analyze(&self.detector, image, model, self.cancel.token()).await;

        match outcome {
            Ok(item) => {
                self.history.add(item.clone());
                self.set_status(AnalysisStatus::Complete)?;
                info!(id = %item.id, "解析完了");
                Ok(&*self.result.insert(item.result))
            }
            Err(DetectError::Cancelled) => {
                info!("判定呼び出しをキャンセル");
                self.reset();
                Err(DetectError::Cancelled)
            }
            Err(e) => {
                warn!("解析失敗: {}", e);
                self.fail(e.to_string())?;
                Err(e)
            }
        }
    }

    fn fail(&mut self, message: String) -> Result<()> {
        self.last_error = Some(message);
        self.set_status(AnalysisStatus::Error)
    }

    /// 初期状態へ戻す（進行中の判定呼び出しも打ち切る）
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.selected_image = None;
        self.image_url = None;
        self.result = None;
        self.selected_model = None;
        self.last_error = None;
        match self.status.transition(AnalysisStatus::Idle) {
            Ok(next) => self.status = next,
            Err(e) => error!("リセットできません: {}", e),
        }
        self.snapshot_tx.send_replace(WorkflowSnapshot::default());
        debug!("リセット");
    }

    /// 履歴の結果を再表示する（判定は呼び出さない）
    pub fn view_history_item(&mut self, item: &HistoryItem) -> Result<()> {
        if self.status.is_in_flight() {
            return Err(DetectError::Busy);
        }
        self.set_status(AnalysisStatus::Complete)?;
        self.selected_image = None;
        self.image_url = Some(item.image_url.clone());
        self.result = Some(item.result.clone());
        self.selected_model = Some(item.model_used);
        self.last_error = None;
        self.set_stage(None);
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("履歴を削除");
    }
}

/// 判定呼び出しから履歴エントリ作成まで
async fn analyze<D: Detector>(
    detector: &D,
    image: &ImageFile,
    model: ModelType,
    mut cancel: CancelToken,
) -> Result<HistoryItem> {
    let started = Instant::now();
    let token = cancel.clone();
    let prediction = cancel.run(detector.detect(image, model, token)).await?;
    let detection_time = started.elapsed().as_secs_f64();

    let result = build_result(&prediction, image, model, detection_time)?;
    let thumbnail_url = create_thumbnail(&image.bytes)?;

    Ok(HistoryItem {
        id: uuid::Uuid::new_v4().to_string(),
        image_url: image.url(),
        thumbnail_url,
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        result,
        model_used: model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Prediction;
    use crate::history::MemoryStore;
    use std::path::PathBuf;

    struct UnreachableDetector;

    impl Detector for UnreachableDetector {
        async fn detect(
            &self,
            _image: &ImageFile,
            _model: ModelType,
            _cancel: CancelToken,
        ) -> Result<Prediction> {
            Err(DetectError::Detector("should not be called".into()))
        }
    }

    fn workflow() -> AnalysisWorkflow<UnreachableDetector, MemoryStore> {
        AnalysisWorkflow::new(UnreachableDetector, HistoryLog::new(MemoryStore::new()))
    }

    fn file(mime: &str, size: usize) -> ImageFile {
        ImageFile::from_bytes(
            PathBuf::from("/tmp/input"),
            "input".into(),
            mime.into(),
            vec![0u8; size],
        )
    }

    #[test]
    fn test_select_image_requires_model() {
        let mut wf = workflow();
        let err = wf.select_image(file("image/png", 10)).unwrap_err();
        assert!(matches!(err, DetectError::NoModelSelected));
        assert_eq!(wf.status(), AnalysisStatus::Idle);
    }

    #[test]
    fn test_select_non_image_stays_idle() {
        let mut wf = workflow();
        wf.select_model(ModelType::Xception).unwrap();
        let err = wf.select_image(file("text/plain", 10)).unwrap_err();
        assert!(matches!(err, DetectError::Validation(_)));
        assert_eq!(wf.status(), AnalysisStatus::Idle);
    }

    #[test]
    fn test_select_image_enters_uploading() {
        let mut wf = workflow();
        wf.select_model(ModelType::Xception).unwrap();
        wf.select_image(file("image/png", 10)).unwrap();

        assert_eq!(wf.status(), AnalysisStatus::Uploading);
        assert_eq!(wf.progress(), 0.0);
        assert_eq!(wf.stage(), Some(ProcessingStage::Uploading));
        assert_eq!(wf.image_url(), Some("/tmp/input"));
    }

    #[test]
    fn test_second_selection_while_in_flight_is_busy() {
        let mut wf = workflow();
        wf.select_model(ModelType::Xception).unwrap();
        wf.select_image(file("image/png", 10)).unwrap();

        assert!(matches!(wf.select_image(file("image/png", 10)), Err(DetectError::Busy)));
        assert!(matches!(wf.select_model(ModelType::VisionTransformer), Err(DetectError::Busy)));
        assert_eq!(wf.selected_model(), Some(ModelType::Xception));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut wf = workflow();
        wf.select_model(ModelType::Xception).unwrap();
        wf.select_image(file("image/png", 10)).unwrap();

        let handle = wf.cancel_handle();
        wf.reset();

        assert_eq!(wf.status(), AnalysisStatus::Idle);
        assert_eq!(wf.progress(), 0.0);
        assert!(wf.selected_model().is_none());
        assert!(wf.image_url().is_none());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_cancel_handle_survives_select_image() {
        let mut wf = workflow();
        let handle = wf.cancel_handle();

        // 前回のリセットで立ったキャンセルは次の選択で解除される
        wf.reset();
        assert!(handle.is_cancelled());

        wf.select_model(ModelType::Xception).unwrap();
        wf.select_image(file("image/png", 10)).unwrap();
        assert!(!handle.is_cancelled());

        handle.cancel();
        assert!(wf.cancel_handle().is_cancelled());
    }

    #[test]
    fn test_reset_from_idle_is_noop() {
        let mut wf = workflow();
        wf.reset();
        wf.reset();
        assert_eq!(wf.status(), AnalysisStatus::Idle);
    }

    #[tokio::test]
    async fn test_run_requires_selected_image() {
        let mut wf = workflow();
        let err = wf.run().await.unwrap_err();
        assert!(matches!(err, DetectError::InvalidTransition { .. }));
    }
}
