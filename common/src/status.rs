//! 解析ワークフローの状態遷移
//!
//! idle → uploading → processing → complete | error
//! complete / error は idle へ戻せる。遷移可否はここで一元的に判定する。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// ワークフローの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Uploading,
    Processing,
    Complete,
    Error,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Idle => "idle",
            AnalysisStatus::Uploading => "uploading",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Complete => "complete",
            AnalysisStatus::Error => "error",
        }
    }

    /// 解析が進行中か（新たな選択を受け付けない状態）
    pub fn is_in_flight(&self) -> bool {
        matches!(self, AnalysisStatus::Uploading | AnalysisStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Complete | AnalysisStatus::Error)
    }

    pub fn can_transition_to(&self, next: AnalysisStatus) -> bool {
        use AnalysisStatus::*;

        match (self, next) {
            (Idle, Uploading) => true,
            (Uploading, Processing) => true,
            (Processing, Complete) => true,
            (Uploading | Processing, Error) => true,
            // reset は常に idle へ
            (_, Idle) => true,
            // 履歴からの復元は進行中以外なら可
            (Idle | Complete | Error, Complete) => true,
            _ => false,
        }
    }

    /// 遷移を検証して次の状態を返す
    pub fn transition(&self, next: AnalysisStatus) -> Result<AnalysisStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition { from: *self, to: next })
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 進捗表示の段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStage {
    Uploading,
    Analyzing,
    Finalizing,
}

impl ProcessingStage {
    pub const SEQUENCE: [ProcessingStage; 3] = [
        ProcessingStage::Uploading,
        ProcessingStage::Analyzing,
        ProcessingStage::Finalizing,
    ];

    /// この段階を実行中のワークフロー状態
    pub fn status(&self) -> AnalysisStatus {
        match self {
            ProcessingStage::Uploading => AnalysisStatus::Uploading,
            ProcessingStage::Analyzing | ProcessingStage::Finalizing => AnalysisStatus::Processing,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessingStage::Uploading => "Uploading image",
            ProcessingStage::Analyzing => "Analyzing image",
            ProcessingStage::Finalizing => "Finalizing results",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AnalysisStatus::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut status = Idle;
        for next in [Uploading, Processing, Complete, Idle] {
            status = status.transition(next).unwrap();
        }
        assert_eq!(status, Idle);
    }

    #[test]
    fn test_error_is_reachable_only_in_flight() {
        assert!(Uploading.can_transition_to(Error));
        assert!(Processing.can_transition_to(Error));
        assert!(!Idle.can_transition_to(Error));
        assert!(!Complete.can_transition_to(Error));
    }

    #[test]
    fn test_reset_always_allowed() {
        for status in [Idle, Uploading, Processing, Complete, Error] {
            assert!(status.can_transition_to(Idle), "{} -> idle", status);
        }
    }

    #[test]
    fn test_skipping_phases_rejected() {
        let err = Idle.transition(Processing).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidTransition { from: Idle, to: Processing }));
        assert!(Uploading.transition(Complete).is_err());
        assert!(Complete.transition(Uploading).is_err());
    }

    #[test]
    fn test_history_view_not_allowed_in_flight() {
        assert!(Idle.can_transition_to(Complete));
        assert!(Error.can_transition_to(Complete));
        assert!(!Uploading.can_transition_to(Complete));
    }

    #[test]
    fn test_stage_status_mapping() {
        assert_eq!(ProcessingStage::Uploading.status(), Uploading);
        assert_eq!(ProcessingStage::Analyzing.status(), Processing);
        assert_eq!(ProcessingStage::Finalizing.status(), Processing);
    }
}
