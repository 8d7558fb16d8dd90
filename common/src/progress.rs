//! 進捗シミュレーションのパラメータ
//!
//! 3段階（アップロード・解析・仕上げ）それぞれ一定間隔で進捗を加算し、
//! しきい値に達したら1.0に丸めて次の段階へ進む。実際のリモート呼び出しの
//! 進み具合とは無関係な表示用の値。

use crate::status::ProcessingStage;
use std::time::Duration;

/// この値以上で段階完了
pub const PHASE_THRESHOLD: f32 = 0.95;

/// 1段階分の設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSpec {
    pub stage: ProcessingStage,
    pub increment: f32,
    pub interval: Duration,
    pub threshold: f32,
}

/// 1tick分の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseStep {
    Advanced(f32),
    Finished,
}

impl PhaseSpec {
    pub const fn new(stage: ProcessingStage, increment: f32, interval_ms: u64) -> Self {
        Self {
            stage,
            increment,
            interval: Duration::from_millis(interval_ms),
            threshold: PHASE_THRESHOLD,
        }
    }

    pub fn for_stage(stage: ProcessingStage) -> Self {
        match stage {
            ProcessingStage::Uploading => Self::new(stage, 0.1, 200),
            ProcessingStage::Analyzing => Self::new(stage, 0.05, 300),
            ProcessingStage::Finalizing => Self::new(stage, 0.2, 200),
        }
    }

    /// 現在値から1tick進める
    pub fn step(&self, progress: f32) -> PhaseStep {
        if progress >= self.threshold {
            PhaseStep::Finished
        } else {
            PhaseStep::Advanced((progress + self.increment).min(1.0))
        }
    }

    /// 段階完了までのtick数（完了判定のtickを含む）
    pub fn tick_count(&self) -> usize {
        let mut progress = 0.0;
        let mut ticks = 0;
        loop {
            ticks += 1;
            match self.step(progress) {
                PhaseStep::Advanced(next) => progress = next,
                PhaseStep::Finished => return ticks,
            }
        }
    }

    /// 段階完了までのおおよその所要時間
    pub fn expected_duration(&self) -> Duration {
        self.interval * self.tick_count() as u32
    }
}

/// 既定の3段階
pub fn default_phases() -> [PhaseSpec; 3] {
    ProcessingStage::SEQUENCE.map(PhaseSpec::for_stage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_advances_until_threshold() {
        let spec = PhaseSpec::for_stage(ProcessingStage::Uploading);
        assert_eq!(spec.step(0.0), PhaseStep::Advanced(0.1));
        assert_eq!(spec.step(0.95), PhaseStep::Finished);
        assert_eq!(spec.step(1.0), PhaseStep::Finished);
    }

    #[test]
    fn test_step_never_exceeds_one() {
        let spec = PhaseSpec::for_stage(ProcessingStage::Finalizing);
        match spec.step(0.9) {
            PhaseStep::Advanced(p) => assert!(p <= 1.0),
            PhaseStep::Finished => panic!("0.9 should still advance"),
        }
    }

    #[test]
    fn test_tick_counts() {
        // 0.2刻み: 0.2, 0.4, 0.6, 0.8, 1.0 → 完了判定
        assert_eq!(PhaseSpec::for_stage(ProcessingStage::Finalizing).tick_count(), 6);
        let analyzing = PhaseSpec::for_stage(ProcessingStage::Analyzing);
        assert!(analyzing.tick_count() >= 20 && analyzing.tick_count() <= 21);
    }

    #[test]
    fn test_default_phases_order() {
        let phases = default_phases();
        assert_eq!(phases[0].stage, ProcessingStage::Uploading);
        assert_eq!(phases[1].interval, Duration::from_millis(300));
        assert_eq!(phases[2].increment, 0.2);
    }
}
