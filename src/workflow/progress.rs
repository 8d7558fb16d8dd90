//! 進捗シミュレーションの段階実行
//!
//! 1段階ごとに `tokio::time::interval` を作り、完了したら破棄する。

use deepfake_detect_common::{PhaseSpec, PhaseStep};
use tokio::time::MissedTickBehavior;

/// 1段階を最後まで進める
///
/// `on_progress` には各tickの進捗（0.0〜1.0）が渡され、完了時は必ず1.0で呼ばれる。
pub async fn run_phase<F>(spec: &PhaseSpec, mut on_progress: F)
where
    F: FnMut(f32),
{
    let mut ticker = tokio::time::interval(spec.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // 初回tickは即座に完了するので読み捨てる
    ticker.tick().await;

    let mut progress = 0.0;
    loop {
        ticker.tick().await;
        match spec.step(progress) {
            PhaseStep::Advanced(next) => {
                progress = next;
                on_progress(progress);
            }
            PhaseStep::Finished => {
                on_progress(1.0);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepfake_detect_common::ProcessingStage;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_phase_reports_monotonic_progress_and_snaps() {
        let spec = PhaseSpec::for_stage(ProcessingStage::Finalizing);
        let mut seen = Vec::new();

        run_phase(&spec, |p| seen.push(p)).await;

        assert_eq!(seen.len(), spec.tick_count());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_takes_interval_per_tick() {
        let spec = PhaseSpec::for_stage(ProcessingStage::Uploading);
        let started = Instant::now();

        run_phase(&spec, |_| {}).await;

        assert_eq!(started.elapsed(), spec.expected_duration());
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }
}
