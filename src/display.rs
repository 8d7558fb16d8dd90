//! 端末表示
//!
//! 判定結果・履歴・モデル一覧の整形と、ワークフロー進捗のプログレスバー。

use crate::workflow::WorkflowSnapshot;
use deepfake_detect_common::{
    AnalysisResult, HistoryItem, Likelihood, ModelInfo, ProcessingStage, Verdict,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

fn verdict_icon(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Deepfake => "❌",
        Verdict::Authentic => "✅",
        Verdict::Uncertain => "⚠️",
    }
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn likelihood_icon(likelihood: Likelihood) -> &'static str {
    match likelihood {
        Likelihood::LikelyDeepfake => "❌",
        Likelihood::LikelyReal => "✅",
        Likelihood::Uncertain => "⚠️",
    }
}

/// 判定結果の詳細
pub fn format_result(result: &AnalysisResult, image_url: Option<&str>) -> String {
    let likelihood = result.likelihood();
    let mut lines = vec![
        format!(
            "{} {} ({}% confidence)",
            likelihood_icon(likelihood),
            likelihood,
            result.confidence_percent()
        ),
        String::new(),
    ];

    if let Some(url) = image_url {
        lines.push(format!("  画像:       {}", url));
    }
    lines.push(format!("  判定時間:   {:.2}s", result.detection_time));
    lines.push(format!("  判定日時:   {}", result.detection_date));
    lines.push(format!("  形式:       {}", result.metadata.format));
    lines.push(format!(
        "  サイズ:     {} × {}",
        result.metadata.dimensions.width, result.metadata.dimensions.height
    ));
    lines.push(format!("  ファイル:   {}", result.metadata.file_size));

    let regions = result.flagged_regions();
    if result.is_deepfake && !regions.is_empty() {
        lines.push(format!("  検出領域:   {}件", regions.len()));
        for r in regions {
            lines.push(format!(
                "    - ({}, {}) {}×{}  {}%",
                r.x,
                r.y,
                r.width,
                r.height,
                (r.confidence * 100.0).round()
            ));
        }
    }

    let m = &result.metrics;
    lines.push(String::new());
    lines.push("  モデル指標:".to_string());
    lines.push(format!(
        "    Accuracy {}  Precision {}  Recall {}  F1 {}",
        percent(m.accuracy),
        percent(m.precision),
        percent(m.recall),
        percent(m.f1_score)
    ));

    lines.join("\n")
}

/// 履歴一覧の1行
pub fn format_history_line(index: usize, item: &HistoryItem) -> String {
    let r = &item.result;
    let verdict = r.verdict();
    format!(
        "{:>2}. {} {:<10} {}  {} × {} • {} • {}% confidence  [{}]",
        index + 1,
        verdict_icon(verdict),
        verdict.as_str(),
        item.timestamp,
        r.metadata.dimensions.width,
        r.metadata.dimensions.height,
        r.metadata.format,
        r.confidence_percent(),
        item.model_used
    )
}

pub fn format_model(info: &ModelInfo) -> String {
    format!(
        "{} ({})\n  {}\n  Accuracy {}  F1 Score {}",
        info.name,
        info.model_type,
        info.description,
        percent(info.metrics.accuracy),
        percent(info.metrics.f1_score)
    )
}

/// ワークフローの進捗をプログレスバーに反映する
///
/// 送信側（ワークフロー）が破棄されるとタスクは終了する。
pub fn spawn_progress_bar(mut rx: watch::Receiver<WorkflowSnapshot>) -> JoinHandle<()> {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{spinner} {msg:<20} [{bar:40}] {pos:>3}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);

    tokio::spawn(async move {
        let mut current_stage: Option<ProcessingStage> = None;

        while rx.changed().await.is_ok() {
            let snapshot = *rx.borrow_and_update();

            if snapshot.status.is_terminal() || snapshot.stage.is_none() {
                bar.finish_and_clear();
                continue;
            }

            if snapshot.stage != current_stage {
                current_stage = snapshot.stage;
                if let Some(stage) = current_stage {
                    bar.set_message(stage.label());
                }
            }
            bar.set_position((snapshot.progress * 100.0).round() as u64);
        }

        bar.finish_and_clear();
    })
}
