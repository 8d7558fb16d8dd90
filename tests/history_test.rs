//! 履歴の永続化テスト
//!
//! FileStore に保存した履歴が再起動後（別インスタンス）も読めること、
//! 壊れたファイルがあっても処理が止まらないことを確認

use deepfake_detect::history::{FileStore, HistoryLog, KeyValueStore, HISTORY_KEY, MAX_HISTORY};
use deepfake_detect_common::{AnalysisResult, HistoryItem, ModelType};
use tempfile::tempdir;

fn item(id: &str, model: ModelType) -> HistoryItem {
    HistoryItem {
        id: id.to_string(),
        image_url: format!("/photos/{}.jpg", id),
        thumbnail_url: "data:image/jpeg;base64,/9j/".to_string(),
        timestamp: "2026-01-18T09:00:00.000Z".to_string(),
        result: AnalysisResult {
            is_deepfake: true,
            confidence_score: 0.91,
            ..AnalysisResult::default()
        },
        model_used: model,
    }
}

/// 別インスタンスから同じ履歴が読める
#[test]
fn test_history_survives_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");

    {
        let log = HistoryLog::new(FileStore::new(dir.path()));
        log.add(item("first", ModelType::Xception));
        log.add(item("second", ModelType::VisionTransformer));
    }

    let log = HistoryLog::new(FileStore::new(dir.path()));
    let items = log.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "second");
    assert_eq!(items[0].model_used, ModelType::VisionTransformer);
    assert_eq!(items[1].result.confidence_score, 0.91);
}

/// 保存形式はキー名のJSONファイル（camelCase）
#[test]
fn test_history_file_layout() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::new(dir.path());
    let log = HistoryLog::new(&store);
    log.add(item("a", ModelType::Xception));

    let path = store.path_for(HISTORY_KEY);
    assert!(path.ends_with("deepfake-detection-history.json"));

    let content = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    let entry = &json[0];
    assert_eq!(entry["modelUsed"], "xception");
    assert_eq!(entry["result"]["isDeepfake"], true);
    assert!(entry["thumbnailUrl"].as_str().unwrap().starts_with("data:image/jpeg"));
    assert!(entry["result"]["metrics"]["f1Score"].is_number());

    // 一時ファイルは残らない
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

/// 11件目で最も古いものが消える
#[test]
fn test_history_is_capped() {
    let dir = tempdir().expect("Failed to create temp dir");
    let log = HistoryLog::new(FileStore::new(dir.path()));

    for i in 0..15 {
        log.add(item(&format!("n{}", i), ModelType::Xception));
    }

    let items = log.items();
    assert_eq!(items.len(), MAX_HISTORY);
    assert_eq!(items.first().unwrap().id, "n14");
    assert_eq!(items.last().unwrap().id, "n5");
}

/// 壊れた履歴ファイルは空として扱い、次の追加で上書きされる
#[test]
fn test_corrupted_history_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::new(dir.path());
    store.set(HISTORY_KEY, "{ not json").unwrap();

    let log = HistoryLog::new(&store);
    assert!(log.items().is_empty());

    let items = log.add(item("fresh", ModelType::Xception));
    assert_eq!(items.len(), 1);
    assert_eq!(log.items()[0].id, "fresh");
}

/// 削除後は空、ファイルが無い状態での削除もエラーにならない
#[test]
fn test_clear_history() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::new(dir.path().join("nested"));
    let log = HistoryLog::new(&store);

    log.clear();
    assert!(log.is_empty());

    log.add(item("a", ModelType::Xception));
    assert_eq!(log.len(), 1);
    assert!(store.path_for(HISTORY_KEY).exists());

    log.clear();
    assert!(log.is_empty());
    assert!(!store.path_for(HISTORY_KEY).exists());
}
