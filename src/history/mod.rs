//! 解析履歴
//!
//! 新しい順に最大10件をJSON配列としてストアに保存する。
//! ストアの読み書きに失敗しても呼び出し元には伝えず、ログに残して
//! 空の履歴 / 何もしない として扱う。

pub mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use deepfake_detect_common::HistoryItem;
use tracing::warn;

pub const HISTORY_KEY: &str = "deepfake-detection-history";
pub const MAX_HISTORY: usize = 10;

pub struct HistoryLog<S> {
    store: S,
}

impl<S: KeyValueStore> HistoryLog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 保存済みの履歴（新しい順）
    pub fn items(&self) -> Vec<HistoryItem> {
        let content = match self.store.get(HISTORY_KEY) {
            Ok(Some(content)) => content,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("履歴の読み込みに失敗: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(items) => items,
            Err(e) => {
                warn!("履歴のJSONが不正なため空として扱います: {}", e);
                Vec::new()
            }
        }
    }

    /// 先頭に追加し、上限を超えた古いものを捨てる
    pub fn add(&self, item: HistoryItem) -> Vec<HistoryItem> {
        let mut items = self.items();
        items.insert(0, item);
        items.truncate(MAX_HISTORY);

        match serde_json::to_string(&items) {
            Ok(json) => {
                if let Err(e) = self.store.set(HISTORY_KEY, &json) {
                    warn!("履歴の保存に失敗: {}", e);
                }
            }
            Err(e) => warn!("履歴のシリアライズに失敗: {}", e),
        }

        items
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            warn!("履歴の削除に失敗: {}", e);
        }
    }

    pub fn get(&self, index: usize) -> Option<HistoryItem> {
        self.items().into_iter().nth(index)
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
