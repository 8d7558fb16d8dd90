use crate::error::{DetectError, Result};
use deepfake_detect_common::ModelType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Hugging Face Spaceの直接URL
pub const DEFAULT_ENDPOINT: &str = "https://ntnmedia-deepfake-detection-xception.hf.space";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// GradioアプリのベースURL
    pub endpoint: String,
    pub api_token: Option<String>,
    pub timeout_seconds: u64,
    pub default_model: Option<ModelType>,
    /// 履歴の保存先（省略時はデータディレクトリ）
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            api_token: None,
            timeout_seconds: 120,
            default_model: None,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// 設定ファイルが壊れていても既定値で続行する（`config` での修復用）
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => {
                warn!("設定ファイルの場所を特定できません: {}", e);
                Self::default()
            }
        }
    }

    pub fn load_or_default_from(config_path: &Path) -> Self {
        Self::load_from(config_path).unwrap_or_else(|e| {
            warn!("設定ファイルを読み込めないため既定値を使います: {}", e);
            Self::default()
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| DetectError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("deepfake-detect").join("config.json"))
    }

    /// 履歴ファイルを置くディレクトリ
    pub fn history_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let data = dirs::data_dir()
            .ok_or_else(|| DetectError::Config("データディレクトリが見つかりません".into()))?;
        Ok(data.join("deepfake-detect"))
    }

    pub fn get_api_token(&self) -> Option<String> {
        // 環境変数を優先
        if let Ok(token) = std::env::var("HF_TOKEN") {
            if !token.trim().is_empty() {
                return Some(token);
            }
        }

        self.api_token.clone()
    }

    pub fn set_endpoint(&mut self, endpoint: String) -> Result<()> {
        let trimmed = endpoint.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(DetectError::Config(format!(
                "エンドポイントはhttp(s)のURLで指定してください: {}",
                endpoint
            )));
        }
        self.endpoint = trimmed.to_string();
        Ok(())
    }
}
