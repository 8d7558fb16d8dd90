//! モデルカタログ
//!
//! 判定に使えるモデルと、その表示名・説明・評価指標の静的な対応表。
//! 指標はリモート呼び出しから得るものではなく事前計算値。

use serde::{Deserialize, Serialize};

/// 判定モデルの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelType {
    Xception,
    VisionTransformer,
}

/// モデル評価指標 [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// カタログのエントリ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub model_type: ModelType,
    pub metrics: ModelMetrics,
}

/// 両モデルとも同じホスト済みSpaceで推論する
const XCEPTION_SPACE: &str = "ntnmedia/DeepFake-Detection-Xception";

const XCEPTION_INFO: ModelInfo = ModelInfo {
    name: "Xception",
    description: "A deep convolutional neural network architecture inspired by Inception, \
                  which uses depthwise separable convolutions.",
    model_type: ModelType::Xception,
    metrics: ModelMetrics {
        accuracy: 0.85,
        precision: 0.87,
        recall: 0.85,
        f1_score: 0.84,
    },
};

const VISION_TRANSFORMER_INFO: ModelInfo = ModelInfo {
    name: "Vision Transformer",
    description: "A transformer-based model that processes images by splitting them into \
                  patches and applying self-attention mechanisms.",
    model_type: ModelType::VisionTransformer,
    metrics: ModelMetrics {
        accuracy: 0.98,
        precision: 0.98,
        recall: 0.98,
        f1_score: 0.98,
    },
};

impl ModelType {
    pub const ALL: [ModelType; 2] = [ModelType::Xception, ModelType::VisionTransformer];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Xception => "xception",
            ModelType::VisionTransformer => "vision-transformer",
        }
    }

    pub fn info(&self) -> &'static ModelInfo {
        match self {
            ModelType::Xception => &XCEPTION_INFO,
            ModelType::VisionTransformer => &VISION_TRANSFORMER_INFO,
        }
    }

    pub fn metrics(&self) -> ModelMetrics {
        self.info().metrics
    }

    /// 推論先のSpace ID
    pub fn space_id(&self) -> &'static str {
        match self {
            ModelType::Xception | ModelType::VisionTransformer => XCEPTION_SPACE,
        }
    }
}

impl std::str::FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xception" => Ok(ModelType::Xception),
            "vision-transformer" | "vit" => Ok(ModelType::VisionTransformer),
            _ => Err(format!(
                "Unknown model: {}. Use xception or vision-transformer",
                s
            )),
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// カタログ全件
pub fn catalog() -> [&'static ModelInfo; 2] {
    [&XCEPTION_INFO, &VISION_TRANSFORMER_INFO]
}
