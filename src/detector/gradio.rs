//! Gradio API連携
//!
//! 1. POST {base}/gradio_api/call/predict  → {"event_id": "..."}
//! 2. GET  {base}/gradio_api/call/predict/{event_id}  → Server-Sent Events
//!    `complete` イベントのdataが [{label, confidences}]

use super::{CancelToken, Detector, Prediction};
use crate::config::Config;
use crate::error::{DetectError, Result};
use crate::media::ImageFile;
use crate::thumbnail::to_data_url;
use deepfake_detect_common::ModelType;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const API_PREFIX: &str = "/gradio_api";
const PREDICT_ENDPOINT: &str = "predict";

/// call APIリクエスト
#[derive(Serialize)]
struct CallRequest {
    data: Vec<FileData>,
}

#[derive(Serialize)]
struct FileData {
    url: String,
    orig_name: String,
    mime_type: String,
    meta: FileMeta,
}

#[derive(Serialize)]
struct FileMeta {
    #[serde(rename = "_type")]
    kind: &'static str,
}

/// call APIレスポンス
#[derive(Deserialize)]
struct CallResponse {
    event_id: String,
}

pub struct GradioDetector {
    http_client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

impl GradioDetector {
    pub fn new(endpoint: &str, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectError::Config(format!("HTTPクライアント初期化エラー: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.endpoint,
            config.get_api_token(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    fn call_url(&self) -> String {
        format!("{}{}/call/{}", self.endpoint, API_PREFIX, PREDICT_ENDPOINT)
    }

    fn result_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.call_url(), event_id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn predict(&self, image: &ImageFile, model: ModelType) -> Result<Prediction> {
        let started = Instant::now();
        info!(model = %model, space = model.space_id(), file = %image.file_name, "推論リクエスト送信");

        let body = CallRequest {
            data: vec![FileData {
                url: to_data_url(&image.mime_type, &image.bytes),
                orig_name: image.file_name.clone(),
                mime_type: image.mime_type.clone(),
                meta: FileMeta { kind: "gradio.FileData" },
            }],
        };

        let response = self
            .authorize(self.http_client.post(self.call_url()))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DetectError::Detector(format!("API error {}: {}", status, text)));
        }

        let call: CallResponse = response
            .json()
            .await
            .map_err(|e| DetectError::DetectorParse(format!("event_idがありません: {}", e)))?;
        debug!(event_id = %call.event_id, "イベントID取得");

        let response = self
            .authorize(self.http_client.get(self.result_url(&call.event_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DetectError::Detector(format!(
                "API error {}",
                response.status()
            )));
        }

        let stream = response.text().await?;
        let prediction = parse_event_stream(&stream)?;

        info!(
            label = %prediction.label,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "推論完了"
        );
        Ok(prediction)
    }
}

impl Detector for GradioDetector {
    async fn detect(
        &self,
        image: &ImageFile,
        model: ModelType,
        mut cancel: CancelToken,
    ) -> Result<Prediction> {
        cancel.run(self.predict(image, model)).await
    }
}

/// SSE本文から `complete` イベントの予測結果を取り出す
pub fn parse_event_stream(stream: &str) -> Result<Prediction> {
    let mut event = "";

    for line in stream.lines() {
        let line = line.trim_end_matches('\r');

        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
            continue;
        }

        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        match event {
            "complete" => return parse_complete_data(data),
            "error" => {
                let message = if data.is_empty() || data == "null" {
                    "unknown error".to_string()
                } else {
                    data.to_string()
                };
                return Err(DetectError::Detector(message));
            }
            _ => {}
        }
    }

    Err(DetectError::DetectorParse(
        "completeイベントが見つかりません".into(),
    ))
}

fn parse_complete_data(data: &str) -> Result<Prediction> {
    let outputs: Vec<Prediction> = serde_json::from_str(data)
        .map_err(|e| DetectError::DetectorParse(format!("予測結果のJSONが不正: {}", e)))?;

    outputs
        .into_iter()
        .next()
        .ok_or_else(|| DetectError::DetectorParse("予測結果が空です".into()))
}
