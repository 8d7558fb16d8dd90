//! Deepfake Detect Common Library
//!
//! CLIと他のフロントエンドで共有される型とワークフロー規則

pub mod types;
pub mod catalog;
pub mod status;
pub mod validation;
pub mod progress;
pub mod error;

pub use types::{
    format_file_size, AnalysisResult, Dimensions, FlaggedRegion, HistoryItem, ImageMetadata,
    Likelihood, Verdict,
};
pub use catalog::{catalog, ModelInfo, ModelMetrics, ModelType};
pub use status::{AnalysisStatus, ProcessingStage};
pub use validation::{format_label, validate_upload, MAX_FILE_SIZE};
pub use progress::{default_phases, PhaseSpec, PhaseStep, PHASE_THRESHOLD};
pub use error::{Error, Result, ValidationError};
