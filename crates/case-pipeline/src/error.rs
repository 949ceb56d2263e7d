use form_engine::FormEngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("LLM enhancement failed: {0}")]
    Enhancement(String),

    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("Case already exists: {0}")]
    CaseExists(String),

    #[error("Case is not ready for export: {0}")]
    InvalidCase(String),

    #[error("Rendering failed: {0}")]
    Render(#[from] FormEngineError),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
