use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormEngineError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Failed to load template: {0}")]
    TemplateLoad(String),

    #[error("Invalid field map: {0}")]
    FieldMap(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FormEngineError>;
