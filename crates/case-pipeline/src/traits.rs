//! Seams to external collaborators: OCR engines, the LLM validator and case
//! storage

use std::path::Path;

use async_trait::async_trait;
use shared_types::{CaseSummary, DocumentType, ExtractionResult, LlmValidation, OcrOutput};

use crate::error::{PipelineError, Result};

/// OCR engine producing text (and optionally pre-structured fields) for a
/// scanned document
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    async fn recognize(&self, path: &Path) -> Result<OcrOutput>;
}

/// LLM second pass over an extraction result
#[async_trait]
pub trait LlmEnhancer: Send + Sync {
    async fn enhance(
        &self,
        document_type: &DocumentType,
        text: &str,
        result: &ExtractionResult,
    ) -> Result<LlmValidation>;
}

/// Case summaries keyed by case id
#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn create(&self, case_id: &str, summary: CaseSummary) -> Result<()>;

    async fn get(&self, case_id: &str) -> Result<Option<CaseSummary>>;

    /// Insert or replace
    async fn update(&self, case_id: &str, summary: CaseSummary) -> Result<()>;
}

/// Reads OCR output an engine already wrote to disk.
///
/// `.json` files are parsed as an OCR document (or a bare JSON string);
/// anything else is taken as plain recognized text.
#[derive(Debug, Clone, Default)]
pub struct FileOcrProvider;

#[async_trait]
impl OcrProvider for FileOcrProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn recognize(&self, path: &Path) -> Result<OcrOutput> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PipelineError::Ocr(format!("{}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            return Ok(OcrOutput::from(contents));
        }

        serde_json::from_str(&contents)
            .map_err(|e| PipelineError::Ocr(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_plain_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.txt");
        std::fs::write(&path, "등록번호: 12가3456").unwrap();

        let output = FileOcrProvider.recognize(&path).await.unwrap();
        assert_eq!(output.text(), "등록번호: 12가3456");
        assert_eq!(output.method(), None);
    }

    #[tokio::test]
    async fn test_json_document_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(
            &path,
            r#"{"text": "성명: 홍길동", "structured_fields": {"owner_name": "홍길동"}, "method": "surya"}"#,
        )
        .unwrap();

        let output = FileOcrProvider.recognize(&path).await.unwrap();
        assert_eq!(output.text(), "성명: 홍길동");
        assert_eq!(output.method(), Some("surya"));
        assert_eq!(output.structured_fields().owner_name.as_deref(), Some("홍길동"));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_ocr_error() {
        let result = FileOcrProvider.recognize(Path::new("/nonexistent/scan.txt")).await;
        assert!(matches!(result, Err(PipelineError::Ocr(_))));
    }

    #[tokio::test]
    async fn test_malformed_json_is_ocr_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = FileOcrProvider.recognize(&path).await;
        assert!(matches!(result, Err(PipelineError::Ocr(_))));
    }
}
