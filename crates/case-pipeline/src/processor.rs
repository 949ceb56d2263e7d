//! Document → case orchestration
//!
//! One uploaded document runs OCR → extraction → validation → optional LLM
//! enhancement → normalization, and the partial summary is merged into the
//! stored case. Merges for the same case id are serialized; different cases
//! proceed concurrently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use case_core::{merge_case_summaries, to_case_summary, validate_case_summary};
use extraction_engine::{apply_enhancement, map_fields_by_document_type};
use form_engine::PdfEngine;
use serde::Serialize;
use shared_types::{CaseSummary, DocumentType, ExtractionResult};

use crate::error::{PipelineError, Result};
use crate::traits::{CaseRepository, LlmEnhancer, OcrProvider};

/// Outcome of processing one document
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    pub extraction: ExtractionResult,
    /// The case after this document was merged in
    pub summary: CaseSummary,
}

pub struct CaseProcessor {
    ocr: Arc<dyn OcrProvider>,
    repository: Arc<dyn CaseRepository>,
    engine: Arc<PdfEngine>,
    enhancer: Option<Arc<dyn LlmEnhancer>>,
    case_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CaseProcessor {
    pub fn new(
        ocr: Arc<dyn OcrProvider>,
        repository: Arc<dyn CaseRepository>,
        engine: Arc<PdfEngine>,
    ) -> Self {
        Self {
            ocr,
            repository,
            engine,
            enhancer: None,
            case_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn LlmEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn repository(&self) -> &Arc<dyn CaseRepository> {
        &self.repository
    }

    fn case_lock(&self, case_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.case_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(case_id.to_string()).or_default())
    }

    /// Drop the map entry once no other task holds or waits on it
    fn release_case_lock(&self, case_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.case_locks.lock().unwrap_or_else(|e| e.into_inner());
        let idle = locks
            .get(case_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            locks.remove(case_id);
        }
    }

    async fn merge_into_case(&self, case_id: &str, partial: CaseSummary) -> Result<CaseSummary> {
        let summary = match self.repository.get(case_id).await? {
            Some(existing) => merge_case_summaries(&existing, &partial),
            None => partial,
        };
        self.repository.update(case_id, summary.clone()).await?;
        Ok(summary)
    }

    /// OCR, extraction and the optional LLM pass for one document
    pub async fn extract(&self, document_type: &DocumentType, path: &Path) -> Result<ExtractionResult> {
        let ocr = self.ocr.recognize(path).await?;
        let filename = path.file_name().and_then(|name| name.to_str());
        let mut result = map_fields_by_document_type(document_type, &ocr, filename);

        if let Some(enhancer) = &self.enhancer {
            match enhancer.enhance(document_type, ocr.text(), &result).await {
                Ok(validation) => apply_enhancement(&mut result, &validation),
                Err(e) => {
                    tracing::warn!(%document_type, error = %e, "LLM enhancement failed, keeping extractor output");
                }
            }
        }

        Ok(result)
    }

    /// Extract one document and merge it into case `case_id`, creating the
    /// case on first use
    pub async fn process_document(
        &self,
        case_id: &str,
        document_type: &DocumentType,
        path: &Path,
    ) -> Result<ProcessedDocument> {
        let extraction = self.extract(document_type, path).await?;
        let partial = to_case_summary(&extraction.fields);

        let lock = self.case_lock(case_id);
        let merged = {
            let _guard = lock.lock().await;
            self.merge_into_case(case_id, partial).await
        };
        self.release_case_lock(case_id, lock);
        let summary = merged?;

        tracing::info!(
            case_id,
            %document_type,
            ocr = self.ocr.name(),
            confidence = ?extraction.confidence,
            "Merged document into case"
        );

        Ok(ProcessedDocument {
            extraction,
            summary,
        })
    }

    /// Render a stored case onto `template_id`
    pub async fn render(&self, case_id: &str, template_id: &str, output: &Path) -> Result<Vec<u8>> {
        let summary = self
            .repository
            .get(case_id)
            .await?
            .ok_or_else(|| PipelineError::CaseNotFound(case_id.to_string()))?;

        self.render_summary(summary, template_id, output).await
    }

    /// Validate and render a summary; cases with validation errors are
    /// refused
    pub async fn render_summary(
        &self,
        summary: CaseSummary,
        template_id: &str,
        output: &Path,
    ) -> Result<Vec<u8>> {
        let validation = validate_case_summary(&summary);
        if !validation.is_valid {
            return Err(PipelineError::InvalidCase(validation.errors.join("; ")));
        }
        for warning in &validation.warnings {
            tracing::warn!(template = template_id, %warning, "Rendering case with warning");
        }

        let engine = Arc::clone(&self.engine);
        let template_id = template_id.to_string();
        let output: PathBuf = output.to_path_buf();
        tokio::task::spawn_blocking(move || engine.generate_pdf(&template_id, &summary, &output))
            .await
            .map_err(|e| PipelineError::Task(format!("Rendering task panicked: {}", e)))?
            .map_err(PipelineError::from)
    }
}
