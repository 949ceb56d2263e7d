//! Field extraction from OCR output
//!
//! Turns noisy Korean OCR text (plus any fields the OCR engine already
//! structured) into a flat [`StructuredFields`] record, validates it and
//! assigns a confidence tier. Everything here is total: malformed input
//! yields missing fields, never an error.

pub mod enhance;
pub mod patterns;
pub mod plate;
pub mod rules;
pub mod validator;

use chrono::{DateTime, Local, Utc};
use shared_types::{
    DocumentType, ExtractionConfidence, ExtractionResult, OcrOutput, StructuredFields,
    ValidationReport,
};

pub use enhance::{apply_enhancement, parse_validation_response};
pub use validator::{calculate_confidence, validate};

/// Extraction entry point, stamped with the current time
pub fn map_fields_by_document_type(
    document_type: &DocumentType,
    ocr: &OcrOutput,
    filename: Option<&str>,
) -> ExtractionResult {
    map_fields_by_document_type_at(document_type, ocr, filename, Utc::now())
}

/// Extract, validate and tier one document.
///
/// Fields already structured by the OCR engine take priority; text rules
/// only fill the gaps. Unknown document types produce a pass-through record
/// carrying the raw text.
pub fn map_fields_by_document_type_at(
    document_type: &DocumentType,
    ocr: &OcrOutput,
    filename: Option<&str>,
    now: DateTime<Utc>,
) -> ExtractionResult {
    let text = ocr.text();

    let Some(extract) = rules::extractor_for(document_type) else {
        tracing::info!(%document_type, "no extractor for document type, passing text through");
        return ExtractionResult {
            document_type: document_type.clone(),
            processed_at: now,
            confidence: ExtractionConfidence::Low,
            fields: StructuredFields::default(),
            plate_match: None,
            raw_text: Some(text.to_string()),
            validation: ValidationReport::default(),
        };
    };

    let mut fields = ocr.structured_fields();
    let plate_match = extract(text, filename, &mut fields);

    let today = now.with_timezone(&Local).date_naive();
    let validation = validator::validate_at(&fields, document_type, today);
    let confidence = calculate_confidence(&fields, document_type, &validation.errors);

    tracing::info!(
        %document_type,
        method = ocr.method().unwrap_or("text"),
        ?confidence,
        errors = validation.errors.len(),
        warnings = validation.warnings.len(),
        "extraction complete"
    );

    ExtractionResult {
        document_type: document_type.clone(),
        processed_at: now,
        confidence,
        fields,
        plate_match,
        raw_text: None,
        validation,
    }
}
