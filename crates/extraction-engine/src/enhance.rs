//! Handling of the optional LLM validation pass
//!
//! The model call itself lives outside this crate. What arrives here is the
//! model's free-form reply, expected to contain one JSON object:
//! `{ "validated": bool, "confidence": "high|medium|low",
//!    "corrected_fields": {..}, "errors": [..] }`.

use chrono::NaiveDate;
use serde_json::Value;
use shared_types::{ExtractionConfidence, ExtractionResult, LlmValidation, StructuredFields};

use crate::validator::{calculate_confidence, validate_at};

/// Result used when the model is unavailable or its reply is unusable
pub fn default_validation(original: &StructuredFields, errors: Vec<String>) -> LlmValidation {
    LlmValidation {
        validated: false,
        confidence: ExtractionConfidence::Low,
        fields: original.clone(),
        errors,
        enhanced_fields: StructuredFields::default(),
    }
}

/// Outermost `{ ... }` span of a reply, if any
fn json_span(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

/// Parse a model reply into an [`LlmValidation`].
///
/// Corrections are read leniently (numeric strings, `mileage` for
/// `mileage_km`) and overlaid on `original` to form `fields`.
pub fn parse_validation_response(response: &str, original: &StructuredFields) -> LlmValidation {
    let parsed = json_span(response).and_then(|span| serde_json::from_str::<Value>(span).ok());
    let Some(parsed) = parsed.filter(Value::is_object) else {
        tracing::warn!("LLM reply did not contain a JSON object");
        return default_validation(original, vec!["Failed to parse LLM response".to_string()]);
    };

    let enhanced = parsed
        .get("corrected_fields")
        .or_else(|| parsed.get("enhanced_fields"))
        .map(StructuredFields::from_value)
        .unwrap_or_default();

    let mut fields = original.clone();
    fields.overlay(&enhanced);

    let errors = parsed
        .get("errors")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|e| match e {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect()
        })
        .unwrap_or_default();

    LlmValidation {
        validated: parsed.get("validated").and_then(Value::as_bool).unwrap_or(false),
        confidence: parsed
            .get("confidence")
            .and_then(ExtractionConfidence::from_value)
            .unwrap_or_default(),
        fields,
        errors,
        enhanced_fields: enhanced,
    }
}

/// Overlay the model's corrections on an extraction result (model wins) and
/// re-run validation and tiering on the merged fields.
pub fn apply_enhancement_at(result: &mut ExtractionResult, validation: &LlmValidation, today: NaiveDate) {
    if validation.enhanced_fields.is_empty() {
        return;
    }
    result.fields.overlay(&validation.enhanced_fields);
    result.validation = validate_at(&result.fields, &result.document_type, today);
    result.confidence =
        calculate_confidence(&result.fields, &result.document_type, &result.validation.errors);
    tracing::info!(
        document_type = %result.document_type,
        confidence = ?result.confidence,
        "applied LLM corrections"
    );
}

pub fn apply_enhancement(result: &mut ExtractionResult, validation: &LlmValidation) {
    apply_enhancement_at(result, validation, chrono::Local::now().date_naive());
}
