//! Shapes consumed from external collaborators: OCR engines and the LLM validator

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::fields::{ExtractionConfidence, StructuredFields};

/// Result of one OCR engine run.
///
/// Engines either emit a JSON document or, on failure paths, a bare string
/// that is treated as the recognized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OcrOutput {
    Document(OcrDocument),
    Plain(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrDocument {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_fields: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient_confidence",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<ExtractionConfidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>, // e.g. "tesseract", "surya"
}

fn lenient_confidence<'de, D>(deserializer: D) -> Result<Option<ExtractionConfidence>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(ExtractionConfidence::from_value))
}

impl OcrOutput {
    pub fn text(&self) -> &str {
        match self {
            OcrOutput::Document(doc) => &doc.text,
            OcrOutput::Plain(text) => text,
        }
    }

    /// Engine-native fields, leniently coerced; empty for plain output
    pub fn structured_fields(&self) -> StructuredFields {
        match self {
            OcrOutput::Document(OcrDocument {
                structured_fields: Some(value),
                ..
            }) => StructuredFields::from_value(value),
            _ => StructuredFields::default(),
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            OcrOutput::Document(doc) => doc.method.as_deref(),
            OcrOutput::Plain(_) => None,
        }
    }
}

impl From<String> for OcrOutput {
    fn from(text: String) -> Self {
        OcrOutput::Plain(text)
    }
}

impl From<&str> for OcrOutput {
    fn from(text: &str) -> Self {
        OcrOutput::Plain(text.to_string())
    }
}

/// Verdict of the optional LLM validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmValidation {
    pub validated: bool,
    pub confidence: ExtractionConfidence,
    pub fields: StructuredFields, // extractor output merged with corrections
    pub errors: Vec<String>,
    pub enhanced_fields: StructuredFields, // corrections only
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_document_shape() {
        let output: OcrOutput = serde_json::from_str(
            r#"{
                "text": "등록번호: 12가3456",
                "structured_fields": {"license_plate": "12가3456", "mileage": "15,234"},
                "confidence": "high",
                "method": "surya"
            }"#,
        )
        .unwrap();

        assert_eq!(output.text(), "등록번호: 12가3456");
        assert_eq!(output.method(), Some("surya"));
        let fields = output.structured_fields();
        assert_eq!(fields.license_plate.as_deref(), Some("12가3456"));
        assert_eq!(fields.mileage_km, Some(15234));
    }

    #[test]
    fn test_accepts_plain_string() {
        let output: OcrOutput = serde_json::from_str(r#""OCR failed: timeout""#).unwrap();
        assert_eq!(output, OcrOutput::Plain("OCR failed: timeout".to_string()));
        assert!(output.structured_fields().is_empty());
    }

    #[test]
    fn test_numeric_confidence_is_tiered() {
        let output: OcrOutput =
            serde_json::from_str(r#"{"text": "x", "confidence": 0.42}"#).unwrap();
        match output {
            OcrOutput::Document(doc) => {
                assert_eq!(doc.confidence, Some(ExtractionConfidence::Low))
            }
            other => panic!("Should parse as a document. Got: {:?}", other),
        }
    }
}
