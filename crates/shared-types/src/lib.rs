//! Data model shared across the deregistration kiosk crates
//!
//! - [`fields`]: flat per-document extraction output
//! - [`case`]: the canonical, nested case record
//! - [`ocr`]: shapes consumed from OCR engines and the LLM validator
//! - [`report`]: validation error/warning lists

pub mod case;
pub mod fields;
pub mod ocr;
pub mod report;

pub use case::{
    CaseSummary, DeregistrationInfo, FuelType, Invoice, Owner, OwnerType, Transaction, Vehicle,
    DEREG_REASONS,
};
pub use fields::{
    DocumentType, ExtractionConfidence, ExtractionResult, PlateMatch, PlateSource,
    StructuredFields,
};
pub use ocr::{LlmValidation, OcrDocument, OcrOutput};
pub use report::ValidationReport;
