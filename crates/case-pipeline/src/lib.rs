//! Case orchestration over the extraction, normalization and form crates
//!
//! The OCR engine, LLM validator and case storage are traits so deployments
//! can plug in their own; [`FileOcrProvider`] and
//! [`InMemoryCaseRepository`] cover local use and tests.

pub mod error;
pub mod processor;
pub mod repository;
pub mod traits;

pub use error::{PipelineError, Result};
pub use processor::{CaseProcessor, ProcessedDocument};
pub use repository::InMemoryCaseRepository;
pub use traits::{CaseRepository, FileOcrProvider, LlmEnhancer, OcrProvider};
