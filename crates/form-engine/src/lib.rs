//! PDF field-placement engine
//!
//! Places values of a [`shared_types::CaseSummary`] onto fixed PDF templates
//! using per-template coordinate tables:
//! - Text with estimated-width wrapping and ellipsis truncation
//! - Checkboxes and checkbox groups
//! - Date cells and signature stamp boxes
//! - Embedded CJK font with a predefined Korean fallback

pub mod engine;
pub mod error;
pub mod field_map;
pub mod fonts;
pub mod layout;
pub mod registry;
pub mod render;

pub use engine::PdfEngine;
pub use error::{FormEngineError, Result};
pub use field_map::{FieldType, Origin, PdfField, PdfFieldMap};
pub use fonts::CjkFont;
pub use registry::{TemplateInfo, TemplateKind, TemplateRegistry};
pub use render::fill_template;
