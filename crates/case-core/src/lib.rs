//! Normalization of extracted fields into the canonical case record

pub mod fuel;
pub mod merge;
pub mod summary;
pub mod validate;

pub use fuel::{denormalize_fuel, normalize_fuel};
pub use merge::{merge_case_summaries, merge_case_summaries_at};
pub use summary::{to_case_summary, to_case_summary_at, DEFAULT_DEREG_REASON};
pub use validate::{validate_case_summary, CaseValidation};
