//! Per-document-type extraction tables

pub mod delegation;
pub mod id_card;
pub mod invoice;
pub mod vehicle_registration;

use shared_types::{DocumentType, PlateMatch, StructuredFields};

/// Fills the gaps of `fields` from raw text; returns the plate match it used, if any
pub type Extractor = fn(&str, Option<&str>, &mut StructuredFields) -> Option<PlateMatch>;

/// Extraction routine for a document type; `None` means pass-through
pub fn extractor_for(document_type: &DocumentType) -> Option<Extractor> {
    match document_type {
        DocumentType::VehicleRegistration => Some(vehicle_registration::extract),
        DocumentType::IdCard => Some(id_card::extract),
        DocumentType::DelegationForm => Some(delegation::extract),
        DocumentType::Invoice => Some(invoice::extract),
        DocumentType::Other(_) => None,
    }
}

/// Run `find` only when the slot is still empty
pub(crate) fn fill<T>(slot: &mut Option<T>, find: impl FnOnce() -> Option<T>) {
    if slot.is_none() {
        *slot = find();
    }
}
