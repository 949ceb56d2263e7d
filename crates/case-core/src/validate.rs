//! Summary-level checks before a case is exported

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use shared_types::{CaseSummary, ValidationReport};

lazy_static! {
    static ref PLATE: Regex = Regex::new(r"^[0-9]{2,3}[가-힣][0-9]{4}$").unwrap();
    static ref VIN: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap();
    static ref ISO_DATE: Regex = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<ValidationReport> for CaseValidation {
    fn from(report: ValidationReport) -> Self {
        Self {
            is_valid: report.is_valid(),
            errors: report.errors,
            warnings: report.warnings,
        }
    }
}

/// Required fields are errors; format problems are warnings.
pub fn validate_case_summary(summary: &CaseSummary) -> CaseValidation {
    let mut report = ValidationReport::new();
    let vehicle = &summary.vehicle;

    if vehicle.plate.is_empty() {
        report.error("Vehicle plate number is required");
    }
    if summary.owner.name.is_empty() {
        report.error("Owner name is required");
    }
    if vehicle.vin.is_empty() {
        report.warn("Vehicle VIN is missing");
    }
    if summary.dereg.application_date.is_empty() {
        report.error("Application date is required");
    }

    if !vehicle.plate.is_empty() && !PLATE.is_match(&vehicle.plate) {
        report.warn("License plate format may be invalid");
    }
    if !vehicle.vin.is_empty() && !VIN.is_match(&vehicle.vin.to_ascii_uppercase()) {
        report.warn("VIN format may be invalid (should be 17 characters)");
    }

    let birth = &summary.dereg.applicant_birth;
    if !birth.is_empty() && !ISO_DATE.is_match(birth) {
        report.warn("Birth date format should be YYYY-MM-DD");
    }
    let registered = &vehicle.first_registered_at;
    if !registered.is_empty() && !ISO_DATE.is_match(registered) {
        report.warn("Registration date format should be YYYY-MM-DD");
    }

    if !report.is_valid() {
        tracing::debug!(errors = ?report.errors, "case summary incomplete");
    }
    report.into()
}
