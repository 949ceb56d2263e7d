//! Field-level validation and confidence tiering
//!
//! Hard format violations (plate shape, VIN, name shape, missing required
//! field) are errors. Structurally valid but unusual values are warnings.
//! Messages are Korean since they are shown to kiosk operators as-is.

use chrono::{Datelike, Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{DocumentType, ExtractionConfidence, StructuredFields, ValidationReport};

use crate::patterns::{is_hangul_syllable, is_iso_date};

/// Fields counted for the confidence tier of a vehicle registration
pub const EXPECTED_FIELDS: [&str; 11] = [
    "license_plate",
    "vehicle_model",
    "manufacturing_date",
    "chassis_number",
    "registered_address",
    "owner_name",
    "birth_date",
    "mileage_km",
    "gross_weight",
    "engine_displacement",
    "fuel_type",
];

pub const REQUIRED_FIELDS: [&str; 2] = ["license_plate", "owner_name"];

/// Fuel words accepted without a warning
pub const STANDARD_FUELS: &[&str] = &["휘발유", "경유", "LPG", "전기", "하이브리드", "CNG", "수소"];

const MILEAGE_WARN_KM: u32 = 1_000_000;

lazy_static! {
    static ref PLATE_FORMAT: Regex = Regex::new(r"^[0-9]{2,3}[가-힣][0-9]{4}$").unwrap();
}

/// Exactly 17 characters from the VIN alphabet (digits and A-Z without I, O, Q)
pub fn is_valid_vin(vin: &str) -> bool {
    vin.len() == 17 && vin.chars().all(is_vin_char)
}

fn is_vin_char(c: char) -> bool {
    c.is_ascii_digit() || (c.is_ascii_uppercase() && !matches!(c, 'I' | 'O' | 'Q'))
}

/// `NN(N)<syllable>NNNN`, whitespace ignored
pub fn is_valid_plate_format(plate: &str) -> bool {
    let compact: String = plate.split_whitespace().collect();
    PLATE_FORMAT.is_match(&compact)
}

pub fn is_valid_korean_name(name: &str) -> bool {
    (2..=5).contains(&name.chars().count()) && name.chars().all(is_hangul_syllable)
}

/// Validate against today's local date
pub fn validate(fields: &StructuredFields, document_type: &DocumentType) -> ValidationReport {
    validate_at(fields, document_type, Local::now().date_naive())
}

pub fn validate_at(
    fields: &StructuredFields,
    document_type: &DocumentType,
    today: NaiveDate,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    if let Some(plate) = fields.license_plate.as_deref() {
        if !is_valid_plate_format(plate) {
            report.error("차량번호 형식이 올바르지 않습니다");
        }
    }

    if let Some(vin) = fields.chassis_number.as_deref() {
        if vin.chars().count() != 17 {
            report.error("차대번호는 17자리여야 합니다");
        } else if !vin.chars().all(is_vin_char) {
            report.error("차대번호에 유효하지 않은 문자(I, O, Q 등)가 포함되어 있습니다");
        }
    }

    if let Some(name) = fields.owner_name.as_deref() {
        if !is_valid_korean_name(name) {
            report.error("성명은 2-5자의 한글이어야 합니다");
        }
    }

    if let Some(birth) = fields.birth_date.as_deref() {
        let age = NaiveDate::parse_from_str(birth, "%Y-%m-%d")
            .ok()
            .map(|d| today.year() - d.year());
        if !matches!(age, Some(18..=100)) {
            report.warn("생년월일이 일반적인 범위를 벗어납니다");
        }
    }

    if let Some(date) = fields.initial_registration_date.as_deref() {
        if !is_iso_date(date) {
            report.error("최초등록일 형식이 올바르지 않습니다");
        }
    }

    if *document_type == DocumentType::VehicleRegistration {
        validate_vehicle_registration(fields, today, &mut report);
    }

    report
}

fn validate_vehicle_registration(
    fields: &StructuredFields,
    today: NaiveDate,
    report: &mut ValidationReport,
) {
    if let Some(date) = fields.manufacturing_date.as_deref() {
        let year = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .filter(|_| is_iso_date(date))
            .map(|d| d.year());
        let in_range = year.map(|y| y >= 1980 && y <= today.year()).unwrap_or(false);
        if !in_range {
            report.error("제조연일이 올바르지 않습니다");
        }
    }

    if let Some(mileage) = fields.mileage_km {
        if mileage > MILEAGE_WARN_KM {
            report.warn("주행거리가 일반적인 범위를 벗어납니다");
        }
    }

    if let Some(weight) = fields.gross_weight {
        if !(500..=50_000).contains(&weight) {
            report.warn("총중량이 일반적인 범위를 벗어납니다");
        }
    }

    if let Some(cc) = fields.engine_displacement {
        if !(50..=8000).contains(&cc) {
            report.warn("배기량이 일반적인 범위를 벗어납니다");
        }
    }

    if let Some(fuel) = fields.fuel_type.as_deref() {
        if !STANDARD_FUELS.contains(&fuel) {
            report.warn("연료 타입을 표준 형식으로 확인해주세요");
        }
    }

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|key| !fields.has(key))
        .collect();
    if !missing.is_empty() {
        report.error(format!("필수 필드가 누락됨: {}", missing.join(", ")));
    }
}

/// Coverage-based tier.
///
/// Vehicle registrations: high with >= 8 of 11 expected fields and no
/// errors, medium with >= 5 fields and at most one error, otherwise low.
/// Other document types are always medium.
pub fn calculate_confidence(
    fields: &StructuredFields,
    document_type: &DocumentType,
    errors: &[String],
) -> ExtractionConfidence {
    if *document_type != DocumentType::VehicleRegistration {
        return ExtractionConfidence::Medium;
    }

    let extracted = EXPECTED_FIELDS.iter().filter(|key| fields.has(key)).count();
    match (extracted, errors.len()) {
        (n, 0) if n >= 8 => ExtractionConfidence::High,
        (n, e) if n >= 5 && e <= 1 => ExtractionConfidence::Medium,
        _ => ExtractionConfidence::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn complete() -> StructuredFields {
        StructuredFields {
            license_plate: Some("12가3456".to_string()),
            vehicle_model: Some("소나타".to_string()),
            manufacturing_date: Some("2020-01-10".to_string()),
            chassis_number: Some("KMHL341CBLA123456".to_string()),
            registered_address: Some("서울특별시 강남구".to_string()),
            owner_name: Some("홍길동".to_string()),
            birth_date: Some("1980-01-15".to_string()),
            mileage_km: Some(45000),
            gross_weight: Some(1985),
            engine_displacement: Some(1999),
            fuel_type: Some("하이브리드".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_record_is_clean_and_high() {
        let fields = complete();
        let report = validate_at(&fields, &DocumentType::VehicleRegistration, today());
        assert!(report.errors.is_empty(), "Got: {:?}", report.errors);
        assert!(report.warnings.is_empty(), "Got: {:?}", report.warnings);
        assert_eq!(
            calculate_confidence(&fields, &DocumentType::VehicleRegistration, &report.errors),
            ExtractionConfidence::High
        );
    }

    #[test]
    fn test_invalid_vin_is_an_error() {
        let fields = StructuredFields {
            chassis_number: Some("INVALIDVIN123".to_string()),
            ..complete()
        };
        let report = validate_at(&fields, &DocumentType::VehicleRegistration, today());
        assert!(report.errors.iter().any(|e| e.contains("차대번호")), "Got: {:?}", report.errors);
    }

    #[test]
    fn test_vin_with_forbidden_letter_is_an_error() {
        let fields = StructuredFields {
            chassis_number: Some("KMHO341CBLA123456".to_string()),
            ..complete()
        };
        let report = validate_at(&fields, &DocumentType::VehicleRegistration, today());
        assert_eq!(report.errors.len(), 1, "Got: {:?}", report.errors);
    }

    #[test]
    fn test_missing_required_fields() {
        let fields = StructuredFields {
            vehicle_model: Some("소나타".to_string()),
            ..Default::default()
        };
        let report = validate_at(&fields, &DocumentType::VehicleRegistration, today());
        assert_eq!(
            report.errors,
            vec!["필수 필드가 누락됨: license_plate, owner_name".to_string()]
        );
    }

    #[test]
    fn test_required_fields_only_for_vehicle_registration() {
        let report = validate_at(&StructuredFields::default(), &DocumentType::Invoice, today());
        assert!(report.is_valid());
    }

    #[test]
    fn test_unusual_values_are_warnings() {
        let fields = StructuredFields {
            mileage_km: Some(1_200_000),
            gross_weight: Some(60_000),
            engine_displacement: Some(9000),
            fuel_type: Some("등유".to_string()),
            birth_date: Some("2015-01-01".to_string()),
            ..complete()
        };
        let report = validate_at(&fields, &DocumentType::VehicleRegistration, today());
        assert!(report.is_valid(), "Got: {:?}", report.errors);
        assert_eq!(report.warnings.len(), 5, "Got: {:?}", report.warnings);
    }

    #[test]
    fn test_manufacturing_date_in_future_is_error() {
        let fields = StructuredFields {
            manufacturing_date: Some("2030-01-01".to_string()),
            ..complete()
        };
        let report = validate_at(&fields, &DocumentType::VehicleRegistration, today());
        assert_eq!(report.errors, vec!["제조연일이 올바르지 않습니다".to_string()]);
    }

    #[test]
    fn test_confidence_tiers() {
        let vr = DocumentType::VehicleRegistration;
        let five = StructuredFields {
            license_plate: Some("12가3456".to_string()),
            vehicle_model: Some("소나타".to_string()),
            owner_name: Some("홍길동".to_string()),
            mileage_km: Some(10),
            fuel_type: Some("경유".to_string()),
            ..Default::default()
        };
        assert_eq!(calculate_confidence(&five, &vr, &[]), ExtractionConfidence::Medium);
        assert_eq!(
            calculate_confidence(&five, &vr, &["a".into(), "b".into()]),
            ExtractionConfidence::Low
        );
        assert_eq!(
            calculate_confidence(&complete(), &vr, &["a".into()]),
            ExtractionConfidence::Medium
        );
        assert_eq!(
            calculate_confidence(&StructuredFields::default(), &DocumentType::IdCard, &[]),
            ExtractionConfidence::Medium
        );
    }

    #[test]
    fn test_placeholder_values_do_not_count() {
        let mut fields = complete();
        fields.vehicle_model = Some("정보없음".to_string());
        fields.registered_address = Some("정보없음".to_string());
        fields.birth_date = Some("정보없음".to_string());
        fields.fuel_type = Some("정보없음".to_string());
        // 7 of 11 remain
        assert_eq!(
            calculate_confidence(&fields, &DocumentType::VehicleRegistration, &[]),
            ExtractionConfidence::Medium
        );
    }
}
