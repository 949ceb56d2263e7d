//! Vehicle registration certificate (자동차등록증)
//!
//! Scalar fields take the first match that validates. Mileage is the
//! exception: certificates list one odometer reading per periodic
//! inspection, so every candidate is collected and the largest wins.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use shared_types::{PlateMatch, StructuredFields};

use super::fill;
use crate::patterns::{
    all_matches, compact, contains_hangul, document_date, first_match, labelled, number,
    person_name, trimmed, Rule, DATE_FRAGMENT, FUEL_WORDS, REGION_NAMES,
};
use crate::plate;
use crate::validator::is_valid_vin;

pub const DISPLACEMENT_RANGE_CC: std::ops::RangeInclusive<u64> = 50..=8000;
pub const WEIGHT_RANGE_KG: std::ops::RangeInclusive<u64> = 500..=50_000;
/// Exclusive bounds on a plausible odometer reading
pub const MILEAGE_BOUNDS_KM: (u64, u64) = (0, 2_000_000);

const MANUFACTURERS: &str = "현대|기아|삼성|쌍용|GM대우|한국GM|르노삼성|쉐보레";

lazy_static! {
    /// Lenient plate patterns used when the recognizer finds nothing
    static ref PLATE_FALLBACK: Vec<Rule<String>> = vec![
        Rule::new(
            "labelled plate",
            labelled(
                "(?:자동차등록번호|등록번호|차량번호)",
                r"([0-9]{2,3}[ \t]*[가-힣]+[ \t]*[0-9]{3,4})",
            ),
            plate_like,
        ),
        Rule::new(
            "unlisted syllable plate",
            Regex::new(r"(?-u:\b)([0-9]{2,3}[가-힣][0-9]{4})(?-u:\b)").unwrap(),
            plate_like,
        ),
        Rule::new(
            "multi-syllable plate",
            Regex::new(r"([0-9]{2,3}[가-힣]+[0-9]{3,4})").unwrap(),
            plate_like,
        ),
    ];

    static ref MODEL_RULES: Vec<Rule<String>> = vec![
        Rule::new("차명", labelled("차명", r"([^\n,]+)"), trimmed),
        Rule::new("차종", labelled("차종", r"([^\n,]+)"), trimmed),
        Rule::new(
            "manufacturer",
            Regex::new(&format!(r"((?:{})[ \t]*[가-힣A-Za-z0-9 \-]+)", MANUFACTURERS)).unwrap(),
            trimmed,
        ),
        Rule::new(
            "body type",
            Regex::new(r"(렉스턴|세단|SUV|트럭|버스|승합차|화물차)").unwrap(),
            trimmed,
        ),
    ];

    static ref VIN_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "차대번호",
            labelled(
                "(?:차대번호|차체번호)",
                r"([A-HJ-NPR-Z0-9][A-HJ-NPR-Z0-9 \t]{16,24})",
            ),
            vin,
        ),
        Rule::new(
            "Korean manufacturer VIN",
            Regex::new(r"(?-u:\b)(K[MNP][A-HJ-NPR-Z0-9]{15})(?-u:\b)").unwrap(),
            vin,
        ),
        Rule::new(
            "bare VIN",
            Regex::new(r"(?-u:\b)([A-HJ-NPR-Z0-9]{17})(?-u:\b)").unwrap(),
            vin,
        ),
    ];

    static ref ADDRESS_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "사용본거지/주소",
            labelled("(?:사용본거지|본거지|주소)", r"([^\n]+)"),
            trimmed,
        ),
        Rule::new(
            "region-led address",
            Regex::new(&format!(r"((?:{})[가-힣]*[ \t]+[^\n]+)", REGION_NAMES.join("|"))).unwrap(),
            trimmed,
        ),
    ];

    static ref NAME_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "성명",
            Regex::new(r"성명(?:\([^)\n]*\))?[ \t]*[:：]?[ \t]*([가-힣]{2,5})(?:[^가-힣]|$)").unwrap(),
            person_name,
        ),
        Rule::new(
            "소유자",
            Regex::new(r"소유자[ \t]*[:：]?[ \t]*([가-힣]{2,5})(?:[^가-힣]|$)").unwrap(),
            person_name,
        ),
        Rule::new(
            "이름",
            Regex::new(r"이름[ \t]*[:：]?[ \t]*([가-힣]{2,5})(?:[^가-힣]|$)").unwrap(),
            person_name,
        ),
        Rule::new(
            "(개인) marker",
            Regex::new(r"([가-힣]{2,4})[ \t]*\(개인\)").unwrap(),
            person_name,
        ),
        Rule::new(
            "standalone line",
            Regex::new(r"(?m)^[ \t]*([가-힣]{2,4})[ \t\r]*$").unwrap(),
            person_name,
        ),
    ];

    static ref BIRTH_DATE_RULES: Vec<Rule<String>> = vec![
        Rule::new("생년월일", labelled("생년월일", DATE_FRAGMENT), document_date),
    ];

    static ref REGISTRATION_DATE_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "최초등록일",
            Regex::new(&format!(r"(?:최초[ \t]*등록일?|등록일)[^\n0-9]*{}", DATE_FRAGMENT)).unwrap(),
            document_date,
        ),
    ];

    static ref MANUFACTURING_DATE_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "제조연월일",
            Regex::new(&format!(
                r"(?:제조연월일|제작연월일|제조일자?|제작일자?|제조|제작)[^\n0-9]*{}",
                DATE_FRAGMENT
            ))
            .unwrap(),
            document_date,
        ),
    ];

    static ref BARE_DATE: Regex = Regex::new(DATE_FRAGMENT).unwrap();

    static ref DISPLACEMENT_RULES: Vec<Rule<u64>> = vec![
        Rule::new(
            "배기량",
            Regex::new(r"배기량[^\n0-9]{0,12}?([0-9][0-9,]*)").unwrap(),
            displacement,
        ),
        Rule::new(
            "cc suffix",
            Regex::new(r"(?i)([0-9][0-9,]*)[ \t]*(?:cc|㏄|시시)").unwrap(),
            displacement,
        ),
    ];

    static ref WEIGHT_RULES: Vec<Rule<u64>> = vec![
        Rule::new(
            "총중량",
            Regex::new(r"총중량[^\n0-9]{0,12}?([0-9][0-9,]*)").unwrap(),
            weight,
        ),
        Rule::new(
            "kg before 총중량",
            Regex::new(r"(?i)([0-9][0-9,]*)[ \t]*kg[ \t]*총중량").unwrap(),
            weight,
        ),
        Rule::new(
            "중량 with unit",
            Regex::new(r"(?i)중량[ \t]*[:：]?[ \t]*([0-9][0-9,]*)[ \t]*(?:kg|킬로)").unwrap(),
            weight,
        ),
    ];

    static ref FUEL_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "연료",
            Regex::new(&format!(
                r"(?i)연료(?:의)?[ \t]*(?:종류)?[^\n가-힣A-Za-z]{{0,4}}({})",
                FUEL_WORDS.join("|")
            ))
            .unwrap(),
            fuel_word,
        ),
        Rule::new(
            "bare fuel word",
            Regex::new(&format!(r"(?i)({})", FUEL_WORDS.join("|"))).unwrap(),
            fuel_word,
        ),
    ];

    static ref MILEAGE_RULES: Vec<Rule<u64>> = vec![
        Rule::new(
            "km suffix",
            // 킬로그램 is a weight
            Regex::new(r"(?i)([0-9][0-9,]*)[ \t]*(?:km|(?:키로|킬로)(?:[^그]|$))").unwrap(),
            mileage,
        ),
        Rule::new(
            "주행거리",
            Regex::new(r"주행거리[^\n0-9]{0,12}?([0-9][0-9,]*)").unwrap(),
            mileage,
        ),
        Rule::new(
            "거리",
            Regex::new(r"(?:^|[^가-힣])거리[ \t]*[:：]?[ \t]*([0-9][0-9,]*)").unwrap(),
            mileage,
        ),
    ];

    static ref ENGINE_NUMBER_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "원동기형식",
            labelled("(?:원동기형식|원동기번호|엔진번호|엔진형식)", r"([A-Za-z0-9\-]+)"),
            trimmed,
        ),
    ];

    static ref COLOR_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "색상",
            labelled("(?:차량색상|차량색|색상)", r"([가-힣A-Za-z]+)"),
            trimmed,
        ),
    ];
}

// ============================================================
// Capture parsers
// ============================================================

fn plate_like(caps: &Captures) -> Option<String> {
    compact(caps).filter(|p| contains_hangul(p))
}

fn vin(caps: &Captures) -> Option<String> {
    compact(caps).filter(|v| is_valid_vin(v))
}

fn displacement(caps: &Captures) -> Option<u64> {
    number(caps).filter(|v| DISPLACEMENT_RANGE_CC.contains(v))
}

fn weight(caps: &Captures) -> Option<u64> {
    number(caps).filter(|v| WEIGHT_RANGE_KG.contains(v))
}

fn mileage(caps: &Captures) -> Option<u64> {
    let (low, high) = MILEAGE_BOUNDS_KM;
    number(caps).filter(|v| *v > low && *v < high)
}

/// Fold fuel synonyms at extraction time (가솔린 → 휘발유, 디젤 → 경유)
fn fuel_word(caps: &Captures) -> Option<String> {
    let word = caps.get(1)?.as_str();
    let folded = match word.to_lowercase().as_str() {
        "가솔린" => "휘발유".to_string(),
        "디젤" => "경유".to_string(),
        "lpg" => "LPG".to_string(),
        "cng" => "CNG".to_string(),
        _ => word.to_string(),
    };
    Some(folded)
}

// ============================================================
// Field extractors
// ============================================================

/// Largest plausible odometer reading among every candidate in the text
pub fn extract_mileage(text: &str) -> Option<u64> {
    let candidates = all_matches(&MILEAGE_RULES, text);
    let max = candidates.iter().copied().max();
    if let Some(max) = max {
        tracing::debug!(?candidates, selected = max, "mileage candidates");
    }
    max
}

/// First plausible VIN; labelled and Korean-prefixed numbers are tried first
pub fn extract_vin(text: &str) -> Option<String> {
    first_match(&VIN_RULES, text)
}

fn extract_manufacturing_date(text: &str) -> Option<String> {
    first_match(&MANUFACTURING_DATE_RULES, text).or_else(|| {
        // Any date not on a birth or registration line
        text.lines()
            .filter(|line| !line.contains("생년월일") && !line.contains("등록"))
            .find_map(|line| {
                BARE_DATE
                    .captures_iter(line)
                    .find_map(|caps| document_date(&caps))
            })
    })
}

fn to_u32(value: u64) -> Option<u32> {
    u32::try_from(value).ok()
}

/// Fill every empty field of a vehicle registration record from OCR text
pub fn extract(
    text: &str,
    filename: Option<&str>,
    fields: &mut StructuredFields,
) -> Option<PlateMatch> {
    let mut plate_match = None;
    if fields.license_plate.is_none() {
        plate_match = plate::extract(text, filename);
        fields.license_plate = match &plate_match {
            Some(m) => Some(m.plate.clone()),
            None => first_match(&PLATE_FALLBACK, text),
        };
    }

    fill(&mut fields.vehicle_model, || first_match(&MODEL_RULES, text));
    fill(&mut fields.chassis_number, || extract_vin(text));
    fill(&mut fields.registered_address, || first_match(&ADDRESS_RULES, text));
    fill(&mut fields.owner_name, || first_match(&NAME_RULES, text));
    fill(&mut fields.birth_date, || first_match(&BIRTH_DATE_RULES, text));
    fill(&mut fields.initial_registration_date, || {
        first_match(&REGISTRATION_DATE_RULES, text)
    });
    fill(&mut fields.manufacturing_date, || extract_manufacturing_date(text));
    fill(&mut fields.engine_displacement, || {
        first_match(&DISPLACEMENT_RULES, text).and_then(to_u32)
    });
    fill(&mut fields.gross_weight, || {
        first_match(&WEIGHT_RULES, text).and_then(to_u32)
    });
    fill(&mut fields.fuel_type, || first_match(&FUEL_RULES, text));
    fill(&mut fields.mileage_km, || extract_mileage(text).and_then(to_u32));
    fill(&mut fields.engine_number, || first_match(&ENGINE_NUMBER_RULES, text));
    fill(&mut fields.vehicle_color, || first_match(&COLOR_RULES, text));

    plate_match
}
