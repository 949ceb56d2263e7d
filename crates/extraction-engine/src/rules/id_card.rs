//! Resident registration card / driver's licence
//!
//! The resident registration number is read only to derive the birth date
//! and is never stored.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use shared_types::{PlateMatch, StructuredFields};

use super::fill;
use crate::patterns::{
    document_date, first_match, labelled, person_name, trimmed, Rule, DATE_FRAGMENT,
};

lazy_static! {
    static ref NAME_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "성명",
            Regex::new(r"(?:성명|이름)[ \t]*[:：]?[ \t]*([가-힣]{2,5})(?:[^가-힣]|$)").unwrap(),
            person_name,
        ),
        Rule::new(
            "name with hanja",
            Regex::new(r"([가-힣]{2,4})[ \t]*\([\p{Han}]+\)").unwrap(),
            person_name,
        ),
        Rule::new(
            "standalone line",
            Regex::new(r"(?m)^[ \t]*([가-힣]{2,4})[ \t\r]*$").unwrap(),
            person_name,
        ),
    ];

    static ref BIRTH_DATE_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "resident registration number",
            Regex::new(r"(?-u:\b)([0-9]{2})([0-9]{2})([0-9]{2})[ \t]*-[ \t]*([1-8])[0-9*]{6}").unwrap(),
            rrn_birth_date,
        ),
        Rule::new("생년월일", labelled("생년월일", DATE_FRAGMENT), document_date),
    ];

    static ref ADDRESS_RULES: Vec<Rule<String>> = vec![
        Rule::new("주소", labelled("주소", r"([^\n]+)"), trimmed),
        Rule::new(
            "administrative unit",
            Regex::new(r"([가-힣]+(?:시|도|구|군)[ \t][^\n]+)").unwrap(),
            trimmed,
        ),
    ];
}

/// Birth date from `YYMMDD-G######`; the gender digit selects the century
fn rrn_birth_date(caps: &Captures) -> Option<String> {
    let yy: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;
    let century = match caps.get(4)?.as_str() {
        "1" | "2" | "5" | "6" => 1900,
        "3" | "4" | "7" | "8" => 2000,
        _ => return None,
    };
    let date = NaiveDate::from_ymd_opt(century + yy, month, day)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Fill name, birth date and address from an ID card
pub fn extract(
    text: &str,
    _filename: Option<&str>,
    fields: &mut StructuredFields,
) -> Option<PlateMatch> {
    fill(&mut fields.owner_name, || first_match(&NAME_RULES, text));
    fill(&mut fields.birth_date, || first_match(&BIRTH_DATE_RULES, text));
    fill(&mut fields.registered_address, || first_match(&ADDRESS_RULES, text));
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> StructuredFields {
        let mut fields = StructuredFields::default();
        extract(text, None, &mut fields);
        fields
    }

    #[test]
    fn test_resident_card() {
        let fields = run("주민등록증\n홍길동(洪吉童)\n800115-1234567\n서울특별시 강남구 테헤란로 123\n2015.3.2.");

        assert_eq!(fields.owner_name.as_deref(), Some("홍길동"));
        assert_eq!(fields.birth_date.as_deref(), Some("1980-01-15"));
        assert_eq!(
            fields.registered_address.as_deref(),
            Some("서울특별시 강남구 테헤란로 123")
        );
    }

    #[test]
    fn test_century_from_gender_digit() {
        assert_eq!(run("050302-3123456").birth_date.as_deref(), Some("2005-03-02"));
        assert_eq!(run("650302-2123456").birth_date.as_deref(), Some("1965-03-02"));
        assert_eq!(run("991231-6123456").birth_date.as_deref(), Some("1999-12-31"));
    }

    #[test]
    fn test_masked_number_still_yields_birth_date() {
        assert_eq!(run("800115-1******").birth_date.as_deref(), Some("1980-01-15"));
    }

    #[test]
    fn test_impossible_dates_are_rejected() {
        assert_eq!(run("800230-1234567").birth_date, None);
        assert_eq!(run("801315-1234567").birth_date, None);
    }

    #[test]
    fn test_rrn_never_stored() {
        let fields = run("성명: 김철수\n800115-1234567");
        let json = serde_json::to_string(&fields).unwrap();
        assert!(!json.contains("1234567"), "Got: {}", json);
    }
}
