//! Delegation form (위임장)

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{PlateMatch, StructuredFields};

use super::fill;
use crate::patterns::{document_date, first_match, labelled, trimmed, Rule, DATE_FRAGMENT};
use crate::plate;

lazy_static! {
    static ref DELEGATOR_RULES: Vec<Rule<String>> = vec![
        Rule::new("위임자", labelled("(?:위임자|위임인)", r"([^\n\r]+)"), trimmed),
    ];

    static ref DELEGATE_RULES: Vec<Rule<String>> = vec![
        Rule::new("수임자", labelled("(?:수임자|수임인|대리인)", r"([^\n\r]+)"), trimmed),
    ];

    static ref PURPOSE_RULES: Vec<Rule<String>> = vec![
        Rule::new("위임사항", labelled("(?:위임사항|위임내용)", r"([^\n\r]+)"), trimmed),
    ];

    static ref DATE_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "위임일",
            Regex::new(&format!(r"(?:위임일자?|작성일자?)[^\n0-9]*{}", DATE_FRAGMENT)).unwrap(),
            document_date,
        ),
    ];
}

/// Fill delegator, delegate, purpose, vehicle number and date from a delegation form
pub fn extract(
    text: &str,
    _filename: Option<&str>,
    fields: &mut StructuredFields,
) -> Option<PlateMatch> {
    fill(&mut fields.delegator, || first_match(&DELEGATOR_RULES, text));
    fill(&mut fields.delegate, || first_match(&DELEGATE_RULES, text));
    fill(&mut fields.delegation_purpose, || first_match(&PURPOSE_RULES, text));
    fill(&mut fields.delegation_date, || first_match(&DATE_RULES, text));

    if fields.license_plate.is_some() {
        return None;
    }
    let plate_match = plate::extract_from_text(text);
    fields.license_plate = plate_match.as_ref().map(|m| m.plate.clone());
    plate_match
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegation_form() {
        let text = "위 임 장\n위임자: 홍길동\n수임자: 김대리\n위임사항: 자동차 말소등록 신청\n차량번호 12가3456\n위임일: 2024년 5월 1일";
        let mut fields = StructuredFields::default();
        let plate_match = extract(text, None, &mut fields);

        assert_eq!(fields.delegator.as_deref(), Some("홍길동"));
        assert_eq!(fields.delegate.as_deref(), Some("김대리"));
        assert_eq!(fields.delegation_purpose.as_deref(), Some("자동차 말소등록 신청"));
        assert_eq!(fields.delegation_date.as_deref(), Some("2024-05-01"));
        assert_eq!(fields.license_plate.as_deref(), Some("12가3456"));
        assert!(plate_match.is_some());
    }

    #[test]
    fn test_missing_labels_leave_fields_empty() {
        let mut fields = StructuredFields::default();
        extract("판독 불가", None, &mut fields);
        assert!(fields.is_empty());
    }
}
