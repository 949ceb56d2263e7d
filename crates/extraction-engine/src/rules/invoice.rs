//! Commercial / export invoice, Korean or English labels

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{PlateMatch, StructuredFields};

use super::fill;
use crate::patterns::{document_date, first_match, labelled, number, trimmed, Rule, DATE_FRAGMENT};
use crate::plate;

/// Value running to the end of the line
const REST_OF_LINE: &str = r"([^\n\r]+)";

fn text_rules(korean: &'static str, english: &'static str) -> Vec<Rule<String>> {
    vec![
        Rule::new(korean, labelled(korean, REST_OF_LINE), trimmed),
        Rule::new(english, labelled(&format!("(?i){}", english), REST_OF_LINE), trimmed),
    ]
}

lazy_static! {
    static ref COMPANY_RULES: Vec<Rule<String>> =
        text_rules("(?:업체명|상호|수출자)", r"(?:shipper|exporter)(?:/exporter)?");
    static ref BUYER_RULES: Vec<Rule<String>> =
        text_rules("(?:구매자|수입자)", r"(?:buyer|consignee)(?:/consignee)?");
    static ref NOTIFY_RULES: Vec<Rule<String>> =
        text_rules("(?:통지처)", r"notify(?:[ \t]+party)?");
    static ref LOADING_RULES: Vec<Rule<String>> =
        text_rules("(?:선적항)", r"port[ \t]+of[ \t]+loading");
    static ref DISCHARGE_RULES: Vec<Rule<String>> =
        text_rules("(?:양하항|도착항)", r"port[ \t]+of[ \t]+discharge");
    static ref DESTINATION_RULES: Vec<Rule<String>> =
        text_rules("(?:최종목적지|목적지)", r"(?:final[ \t]+)?destination");
    static ref ITEM_RULES: Vec<Rule<String>> =
        text_rules("(?:품목|품명)", r"description(?:[ \t]+of[ \t]+goods)?");
    static ref INVOICE_NUMBER_RULES: Vec<Rule<String>> =
        text_rules("(?:송장번호|인보이스[ \t]*번호)", r"invoice[ \t]+no\.?(?:[ \t]*&[ \t]*date)?");

    static ref AMOUNT_RULES: Vec<Rule<u64>> = vec![
        Rule::new(
            "금액",
            Regex::new(r"(?:합계금액|총금액|금액|총액)[^\n0-9]{0,12}?([0-9][0-9,]*)").unwrap(),
            number,
        ),
        Rule::new(
            "amount",
            Regex::new(r"(?i)(?:total[ \t]+)?amount[^\n0-9]{0,16}?([0-9][0-9,]*)").unwrap(),
            number,
        ),
    ];

    static ref ISSUE_DATE_RULES: Vec<Rule<String>> = vec![
        Rule::new(
            "발행일",
            Regex::new(&format!(r"(?:발행일자?|작성일자?)[^\n0-9]*{}", DATE_FRAGMENT)).unwrap(),
            document_date,
        ),
        Rule::new(
            "date",
            Regex::new(&format!(r"(?i)(?:invoice[ \t]+)?date[^\n]*?{}", DATE_FRAGMENT)).unwrap(),
            document_date,
        ),
    ];
}

/// Fill invoice parties, ports, goods, amount, date and vehicle number
pub fn extract(
    text: &str,
    _filename: Option<&str>,
    fields: &mut StructuredFields,
) -> Option<PlateMatch> {
    fill(&mut fields.company_name, || first_match(&COMPANY_RULES, text));
    fill(&mut fields.buyer, || first_match(&BUYER_RULES, text));
    fill(&mut fields.notify_party, || first_match(&NOTIFY_RULES, text));
    fill(&mut fields.port_of_loading, || first_match(&LOADING_RULES, text));
    fill(&mut fields.port_of_discharge, || first_match(&DISCHARGE_RULES, text));
    fill(&mut fields.destination, || first_match(&DESTINATION_RULES, text));
    fill(&mut fields.item_description, || first_match(&ITEM_RULES, text));
    fill(&mut fields.invoice_number, || first_match(&INVOICE_NUMBER_RULES, text));
    fill(&mut fields.amount, || first_match(&AMOUNT_RULES, text));
    fill(&mut fields.issue_date, || first_match(&ISSUE_DATE_RULES, text));

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
    use pretty_assertions::assert_eq;

    fn run(text: &str) -> StructuredFields {
        let mut fields = StructuredFields::default();
        extract(text, None, &mut fields);
        fields
    }

    #[test]
    fn test_korean_invoice() {
        let fields = run("업체명: 한빛모터스\n품목: 중고차 소나타 12가3456\n금액: 15,000,000원\n발행일: 2024.05.02");

        assert_eq!(fields.company_name.as_deref(), Some("한빛모터스"));
        assert_eq!(fields.item_description.as_deref(), Some("중고차 소나타 12가3456"));
        assert_eq!(fields.amount, Some(15_000_000));
        assert_eq!(fields.issue_date.as_deref(), Some("2024-05-02"));
        assert_eq!(fields.license_plate.as_deref(), Some("12가3456"));
    }

    #[test]
    fn test_english_export_invoice() {
        let text = "COMMERCIAL INVOICE
Shipper/Exporter: HANBIT MOTORS CO., LTD.
Consignee: AL NOOR TRADING LLC
Notify Party: SAME AS CONSIGNEE
Port of Loading: INCHEON, KOREA
Port of Discharge: JEBEL ALI, UAE
Final Destination: DUBAI
Invoice No. & Date: HB-2024-031 / 2024-05-02
Description of Goods: USED CAR HYUNDAI SONATA
Total Amount: USD 8,500";
        let fields = run(text);

        assert_eq!(fields.company_name.as_deref(), Some("HANBIT MOTORS CO., LTD."));
        assert_eq!(fields.buyer.as_deref(), Some("AL NOOR TRADING LLC"));
        assert_eq!(fields.notify_party.as_deref(), Some("SAME AS CONSIGNEE"));
        assert_eq!(fields.port_of_loading.as_deref(), Some("INCHEON, KOREA"));
        assert_eq!(fields.port_of_discharge.as_deref(), Some("JEBEL ALI, UAE"));
        assert_eq!(fields.destination.as_deref(), Some("DUBAI"));
        assert_eq!(
            fields.invoice_number.as_deref(),
            Some("HB-2024-031 / 2024-05-02")
        );
        assert_eq!(fields.item_description.as_deref(), Some("USED CAR HYUNDAI SONATA"));
        assert_eq!(fields.amount, Some(8500));
        assert_eq!(fields.issue_date.as_deref(), Some("2024-05-02"));
    }
}
