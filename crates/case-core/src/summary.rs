//! StructuredFields → CaseSummary

use chrono::{DateTime, Local, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{
    CaseSummary, DeregistrationInfo, Invoice, Owner, OwnerType, StructuredFields, Vehicle,
};

use crate::fuel::normalize_fuel;

/// Reason preselected on every new application
pub const DEFAULT_DEREG_REASON: &str = "수출예정";
pub const DEFAULT_NEED_CERTIFICATE: bool = true;

lazy_static! {
    static ref KOREAN_DATE: Regex =
        Regex::new(r"([0-9]{4})[ \t]*년[ \t]*([0-9]{1,2})[ \t]*월[ \t]*([0-9]{1,2})[ \t]*일").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Collapse whitespace runs and drop zero-width characters
pub fn cleanup_text(text: &str) -> String {
    let visible: String = text
        .chars()
        .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        .collect();
    WHITESPACE.replace_all(&visible, " ").trim().to_string()
}

/// `2020년 3월 20일` → `2020-03-20`
pub fn parse_korean_date(text: &str) -> Option<String> {
    let caps = KOREAN_DATE.captures(text)?;
    Some(format!("{}-{:0>2}-{:0>2}", &caps[1], &caps[2], &caps[3]))
}

pub fn format_korean_date(year: i32, month: u32, day: u32) -> String {
    format!("{}년 {}월 {}일", year, month, day)
}

fn text(value: &Option<String>) -> String {
    value.as_deref().map(cleanup_text).unwrap_or_default()
}

/// Dates pass through unless written the Korean way
fn date(value: &Option<String>) -> String {
    let cleaned = text(value);
    parse_korean_date(&cleaned).unwrap_or(cleaned)
}

fn invoice(fields: &StructuredFields) -> Option<Invoice> {
    let invoice = Invoice {
        shipper: fields.company_name.clone(),
        buyer: fields.buyer.clone(),
        notify: fields.notify_party.clone(),
        pol: fields.port_of_loading.clone(),
        pod: fields.port_of_discharge.clone(),
        destination: fields.destination.clone(),
        item_desc: fields.item_description.clone(),
        amount: fields.amount,
        no_and_date: fields.invoice_number.clone().or_else(|| fields.issue_date.clone()),
        ..Default::default()
    };
    (!invoice.is_empty()).then_some(invoice)
}

pub fn to_case_summary(fields: &StructuredFields) -> CaseSummary {
    to_case_summary_at(fields, Utc::now())
}

/// Assemble the canonical record from one extraction.
///
/// Total: missing strings become `""`, missing numbers stay `None`. The
/// application date is today's local date at `now`.
pub fn to_case_summary_at(fields: &StructuredFields, now: DateTime<Utc>) -> CaseSummary {
    let birth_date = date(&fields.birth_date);
    let manufacturing_date = date(&fields.manufacturing_date);
    let first_registered_at = match date(&fields.initial_registration_date) {
        d if d.is_empty() => manufacturing_date.clone(),
        d => d,
    };
    let owner_name = match text(&fields.owner_name) {
        n if n.is_empty() => text(&fields.delegator),
        n => n,
    };

    CaseSummary {
        owner: Owner {
            name: owner_name,
            address: text(&fields.registered_address),
            birth_date: birth_date.clone(),
            owner_type: Some(OwnerType::Individual),
            ..Default::default()
        },
        vehicle: Vehicle {
            plate: text(&fields.license_plate).replace(' ', ""),
            vin: text(&fields.chassis_number).to_ascii_uppercase(),
            model: text(&fields.vehicle_model),
            fuel: fields.fuel_type.as_deref().and_then(normalize_fuel),
            first_registered_at,
            manufacturing_date,
            mileage_km: fields.mileage_km,
            weight_kg: fields.gross_weight,
            displacement_cc: fields.engine_displacement,
            engine_number: text(&fields.engine_number),
            color: text(&fields.vehicle_color),
        },
        dereg: DeregistrationInfo {
            reason: DEFAULT_DEREG_REASON.to_string(),
            need_certificate: Some(DEFAULT_NEED_CERTIFICATE),
            application_date: now.with_timezone(&Local).format("%Y-%m-%d").to_string(),
            applicant_birth: birth_date,
        },
        transaction: None,
        invoice: invoice(fields),
        additional_notes: None,
        created_at: Some(now),
        updated_at: Some(now),
    }
}
