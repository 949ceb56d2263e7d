//! Last-write-wins merge of two case summaries
//!
//! Sections merge independently. Inside a section a field of `updated`
//! replaces the existing one only when present: a non-empty string or a
//! `Some`. Transaction, invoice and notes are replaced as whole values.

use chrono::{DateTime, Utc};
use shared_types::{CaseSummary, DeregistrationInfo, Owner, Vehicle};

fn string(existing: &str, updated: &str) -> String {
    let winner = if updated.is_empty() { existing } else { updated };
    winner.to_string()
}

fn option<T: Clone>(existing: &Option<T>, updated: &Option<T>) -> Option<T> {
    updated.clone().or_else(|| existing.clone())
}

fn merge_owner(existing: &Owner, updated: &Owner) -> Owner {
    Owner {
        name: string(&existing.name, &updated.name),
        address: string(&existing.address, &updated.address),
        birth_date: string(&existing.birth_date, &updated.birth_date),
        owner_type: option(&existing.owner_type, &updated.owner_type),
        company_name: string(&existing.company_name, &updated.company_name),
        phone: string(&existing.phone, &updated.phone),
    }
}

fn merge_vehicle(existing: &Vehicle, updated: &Vehicle) -> Vehicle {
    Vehicle {
        plate: string(&existing.plate, &updated.plate),
        vin: string(&existing.vin, &updated.vin),
        model: string(&existing.model, &updated.model),
        fuel: option(&existing.fuel, &updated.fuel),
        first_registered_at: string(&existing.first_registered_at, &updated.first_registered_at),
        manufacturing_date: string(&existing.manufacturing_date, &updated.manufacturing_date),
        mileage_km: option(&existing.mileage_km, &updated.mileage_km),
        weight_kg: option(&existing.weight_kg, &updated.weight_kg),
        displacement_cc: option(&existing.displacement_cc, &updated.displacement_cc),
        engine_number: string(&existing.engine_number, &updated.engine_number),
        color: string(&existing.color, &updated.color),
    }
}

fn merge_dereg(existing: &DeregistrationInfo, updated: &DeregistrationInfo) -> DeregistrationInfo {
    DeregistrationInfo {
        reason: string(&existing.reason, &updated.reason),
        need_certificate: option(&existing.need_certificate, &updated.need_certificate),
        application_date: string(&existing.application_date, &updated.application_date),
        applicant_birth: string(&existing.applicant_birth, &updated.applicant_birth),
    }
}

pub fn merge_case_summaries(existing: &CaseSummary, updated: &CaseSummary) -> CaseSummary {
    merge_case_summaries_at(existing, updated, Utc::now())
}

/// Merge `updated` over `existing`; `updatedAt` becomes `now`, `createdAt`
/// is kept from `existing` when it has one.
pub fn merge_case_summaries_at(
    existing: &CaseSummary,
    updated: &CaseSummary,
    now: DateTime<Utc>,
) -> CaseSummary {
    CaseSummary {
        owner: merge_owner(&existing.owner, &updated.owner),
        vehicle: merge_vehicle(&existing.vehicle, &updated.vehicle),
        dereg: merge_dereg(&existing.dereg, &updated.dereg),
        transaction: updated
            .transaction
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| existing.transaction.clone()),
        invoice: updated
            .invoice
            .clone()
            .filter(|i| !i.is_empty())
            .or_else(|| existing.invoice.clone()),
        additional_notes: updated
            .additional_notes
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| existing.additional_notes.clone()),
        created_at: existing.created_at.or(Some(now)),
        updated_at: Some(now),
    }
}
