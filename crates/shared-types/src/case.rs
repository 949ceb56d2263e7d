//! Canonical case record, one per export/deregistration case

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deregistration reasons printed on the application form, in form order
pub const DEREG_REASONS: &[&str] = &[
    "폐차",
    "반품",
    "행정처분이행",
    "수출예정",
    "도난",
    "횡령편취",
    "재해사고",
    "차령초과압류",
    "연구시험",
    "특수용도",
    "섬해체",
    "외교SOFA양도",
    "도로외한정",
    "기타",
    "지자체멸실인정",
];

/// Canonical fuel vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Gasoline,
    Diesel,
    Electric,
    Lpg,
    Hybrid,
    Cng,
    Hydrogen,
}

impl FuelType {
    pub const ALL: [FuelType; 7] = [
        FuelType::Gasoline,
        FuelType::Diesel,
        FuelType::Electric,
        FuelType::Lpg,
        FuelType::Hybrid,
        FuelType::Cng,
        FuelType::Hydrogen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Gasoline => "gasoline",
            FuelType::Diesel => "diesel",
            FuelType::Electric => "electric",
            FuelType::Lpg => "lpg",
            FuelType::Hybrid => "hybrid",
            FuelType::Cng => "cng",
            FuelType::Hydrogen => "hydrogen",
        }
    }
}

impl std::str::FromStr for FuelType {
    type Err = String;

    /// Case-insensitive parse of the canonical English name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        FuelType::ALL
            .into_iter()
            .find(|f| f.as_str() == lower)
            .ok_or_else(|| format!("unknown fuel type: {}", s))
    }
}

impl std::fmt::Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OwnerType {
    #[default]
    Individual,
    Business,
    Corporate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Owner {
    pub name: String,
    pub address: String,
    pub birth_date: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub owner_type: Option<OwnerType>,
    pub company_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vehicle {
    pub plate: String,
    pub vin: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel: Option<FuelType>,
    pub first_registered_at: String,
    pub manufacturing_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage_km: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displacement_cc: Option<u32>,
    pub engine_number: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeregistrationInfo {
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_certificate: Option<bool>,
    pub application_date: String, // YYYY-MM-DD
    pub applicant_birth: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
}

impl Transaction {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Commercial invoice block of an export case
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Invoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pol: Option<String>, // port of loading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>, // port of discharge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_and_date: Option<String>,
}

impl Invoice {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Canonical normalized record of one case, merged from every processed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaseSummary {
    pub owner: Owner,
    pub vehicle: Vehicle,
    pub dereg: DeregistrationInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<Invoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
