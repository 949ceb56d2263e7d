//! Flat extraction output, one record per processed document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::report::ValidationReport;

// ============================================================
// Document types
// ============================================================

/// Kind of document handed to the extractor.
///
/// Unknown type strings are kept verbatim so they can be echoed back in the
/// pass-through record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
    VehicleRegistration,
    IdCard,
    DelegationForm,
    Invoice,
    Other(String),
}

impl DocumentType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "VEHICLE_REGISTRATION" => Self::VehicleRegistration,
            "ID_CARD" => Self::IdCard,
            "DELEGATION_FORM" => Self::DelegationForm,
            "INVOICE" => Self::Invoice,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::VehicleRegistration => "VEHICLE_REGISTRATION",
            Self::IdCard => "ID_CARD",
            Self::DelegationForm => "DELEGATION_FORM",
            Self::Invoice => "INVOICE",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for DocumentType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<DocumentType> for String {
    fn from(t: DocumentType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse confidence tier derived from field coverage and error count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionConfidence {
    High,
    Medium,
    #[default]
    Low,
}

impl ExtractionConfidence {
    /// Lenient parse used for engine output, which may carry a tier name or a score
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "high" => Some(Self::High),
                "medium" => Some(Self::Medium),
                "low" => Some(Self::Low),
                _ => None,
            },
            Value::Number(n) => {
                let mut score = n.as_f64()?;
                if !score.is_finite() || score < 0.0 {
                    return None;
                }
                if score > 1.0 {
                    score /= 100.0;
                }
                Some(if score >= 0.8 {
                    Self::High
                } else if score >= 0.5 {
                    Self::Medium
                } else {
                    Self::Low
                })
            }
            _ => None,
        }
    }
}

// ============================================================
// Structured fields
// ============================================================

/// Flat field map produced by one extraction call.
///
/// Dates are `YYYY-MM-DD`. Numeric fields are non-negative by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis_number: Option<String>, // VIN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_registration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_displacement: Option<u32>, // cc
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_weight: Option<u32>, // kg
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage_km: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_color: Option<String>,

    // Delegation form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegation_purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegation_date: Option<String>,

    // Invoice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>, // shipper / issuing company
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_of_loading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_of_discharge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>, // "No. & Date" cell as printed
}

/// String keys accepted from engines, with the alias each one may arrive under
const STRING_KEYS: &[(&str, &[&str])] = &[
    ("license_plate", &["vehicle_number", "plate"]),
    ("vehicle_model", &["model"]),
    ("chassis_number", &["vin"]),
    ("owner_name", &["name"]),
    ("registered_address", &["address"]),
    ("birth_date", &[]),
    ("initial_registration_date", &[]),
    ("manufacturing_date", &[]),
    ("fuel_type", &["fuel"]),
    ("engine_number", &[]),
    ("vehicle_color", &["color"]),
    ("delegator", &[]),
    ("delegate", &[]),
    ("delegation_purpose", &[]),
    ("delegation_date", &[]),
    ("company_name", &["shipper"]),
    ("buyer", &["consignee"]),
    ("notify_party", &["notify"]),
    ("port_of_loading", &["pol"]),
    ("port_of_discharge", &["pod"]),
    ("destination", &[]),
    ("item_description", &["item"]),
    ("issue_date", &[]),
    ("invoice_number", &[]),
];

impl StructuredFields {
    /// Build fields from an engine-native JSON object.
    ///
    /// Numbers may arrive as JSON numbers or as digit strings with thousands
    /// separators; negative and non-finite values are dropped. Empty strings
    /// count as absent. Non-object input yields an empty record.
    pub fn from_value(value: &Value) -> Self {
        let mut fields = Self::default();
        let Some(obj) = value.as_object() else {
            return fields;
        };

        for (key, aliases) in STRING_KEYS {
            let text = lookup(obj, key, aliases).and_then(value_to_string);
            if let Some(text) = text {
                fields.set_string(key, text);
            }
        }

        fields.engine_displacement = lookup(obj, "engine_displacement", &["displacement"])
            .and_then(safe_number)
            .and_then(to_u32);
        fields.gross_weight = lookup(obj, "gross_weight", &["weight"])
            .and_then(safe_number)
            .and_then(to_u32);
        fields.mileage_km = lookup(obj, "mileage_km", &["mileage"])
            .and_then(safe_number)
            .and_then(to_u32);
        fields.amount = lookup(obj, "amount", &[])
            .and_then(safe_number)
            .map(|n| n as u64);

        fields
    }

    fn set_string(&mut self, key: &str, value: String) {
        let slot = match key {
            "license_plate" => &mut self.license_plate,
            "vehicle_model" => &mut self.vehicle_model,
            "chassis_number" => &mut self.chassis_number,
            "owner_name" => &mut self.owner_name,
            "registered_address" => &mut self.registered_address,
            "birth_date" => &mut self.birth_date,
            "initial_registration_date" => &mut self.initial_registration_date,
            "manufacturing_date" => &mut self.manufacturing_date,
            "fuel_type" => &mut self.fuel_type,
            "engine_number" => &mut self.engine_number,
            "vehicle_color" => &mut self.vehicle_color,
            "delegator" => &mut self.delegator,
            "delegate" => &mut self.delegate,
            "delegation_purpose" => &mut self.delegation_purpose,
            "delegation_date" => &mut self.delegation_date,
            "company_name" => &mut self.company_name,
            "buyer" => &mut self.buyer,
            "notify_party" => &mut self.notify_party,
            "port_of_loading" => &mut self.port_of_loading,
            "port_of_discharge" => &mut self.port_of_discharge,
            "destination" => &mut self.destination,
            "item_description" => &mut self.item_description,
            "issue_date" => &mut self.issue_date,
            "invoice_number" => &mut self.invoice_number,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Whether the named field carries a value.
    ///
    /// The literal "정보없음" ("no information") that vision models emit for
    /// unreadable cells counts as absent.
    pub fn has(&self, key: &str) -> bool {
        fn text(v: &Option<String>) -> bool {
            v.as_deref()
                .map(|s| !s.trim().is_empty() && s != "정보없음")
                .unwrap_or(false)
        }
        match key {
            "license_plate" => text(&self.license_plate),
            "vehicle_model" => text(&self.vehicle_model),
            "chassis_number" => text(&self.chassis_number),
            "owner_name" => text(&self.owner_name),
            "registered_address" => text(&self.registered_address),
            "birth_date" => text(&self.birth_date),
            "initial_registration_date" => text(&self.initial_registration_date),
            "manufacturing_date" => text(&self.manufacturing_date),
            "engine_displacement" => self.engine_displacement.is_some(),
            "gross_weight" => self.gross_weight.is_some(),
            "fuel_type" => text(&self.fuel_type),
            "mileage_km" => self.mileage_km.is_some(),
            "engine_number" => text(&self.engine_number),
            "vehicle_color" => text(&self.vehicle_color),
            "delegator" => text(&self.delegator),
            "delegate" => text(&self.delegate),
            "delegation_purpose" => text(&self.delegation_purpose),
            "delegation_date" => text(&self.delegation_date),
            "company_name" => text(&self.company_name),
            "buyer" => text(&self.buyer),
            "notify_party" => text(&self.notify_party),
            "port_of_loading" => text(&self.port_of_loading),
            "port_of_discharge" => text(&self.port_of_discharge),
            "destination" => text(&self.destination),
            "item_description" => text(&self.item_description),
            "amount" => self.amount.is_some(),
            "issue_date" => text(&self.issue_date),
            "invoice_number" => text(&self.invoice_number),
            _ => false,
        }
    }

    /// Overlay `other` on top of `self`: every value present in `other` wins.
    pub fn overlay(&mut self, other: &StructuredFields) {
        macro_rules! take {
            ($($f:ident),* $(,)?) => {
                $( if other.$f.is_some() { self.$f = other.$f.clone(); } )*
            };
        }
        take!(
            license_plate,
            vehicle_model,
            chassis_number,
            owner_name,
            registered_address,
            birth_date,
            initial_registration_date,
            manufacturing_date,
            engine_displacement,
            gross_weight,
            fuel_type,
            mileage_km,
            engine_number,
            vehicle_color,
            delegator,
            delegate,
            delegation_purpose,
            delegation_date,
            company_name,
            buyer,
            notify_party,
            port_of_loading,
            port_of_discharge,
            destination,
            item_description,
            amount,
            issue_date,
            invoice_number,
        );
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, key: &str, aliases: &[&str]) -> Option<&'a Value> {
    std::iter::once(key)
        .chain(aliases.iter().copied())
        .filter_map(|k| obj.get(k))
        .find(|v| !v.is_null())
}

fn value_to_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Coerce a JSON number or numeric string into a non-negative finite value.
///
/// Strings may carry thousands separators and a trailing unit ("1,985 kg").
pub fn safe_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            let numeric: String = cleaned
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            numeric.parse::<f64>().ok()?
        }
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}

fn to_u32(n: f64) -> Option<u32> {
    (n <= u32::MAX as f64).then_some(n as u32)
}

// ============================================================
// Extraction result
// ============================================================

/// Where a plate candidate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateSource {
    Text,
    Filename,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateMatch {
    pub plate: String,
    pub confidence: f64,
    pub source: PlateSource,
    pub pattern: String, // human-readable rule name
}

/// Output of the extraction entry point: flat fields plus bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub document_type: DocumentType,
    pub processed_at: DateTime<Utc>,
    pub confidence: ExtractionConfidence,
    #[serde(flatten)]
    pub fields: StructuredFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate_match: Option<PlateMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>, // only for pass-through records
    #[serde(default)]
    pub validation: ValidationReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_document_type_parse() {
        assert_eq!(
            DocumentType::parse("vehicle_registration"),
            DocumentType::VehicleRegistration
        );
        assert_eq!(DocumentType::parse("ID-CARD"), DocumentType::IdCard);
        assert_eq!(
            DocumentType::parse("PASSPORT"),
            DocumentType::Other("PASSPORT".to_string())
        );
        assert_eq!(DocumentType::Invoice.to_string(), "INVOICE");
    }

    #[test]
    fn test_from_value_accepts_aliases_and_strings() {
        let fields = StructuredFields::from_value(&json!({
            "vehicle_number": "12가3456",
            "name": "홍길동",
            "address": "서울특별시 강남구",
            "mileage": "45,000",
            "gross_weight": 1985,
            "engine_displacement": "1999 cc",
            "fuel_type": ""
        }));

        assert_eq!(fields.license_plate.as_deref(), Some("12가3456"));
        assert_eq!(fields.owner_name.as_deref(), Some("홍길동"));
        assert_eq!(fields.registered_address.as_deref(), Some("서울특별시 강남구"));
        assert_eq!(fields.mileage_km, Some(45000));
        assert_eq!(fields.gross_weight, Some(1985));
        assert_eq!(fields.engine_displacement, Some(1999));
        assert_eq!(fields.fuel_type, None, "Empty strings should count as absent");
    }

    #[test]
    fn test_safe_number_discards_negative_and_garbage() {
        assert_eq!(safe_number(&json!(-5)), None);
        assert_eq!(safe_number(&json!("-12")), None);
        assert_eq!(safe_number(&json!("abc")), None);
        assert_eq!(safe_number(&json!(null)), None);
        assert_eq!(safe_number(&json!("1,234.5")), Some(1234.5));
    }

    #[test]
    fn test_has_treats_placeholder_as_absent() {
        let fields = StructuredFields {
            owner_name: Some("정보없음".to_string()),
            mileage_km: Some(0),
            ..Default::default()
        };
        assert!(!fields.has("owner_name"));
        assert!(fields.has("mileage_km"));
        assert!(!fields.has("no_such_field"));
    }

    #[test]
    fn test_overlay_later_values_win() {
        let mut base = StructuredFields {
            license_plate: Some("12가3456".to_string()),
            owner_name: Some("홍길동".to_string()),
            ..Default::default()
        };
        let update = StructuredFields {
            license_plate: Some("34나5678".to_string()),
            mileage_km: Some(100),
            ..Default::default()
        };
        base.overlay(&update);

        assert_eq!(base.license_plate.as_deref(), Some("34나5678"));
        assert_eq!(base.owner_name.as_deref(), Some("홍길동"));
        assert_eq!(base.mileage_km, Some(100));
    }

    #[test]
    fn test_confidence_from_score() {
        assert_eq!(
            ExtractionConfidence::from_value(&json!(0.93)),
            Some(ExtractionConfidence::High)
        );
        assert_eq!(
            ExtractionConfidence::from_value(&json!(62)),
            Some(ExtractionConfidence::Medium)
        );
        assert_eq!(
            ExtractionConfidence::from_value(&json!("LOW")),
            Some(ExtractionConfidence::Low)
        );
        assert_eq!(ExtractionConfidence::from_value(&json!(true)), None);
    }

    #[test]
    fn test_extraction_result_flattens_fields() {
        let result = ExtractionResult {
            document_type: DocumentType::VehicleRegistration,
            processed_at: DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            confidence: ExtractionConfidence::Medium,
            fields: StructuredFields {
                license_plate: Some("12가3456".to_string()),
                ..Default::default()
            },
            plate_match: None,
            raw_text: None,
            validation: ValidationReport::default(),
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["license_plate"], "12가3456");
        assert_eq!(value["document_type"], "VEHICLE_REGISTRATION");
        assert_eq!(value["confidence"], "medium");

        let back: ExtractionResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }
}
