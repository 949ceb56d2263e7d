//! Korean ⇄ canonical fuel vocabulary

use shared_types::FuelType;

/// Printed Korean name of each canonical fuel
const KOREAN_NAMES: &[(&str, FuelType)] = &[
    ("휘발유", FuelType::Gasoline),
    ("경유", FuelType::Diesel),
    ("전기", FuelType::Electric),
    ("LPG", FuelType::Lpg),
    ("하이브리드", FuelType::Hybrid),
    ("CNG", FuelType::Cng),
    ("수소", FuelType::Hydrogen),
];

/// Loanword spellings seen on older certificates
const SYNONYMS: &[(&str, FuelType)] = &[("가솔린", FuelType::Gasoline), ("디젤", FuelType::Diesel)];

/// Map a Korean (or already canonical) fuel string into the closed vocabulary.
///
/// Returns `None` for empty input and for anything outside the vocabulary.
pub fn normalize_fuel(fuel: &str) -> Option<FuelType> {
    let fuel = fuel.trim();
    if fuel.is_empty() {
        return None;
    }

    KOREAN_NAMES
        .iter()
        .chain(SYNONYMS)
        .find(|(name, _)| name.eq_ignore_ascii_case(fuel))
        .map(|(_, f)| *f)
        .or_else(|| fuel.parse().ok())
}

pub fn korean_name(fuel: FuelType) -> &'static str {
    KOREAN_NAMES
        .iter()
        .find(|(_, f)| *f == fuel)
        .map(|(name, _)| *name)
        .unwrap_or_else(|| fuel.as_str())
}

/// Canonical name (any case) to its Korean form; other strings pass through
pub fn denormalize_fuel(fuel: &str) -> String {
    match fuel.parse::<FuelType>() {
        Ok(f) => korean_name(f).to_string(),
        Err(_) => fuel.to_string(),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn denormalize_then_normalize_is_identity(
            fuel in proptest::sample::select(FuelType::ALL.to_vec()),
            upper in any::<bool>()
        ) {
            let name = if upper {
                fuel.as_str().to_ascii_uppercase()
            } else {
                fuel.as_str().to_string()
            };
            prop_assert_eq!(normalize_fuel(&denormalize_fuel(&name)), Some(fuel));
        }

        #[test]
        fn non_vocabulary_strings_pass_through(s in "[a-z]{1,12}") {
            prop_assume!(s.parse::<FuelType>().is_err());
            prop_assert_eq!(denormalize_fuel(&s), s.clone());
            prop_assert_eq!(normalize_fuel(&s), None);
        }
    }
}
