//! Korean license plate recognition from OCR text and upload filenames

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{PlateMatch, PlateSource};

use crate::patterns::{is_hangul_syllable, PLATE_SYLLABLES, REGION_NAMES};

/// Filename-sourced candidates are trusted less than document text
pub const FILENAME_CONFIDENCE_FACTOR: f64 = 0.9;

struct PlatePattern {
    regex: Regex,
    confidence: f64,
    description: &'static str,
}

lazy_static! {
    static ref PLATE_PATTERNS: Vec<PlatePattern> = vec![
        PlatePattern {
            regex: Regex::new(r"(?-u:\b)([0-9]{2,3}[가-힣][0-9]{4})(?-u:\b)").unwrap(),
            confidence: 0.9,
            description: "basic plate",
        },
        PlatePattern {
            regex: Regex::new(r"(?-u:\b)([0-9]{2,3}[ \t]*[가-힣][ \t]*[0-9]{4})(?-u:\b)").unwrap(),
            confidence: 0.85,
            description: "plate with embedded spaces",
        },
        PlatePattern {
            regex: Regex::new(&format!(
                r"(?:{})[ \t]*([0-9]{{2,3}}[가-힣][0-9]{{4}})(?-u:\b)",
                REGION_NAMES.join("|")
            ))
            .unwrap(),
            confidence: 0.95,
            description: "region-prefixed plate",
        },
        PlatePattern {
            regex: Regex::new(r"(?-u:\b)([0-9]{2,3}로[0-9]{4})(?-u:\b)").unwrap(),
            confidence: 0.92,
            description: "로 series plate",
        },
    ];

    static ref PLATE_SHAPE: Regex = Regex::new(r"^[0-9]{2,3}[가-힣][0-9]{4}$").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[\s\-_.]").unwrap();
    static ref EXTENSION: Regex = Regex::new(r"\.[^/.]+$").unwrap();
}

/// Remove whitespace and separator punctuation from a raw candidate
pub fn clean_plate(raw: &str) -> String {
    SEPARATORS.replace_all(raw, "").into_owned()
}

/// Length in [6, 9], `NN(N)<syllable>NNNN` shape, and a whitelisted syllable
pub fn is_valid_plate(plate: &str) -> bool {
    let len = plate.chars().count();
    if !(6..=9).contains(&len) || !PLATE_SHAPE.is_match(plate) {
        return false;
    }
    plate
        .chars()
        .find(|c| is_hangul_syllable(*c))
        .map(|c| PLATE_SYLLABLES.contains(&c))
        .unwrap_or(false)
}

/// All valid candidates in discovery order: pattern order, then text order
fn candidates(text: &str, source: PlateSource) -> Vec<PlateMatch> {
    let factor = match source {
        PlateSource::Text => 1.0,
        PlateSource::Filename => FILENAME_CONFIDENCE_FACTOR,
    };

    let mut found = Vec::new();
    for pattern in PLATE_PATTERNS.iter() {
        for caps in pattern.regex.captures_iter(text) {
            let Some(raw) = caps.get(1) else { continue };
            let plate = clean_plate(raw.as_str());
            if is_valid_plate(&plate) {
                found.push(PlateMatch {
                    plate,
                    confidence: pattern.confidence * factor,
                    source,
                    pattern: pattern.description.to_string(),
                });
            }
        }
    }
    found
}

/// Highest-confidence candidate; the sort is stable so ties keep discovery order
fn best(mut found: Vec<PlateMatch>) -> Option<PlateMatch> {
    found.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    found.into_iter().next()
}

/// Best plate found in free text
pub fn extract_from_text(text: &str) -> Option<PlateMatch> {
    best(candidates(text, PlateSource::Text))
}

/// Best plate found in a filename, extension stripped, with reduced confidence
pub fn extract_from_filename(filename: &str) -> Option<PlateMatch> {
    let stem = EXTENSION.replace(filename, "");
    best(candidates(&stem, PlateSource::Filename))
}

/// Best plate across text and filename; text wins ties
pub fn extract(text: &str, filename: Option<&str>) -> Option<PlateMatch> {
    let mut found = candidates(text, PlateSource::Text);
    if let Some(name) = filename {
        let stem = EXTENSION.replace(name, "");
        found.extend(candidates(&stem, PlateSource::Filename));
    }

    let result = best(found);
    if let Some(m) = &result {
        tracing::debug!(
            plate = %m.plate,
            source = ?m.source,
            confidence = m.confidence,
            "plate recognized"
        );
    }
    result
}
