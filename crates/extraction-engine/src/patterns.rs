//! Rule tables and shared parsing helpers for field extraction
//!
//! Every field is extracted by an ordered table of [`Rule`]s. A rule pairs a
//! regex with a parse function that doubles as the validity predicate: a
//! match whose parse returns `None` is discarded and evaluation continues
//! with the next match, then the next rule.
//!
//! Rust's `\b` and `\d` are Unicode-aware (Hangul counts as a word
//! character), so tables use `(?-u:\b)` and `[0-9]` where an ASCII boundary
//! or digit is meant, and `[ \t]` so that a label never reaches into the
//! following line.

use chrono::NaiveDate;
use regex::{Captures, Regex};

/// Region names that may prefix a plate or start an address
pub const REGION_NAMES: &[&str] = &[
    "서울", "부산", "대구", "인천", "광주", "대전", "울산", "세종", "경기", "강원", "충북", "충남",
    "전북", "전남", "경북", "경남", "제주",
];

/// Syllables that actually appear in the middle of Korean plates
pub const PLATE_SYLLABLES: &[char] = &[
    '가', '나', '다', '라', '마', '거', '너', '더', '러', '머', '고', '노', '도', '로', '모', '구',
    '누', '두', '루', '무', '바', '사', '아', '자', '카', '타', '파', '하', '허', '호',
];

/// Hangul words that sit next to names on forms but are never names themselves
pub const NAME_STOPWORDS: &[&str] = &[
    "성명", "이름", "소유자", "사용자", "주소", "생년월일", "등록번호", "자동차", "등록증",
    "자동차등록증", "차명", "차종", "연료", "색상", "검사", "주행거리", "정보", "개인", "법인",
    "사용본거지", "주민등록증", "운전면허증", "대한민국", "위임장", "위임자", "수임자", "인보이스",
    "정보없음",
];

/// Fuel words recognized in text, including the synonyms folded at extraction time
pub const FUEL_WORDS: &[&str] = &[
    "휘발유", "경유", "LPG", "전기", "하이브리드", "CNG", "수소", "가솔린", "디젤",
];

/// `YYYY년 MM월 DD일`, `YYYY.MM.DD`, `YYYY-MM-DD` and friends; three capture groups
pub const DATE_FRAGMENT: &str = r"([0-9]{4})(?:[ \t]*[./\-년][ \t]*|[ \t]+)([0-9]{1,2})(?:[ \t]*[./\-월][ \t]*|[ \t]+)([0-9]{1,2})[ \t]*일?";

/// Optional separator between a label and its value
pub const LABEL_SEP: &str = r"[ \t]*[:：]?[ \t]*";

/// One entry of an extraction table
pub struct Rule<T> {
    pub name: &'static str,
    pub regex: Regex,
    pub parse: fn(&Captures) -> Option<T>,
}

impl<T> Rule<T> {
    pub fn new(name: &'static str, regex: Regex, parse: fn(&Captures) -> Option<T>) -> Self {
        Self { name, regex, parse }
    }

    fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = T> + 'a
    where
        T: 'a,
    {
        self.regex
            .captures_iter(text)
            .filter_map(move |caps| (self.parse)(&caps))
    }
}

/// First value that matches and validates, in table order then text order
pub fn first_match<T>(rules: &[Rule<T>], text: &str) -> Option<T> {
    for rule in rules {
        if let Some(value) = rule.matches(text).next() {
            tracing::debug!(rule = rule.name, "extraction rule matched");
            return Some(value);
        }
    }
    None
}

/// Every validated value from every rule, in table order then text order
pub fn all_matches<T>(rules: &[Rule<T>], text: &str) -> Vec<T> {
    rules.iter().flat_map(|rule| rule.matches(text)).collect()
}

// ============================================================
// Capture parsers
// ============================================================

/// Group 1, trimmed; empty values are misses
pub fn trimmed(caps: &Captures) -> Option<String> {
    let value = caps.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Group 1 with all whitespace removed
pub fn compact(caps: &Captures) -> Option<String> {
    let value: String = caps.get(1)?.as_str().split_whitespace().collect();
    (!value.is_empty()).then_some(value)
}

/// Group 1 as a Korean personal name that is not a form label
pub fn person_name(caps: &Captures) -> Option<String> {
    let name = caps.get(1)?.as_str().trim();
    let valid = (2..=5).contains(&name.chars().count())
        && name.chars().all(is_hangul_syllable)
        && !NAME_STOPWORDS.contains(&name);
    valid.then(|| name.to_string())
}

/// Groups 1..=3 as year, month, day, gated on year >= 1980
pub fn document_date(caps: &Captures) -> Option<String> {
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;
    format_date(year, month, day).filter(|_| year >= 1980)
}

/// Format a date as `YYYY-MM-DD` when month and day are in range
pub fn format_date(year: i32, month: u32, day: u32) -> Option<String> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(format!("{:04}-{:02}-{:02}", year, month, day))
}

/// Digits with optional thousands separators
pub fn parse_number(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Group 1 as a number; range gating is left to the caller's table
pub fn number(caps: &Captures) -> Option<u64> {
    parse_number(caps.get(1)?.as_str())
}

pub fn is_hangul_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

pub fn contains_hangul(text: &str) -> bool {
    text.chars().any(is_hangul_syllable)
}

/// Strict check for an ISO `YYYY-MM-DD` string naming a real calendar day
pub fn is_iso_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Build a regex for `<label><sep><value>`
pub(crate) fn labelled(label: &str, value: &str) -> Regex {
    // Table patterns are compile-time constants
    Regex::new(&format!("{}{}{}", label, LABEL_SEP, value)).unwrap()
}
