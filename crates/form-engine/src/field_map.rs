//! Per-template field coordinate tables
//!
//! One JSON sidecar per template maps logical field names to positions on a
//! page. Keys double as dotted paths into the serialized `CaseSummary`
//! (`vehicle.plate`) unless a field names its own `source`.
//!
//! Coordinates are PDF points. With `"origin": "top-left"` the y axis runs
//! down the page: text `y` is the baseline and box `y` is the top edge.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FormEngineError, Result};

pub const DEFAULT_FONT_SIZE: f32 = 10.0;
pub const DEFAULT_WIDTH: f32 = 200.0;
pub const DEFAULT_CHECKBOX_SIZE: f32 = 12.0;
pub const DEFAULT_STAMP_WIDTH: f32 = 90.0;
pub const DEFAULT_STAMP_HEIGHT: f32 = 36.0;
pub const DEFAULT_STAMP_TEXT: &str = "(서명)";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    #[default]
    BottomLeft,
    TopLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Checkbox,
    CheckboxGroup,
    Date,
    Stamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// Mark position for one value of a checkbox group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckboxOption {
    pub x: f32,
    pub y: f32,
    #[serde(default, rename = "box", alias = "size", skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Dotted path to read instead of the field's own key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, alias = "w", skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, alias = "h", skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, alias = "box", skip_serializing_if = "Option::is_none")]
    pub checkbox_size: Option<f32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, CheckboxOption>,
    /// Placeholder drawn inside a stamp box
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl PdfField {
    pub fn source_path<'a>(&'a self, key: &'a str) -> &'a str {
        self.source.as_deref().unwrap_or(key)
    }

    pub fn font_size(&self) -> f32 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub fn line_height(&self) -> f32 {
        self.line_height.unwrap_or_else(|| self.font_size() + 2.0)
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines.unwrap_or(1).max(1)
    }

    pub fn width(&self) -> f32 {
        self.width.unwrap_or(DEFAULT_WIDTH)
    }

    pub fn checkbox_size(&self) -> f32 {
        self.checkbox_size.unwrap_or(DEFAULT_CHECKBOX_SIZE)
    }

    pub fn position(&self) -> Option<(f32, f32)> {
        Some((self.x?, self.y?))
    }
}

/// Coordinate table of one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfFieldMap {
    /// File name of the CJK font under the fonts directory
    #[serde(default)]
    pub font: String,
    /// Zero-based index of the page fields are drawn on
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,
    pub fields: BTreeMap<String, PdfField>,
}

impl PdfFieldMap {
    pub fn from_json(json: &str) -> Result<Self> {
        let map: Self = serde_json::from_str(json)
            .map_err(|e| FormEngineError::FieldMap(e.to_string()))?;
        map.check()?;
        Ok(map)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            FormEngineError::FieldMap(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Positioned field types need both coordinates
    fn check(&self) -> Result<()> {
        for (key, field) in &self.fields {
            let positioned = !matches!(field.field_type, FieldType::CheckboxGroup);
            if positioned && field.position().is_none() {
                return Err(FormEngineError::FieldMap(format!(
                    "field '{}' has no x/y position",
                    key
                )));
            }
            if let Some(size) = field.font_size {
                if size <= 0.0 {
                    return Err(FormEngineError::FieldMap(format!(
                        "field '{}' has non-positive font size",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_aliases_and_defaults() {
        let map = PdfFieldMap::from_json(
            r#"{
                "font": "NanumGothic.ttf",
                "origin": "top-left",
                "fields": {
                    "owner.address": {"type": "text", "x": 150, "y": 290, "w": 400, "maxLines": 2},
                    "dereg.needCertificate": {"type": "checkbox", "x": 270, "y": 647, "box": 10},
                    "dereg.reason": {
                        "type": "checkbox-group",
                        "options": {"수출예정": {"x": 395, "y": 463, "box": 10}}
                    },
                    "application_year": {
                        "type": "date", "source": "dereg.applicationDate",
                        "x": 455, "y": 703, "format": "YYYY"
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(map.origin, Origin::TopLeft);
        assert_eq!(map.page, 0);

        let address = &map.fields["owner.address"];
        assert_eq!(address.width(), 400.0);
        assert_eq!(address.max_lines(), 2);
        assert_eq!(address.font_size(), 10.0);
        assert_eq!(address.line_height(), 12.0);
        assert_eq!(address.source_path("owner.address"), "owner.address");

        assert_eq!(map.fields["dereg.needCertificate"].checkbox_size(), 10.0);
        assert_eq!(map.fields["dereg.reason"].field_type, FieldType::CheckboxGroup);
        assert_eq!(map.fields["dereg.reason"].options["수출예정"].size, Some(10.0));

        let year = &map.fields["application_year"];
        assert_eq!(year.source_path("application_year"), "dereg.applicationDate");
    }

    #[test]
    fn test_rejects_unpositioned_text_field() {
        let err = PdfFieldMap::from_json(r#"{"fields": {"vehicle.plate": {"type": "text"}}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("vehicle.plate"), "Got: {}", err);
    }

    #[test]
    fn test_rejects_unknown_field_type() {
        let result =
            PdfFieldMap::from_json(r#"{"fields": {"a": {"type": "signature", "x": 1, "y": 1}}}"#);
        assert!(matches!(result, Err(FormEngineError::FieldMap(_))));
    }
}
