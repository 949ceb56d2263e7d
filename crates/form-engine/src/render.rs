//! Drawing field values onto a template page

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use serde_json::Value;
use shared_types::CaseSummary;

use crate::error::{FormEngineError, Result};
use crate::field_map::{
    FieldType, Origin, PdfField, PdfFieldMap, DEFAULT_STAMP_HEIGHT, DEFAULT_STAMP_TEXT,
    DEFAULT_STAMP_WIDTH,
};
use crate::fonts::{
    contains_cjk, encode_latin, estimated_width, hex_string, latin_font_dictionary, CjkFont,
    GlyphUsage,
};
use crate::layout::{display_value, fit_lines, format_date, format_value, is_truthy, resolve_path};

/// Resource names given to the fonts this engine adds
const LATIN_RESOURCE: &str = "FmLatin";
const CJK_RESOURCE: &str = "FmCjk";

/// A4 portrait, used when the page carries no readable MediaBox
const FALLBACK_PAGE: (f32, f32) = (595.28, 841.89);
const MAX_TREE_DEPTH: usize = 32;

fn pdf_err(e: lopdf::Error) -> FormEngineError {
    FormEngineError::Pdf(e.to_string())
}

// ============================================================
// Page tree helpers
// ============================================================

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Page attribute, following `Parent` links for inheritable keys
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Top edge of the page in PDF space
fn page_top(doc: &Document, page_id: ObjectId, map: &PdfFieldMap) -> f32 {
    let media_box = inherited(doc, page_id, b"MediaBox")
        .and_then(|o| o.as_array().ok())
        .and_then(|items| items.iter().map(number).collect::<Option<Vec<f32>>>())
        .filter(|values| values.len() == 4);

    match media_box {
        Some(values) => values[3],
        None => map
            .page_size
            .map(|size| size.height)
            .unwrap_or(FALLBACK_PAGE.1),
    }
}

// ============================================================
// Canvas
// ============================================================

/// Collects drawing operations and the fonts they need
struct Canvas<'a> {
    cjk: &'a CjkFont,
    origin: Origin,
    top: f32,
    ops: Vec<Operation>,
    glyphs: GlyphUsage,
    uses_latin: bool,
    uses_cjk: bool,
}

impl<'a> Canvas<'a> {
    fn new(cjk: &'a CjkFont, origin: Origin, top: f32) -> Self {
        Self {
            cjk,
            origin,
            top,
            ops: Vec::new(),
            glyphs: GlyphUsage::new(),
            uses_latin: false,
            uses_cjk: false,
        }
    }

    /// Map-space y of a text baseline → PDF space
    fn baseline(&self, y: f32) -> f32 {
        match self.origin {
            Origin::BottomLeft => y,
            Origin::TopLeft => self.top - y,
        }
    }

    /// Map-space y of a box → PDF-space bottom edge
    fn box_bottom(&self, y: f32, height: f32) -> f32 {
        match self.origin {
            Origin::BottomLeft => y,
            Origin::TopLeft => self.top - y - height,
        }
    }

    fn text(&mut self, x: f32, y: f32, font_size: f32, text: &str) {
        let (resource, bytes) = if contains_cjk(text) {
            self.uses_cjk = true;
            (CJK_RESOURCE, self.cjk.encode(text, &mut self.glyphs))
        } else {
            self.uses_latin = true;
            (LATIN_RESOURCE, encode_latin(text))
        };

        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(resource.as_bytes().to_vec()), font_size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![hex_string(bytes)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        if contains_cjk(text) {
            self.cjk.text_width(text, font_size)
        } else {
            estimated_width(text, font_size)
        }
    }

    fn rect(&mut self, x: f32, bottom: f32, width: f32, height: f32, paint: &str) {
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), bottom.into(), width.into(), height.into()],
        ));
        self.ops.push(Operation::new(paint, vec![]));
    }
}

// ============================================================
// Field drawing
// ============================================================

fn draw_lines(canvas: &mut Canvas, field: &PdfField, text: &str) {
    let Some((x, y)) = field.position() else {
        return;
    };
    let font_size = field.font_size();
    let lines = fit_lines(text, field.width(), font_size, field.max_lines());
    let first = canvas.baseline(y);
    for (i, line) in lines.iter().enumerate() {
        canvas.text(x, first - i as f32 * field.line_height(), font_size, line);
    }
}

fn draw_stamp(canvas: &mut Canvas, field: &PdfField) {
    let Some((x, y)) = field.position() else {
        return;
    };
    let width = field.width.unwrap_or(DEFAULT_STAMP_WIDTH);
    let height = field.height.unwrap_or(DEFAULT_STAMP_HEIGHT);
    let bottom = canvas.box_bottom(y, height);

    canvas.ops.push(Operation::new("w", vec![1.into()]));
    canvas.rect(x, bottom, width, height, "S");

    let label = field.text.as_deref().unwrap_or(DEFAULT_STAMP_TEXT);
    let font_size = field.font_size();
    let label_width = canvas.text_width(label, font_size);
    // Cap height ≈ 0.7 em
    canvas.text(
        x + (width - label_width) / 2.0,
        bottom + height / 2.0 - font_size * 0.35,
        font_size,
        label,
    );
}

/// Draw one field; returns whether anything was drawn
fn draw_field(canvas: &mut Canvas, key: &str, field: &PdfField, value: &Value) -> bool {
    match field.field_type {
        FieldType::Text => {
            let Some(text) = display_value(value) else {
                return false;
            };
            draw_lines(canvas, field, &format_value(&text, field.format.as_deref()));
        }
        FieldType::Date => {
            let Some(text) = display_value(value) else {
                return false;
            };
            draw_lines(canvas, field, &format_date(&text, field.format.as_deref()));
        }
        FieldType::Checkbox => {
            let Some((x, y)) = field.position().filter(|_| is_truthy(value)) else {
                return false;
            };
            let size = field.checkbox_size();
            let bottom = canvas.box_bottom(y, size);
            canvas.rect(x, bottom, size, size, "f");
        }
        FieldType::CheckboxGroup => {
            let Some(selected) = display_value(value) else {
                return false;
            };
            let Some(option) = field.options.get(&selected) else {
                tracing::debug!(field = key, value = %selected, "No checkbox option for value");
                return false;
            };
            let size = option.size.unwrap_or_else(|| field.checkbox_size());
            let bottom = canvas.box_bottom(option.y, size);
            canvas.rect(option.x, bottom, size, size, "f");
        }
        FieldType::Stamp => draw_stamp(canvas, field),
    }
    true
}

// ============================================================
// Document assembly
// ============================================================

fn install_fonts(doc: &mut Document, page_id: ObjectId, fonts: &[(&str, ObjectId)]) -> Result<()> {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    let mut font_dict = resources
        .get(b"Font")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    for (name, id) in fonts {
        font_dict.set(*name, Object::Reference(*id));
    }
    resources.set("Font", Object::Dictionary(font_dict));

    doc.get_dictionary_mut(page_id)
        .map_err(pdf_err)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Append `ops` after the page's existing content, isolating its graphics state
fn append_content(doc: &mut Document, page_id: ObjectId, ops: Vec<Operation>) -> Result<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id).map_err(pdf_err)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut operations = vec![
        Operation::new("Q", vec![]),
        Operation::new("q", vec![]),
        Operation::new("g", vec![0.into()]),
    ];
    operations.extend(ops);
    operations.push(Operation::new("Q", vec![]));
    let encoded = Content { operations }.encode().map_err(pdf_err)?;

    let save_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let fields_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let mut contents = vec![Object::Reference(save_id)];
    contents.extend(existing);
    contents.push(Object::Reference(fields_id));

    doc.get_dictionary_mut(page_id)
        .map_err(pdf_err)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Place every mapped value of `summary` on the template and return the
/// finished PDF.
///
/// Fields whose value is absent or empty are skipped. Only an unreadable
/// template or a page index outside it is an error.
pub fn fill_template(
    template: &[u8],
    map: &PdfFieldMap,
    summary: &CaseSummary,
    cjk: &CjkFont,
) -> Result<Vec<u8>> {
    let mut doc =
        Document::load_mem(template).map_err(|e| FormEngineError::TemplateLoad(e.to_string()))?;

    let page_number = map.page as u32 + 1;
    let page_id = *doc.get_pages().get(&page_number).ok_or_else(|| {
        FormEngineError::TemplateLoad(format!("template has no page {}", page_number))
    })?;

    let values = serde_json::to_value(summary)?;
    let top = page_top(&doc, page_id, map);
    let mut canvas = Canvas::new(cjk, map.origin, top);

    let mut placed = 0usize;
    for (key, field) in &map.fields {
        let Some(value) = resolve_path(&values, field.source_path(key)) else {
            continue;
        };
        if draw_field(&mut canvas, key, field, value) {
            placed += 1;
        }
    }

    if !canvas.ops.is_empty() {
        let mut fonts = Vec::new();
        if canvas.uses_latin {
            fonts.push((LATIN_RESOURCE, doc.add_object(latin_font_dictionary())));
        }
        if canvas.uses_cjk {
            fonts.push((CJK_RESOURCE, cjk.add_to_document(&mut doc, &canvas.glyphs)?));
        }
        install_fonts(&mut doc, page_id, &fonts)?;
        append_content(&mut doc, page_id, canvas.ops)?;
    }

    let mut output = Vec::new();
    doc.save_to(&mut output).map_err(|e| FormEngineError::Pdf(e.to_string()))?;

    tracing::info!(placed, fields = map.fields.len(), bytes = output.len(), "Filled template");
    Ok(output)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{DeregistrationInfo, Owner, Vehicle};

    /// Single-page A4 document with one existing content stream
    pub(crate) fn create_template() -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"0 0 1 RG 10 10 100 100 re S".to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => dictionary! {
                        "Type" => "Font",
                        "Subtype" => "Type1",
                        "BaseFont" => "Times-Roman",
                    },
                },
            },
        });
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        });
        if let Ok(page) = doc.get_object_mut(page_id) {
            if let Ok(dict) = page.as_dict_mut() {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn summary() -> CaseSummary {
        CaseSummary {
            owner: Owner {
                name: "홍길동".to_string(),
                address: "SEOUL GANGNAM-GU TEHERAN-RO 123 WOORI BUILDING 501".to_string(),
                ..Default::default()
            },
            vehicle: Vehicle {
                plate: "12가3456".to_string(),
                vin: "KMHL341CBLA123456".to_string(),
                mileage_km: Some(45000),
                ..Default::default()
            },
            dereg: DeregistrationInfo {
                reason: "수출예정".to_string(),
                need_certificate: Some(true),
                application_date: "2024-06-01".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn map() -> PdfFieldMap {
        PdfFieldMap::from_json(
            r##"{
                "origin": "top-left",
                "fields": {
                    "owner.name": {"type": "text", "x": 250, "y": 250, "w": 170, "fontSize": 11},
                    "owner.address": {"type": "text", "x": 150, "y": 290, "w": 100, "maxLines": 1},
                    "vehicle.vin": {"type": "text", "x": 350, "y": 415, "w": 140},
                    "vehicle.mileageKm": {"type": "text", "x": 500, "y": 415, "w": 60, "format": "#,###"},
                    "vehicle.color": {"type": "text", "x": 10, "y": 10},
                    "dereg.needCertificate": {"type": "checkbox", "x": 270, "y": 647, "box": 10},
                    "dereg.reason": {
                        "type": "checkbox-group",
                        "options": {
                            "폐차": {"x": 155, "y": 463, "box": 10},
                            "수출예정": {"x": 395, "y": 463, "box": 10}
                        }
                    },
                    "application_month": {
                        "type": "date", "source": "dereg.applicationDate",
                        "x": 485, "y": 703, "format": "M"
                    },
                    "signature": {"type": "stamp", "source": "owner.name", "x": 420, "y": 745}
                }
            }"##,
        )
        .unwrap()
    }

    /// Decoded operations of the stream this engine appended
    fn appended_operations(pdf: &[u8]) -> Vec<Operation> {
        let doc = Document::load_mem(pdf).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let contents = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        let last = contents.last().unwrap().as_reference().unwrap();
        let stream = doc.get_object(last).unwrap().as_stream().unwrap();
        Content::decode(&stream.content).unwrap().operations
    }

    /// Latin strings shown with the Latin font
    fn latin_texts(ops: &[Operation]) -> Vec<String> {
        let mut font = Vec::new();
        let mut texts = Vec::new();
        for op in ops {
            match op.operator.as_str() {
                "Tf" => font = op.operands[0].as_name().unwrap().to_vec(),
                "Tj" if font == LATIN_RESOURCE.as_bytes() => {
                    if let Object::String(bytes, _) = &op.operands[0] {
                        texts.push(String::from_utf8_lossy(bytes).into_owned());
                    }
                }
                _ => {}
            }
        }
        texts
    }

    fn count(ops: &[Operation], operator: &str) -> usize {
        ops.iter().filter(|op| op.operator == operator).count()
    }

    #[test]
    fn test_fills_fields_and_keeps_existing_content() {
        let pdf = fill_template(&create_template(), &map(), &summary(), &CjkFont::Predefined).unwrap();

        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 3, "Should wrap original content between q/Q streams");

        let fonts = page
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Font")
            .unwrap()
            .as_dict()
            .unwrap();
        assert!(fonts.has(b"F1"), "Existing fonts should survive");
        assert!(fonts.has(LATIN_RESOURCE.as_bytes()));
        assert!(fonts.has(CJK_RESOURCE.as_bytes()));

        let ops = appended_operations(&pdf);
        let texts = latin_texts(&ops);
        assert!(texts.contains(&"KMHL341CBLA123456".to_string()), "Got: {:?}", texts);
        assert!(texts.contains(&"45,000".to_string()), "Got: {:?}", texts);
        assert!(texts.contains(&"6".to_string()), "Month cell. Got: {:?}", texts);
    }

    #[test]
    fn test_long_value_is_truncated_to_one_line() {
        let pdf = fill_template(&create_template(), &map(), &summary(), &CjkFont::Predefined).unwrap();
        let texts = latin_texts(&appended_operations(&pdf));

        let address: Vec<&String> = texts.iter().filter(|t| t.starts_with("SEOUL")).collect();
        assert_eq!(address.len(), 1, "maxLines=1 should draw one line. Got: {:?}", texts);
        assert!(address[0].ends_with("..."));
        assert!(address[0].chars().count() <= 16);
    }

    #[test]
    fn test_marks_checkbox_and_matching_group_option() {
        let pdf = fill_template(&create_template(), &map(), &summary(), &CjkFont::Predefined).unwrap();
        let ops = appended_operations(&pdf);

        // needCertificate + 수출예정 filled; stamp border stroked
        assert_eq!(count(&ops, "f"), 2);
        assert_eq!(count(&ops, "S"), 1);

        let filled: Vec<f32> = ops
            .windows(2)
            .filter(|pair| pair[1].operator == "f")
            .map(|pair| number(&pair[0].operands[0]).unwrap())
            .collect();
        assert!(filled.contains(&395.0), "Should mark the 수출예정 box. Got: {:?}", filled);
        assert!(!filled.contains(&155.0));
    }

    #[test]
    fn test_unknown_option_and_false_checkbox_draw_nothing() {
        let mut summary = summary();
        summary.dereg.reason = "우주여행".to_string();
        summary.dereg.need_certificate = Some(false);
        let pdf = fill_template(&create_template(), &map(), &summary, &CjkFont::Predefined).unwrap();

        assert_eq!(count(&appended_operations(&pdf), "f"), 0);
    }

    #[test]
    fn test_top_left_origin_is_flipped() {
        let pdf = fill_template(&create_template(), &map(), &summary(), &CjkFont::Predefined).unwrap();
        let ops = appended_operations(&pdf);

        let positions: Vec<(f32, f32)> = ops
            .iter()
            .filter(|op| op.operator == "Td")
            .map(|op| (number(&op.operands[0]).unwrap(), number(&op.operands[1]).unwrap()))
            .collect();
        assert!(positions.contains(&(350.0, 842.0 - 415.0)), "Got: {:?}", positions);
    }

    #[test]
    fn test_empty_summary_leaves_page_untouched() {
        let empty_map = PdfFieldMap::from_json(
            r#"{"fields": {"vehicle.plate": {"type": "text", "x": 1, "y": 1}}}"#,
        )
        .unwrap();
        let pdf = fill_template(
            &create_template(),
            &empty_map,
            &CaseSummary::default(),
            &CjkFont::Predefined,
        )
        .unwrap();

        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let contents = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap();
        assert!(contents.as_reference().is_ok(), "No stream should be added");
    }

    #[test]
    fn test_bad_template_and_page_are_errors() {
        let result = fill_template(b"%PDF-garbage", &map(), &summary(), &CjkFont::Predefined);
        assert!(matches!(result, Err(FormEngineError::TemplateLoad(_))));

        let mut second_page = map();
        second_page.page = 1;
        let result = fill_template(&create_template(), &second_page, &summary(), &CjkFont::Predefined);
        assert!(matches!(result, Err(FormEngineError::TemplateLoad(_))));
    }
}
