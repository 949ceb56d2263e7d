//! Fonts for placed text
//!
//! Latin runs use the standard Helvetica. Runs containing CJK characters
//! use either an embedded TrueType font (Type0 / CIDFontType2, Identity-H)
//! or, when no usable font file is available, the predefined Korean font
//! `HYGoThic-Medium` addressed through `UniKS-UCS2-H`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use ttf_parser::{name_id, Face};

use crate::error::{FormEngineError, Result};

pub const LATIN_FONT: &str = "Helvetica";
pub const PREDEFINED_CJK_FONT: &str = "HYGoThic-Medium";
const PREDEFINED_CJK_ENCODING: &str = "UniKS-UCS2-H";

/// True for Hangul, kana, CJK ideographs and full-width forms
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{1100}'..='\u{11FF}'     // Hangul Jamo
        | '\u{2E80}'..='\u{2FDF}'   // CJK radicals
        | '\u{3000}'..='\u{303F}'   // CJK symbols and punctuation
        | '\u{3040}'..='\u{30FF}'   // Hiragana, Katakana
        | '\u{3130}'..='\u{318F}'   // Hangul compatibility Jamo
        | '\u{3200}'..='\u{33FF}'   // Enclosed CJK, compatibility
        | '\u{3400}'..='\u{4DBF}'   // CJK extension A
        | '\u{4E00}'..='\u{9FFF}'   // CJK unified ideographs
        | '\u{A960}'..='\u{A97F}'   // Hangul Jamo extended-A
        | '\u{AC00}'..='\u{D7AF}'   // Hangul syllables
        | '\u{D7B0}'..='\u{D7FF}'   // Hangul Jamo extended-B
        | '\u{F900}'..='\u{FAFF}'   // CJK compatibility ideographs
        | '\u{FF00}'..='\u{FFEF}'   // Half/full-width forms
    )
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// Helvetica with WinAnsi encoding; unmappable characters become `?`
pub fn encode_latin(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            _ => b'?',
        })
        .collect()
}

pub fn latin_font_dictionary() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => LATIN_FONT,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// A parsed TrueType font held in memory
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    name: String,
    data: Vec<u8>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
}

impl EmbeddedFont {
    /// Parse font bytes; the font must have Hangul glyphs
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let face = Face::parse(&data, 0).map_err(|e| FormEngineError::Font(e.to_string()))?;
        if face.glyph_index('가').is_none() {
            return Err(FormEngineError::Font("font has no Hangul glyphs".into()));
        }

        let name = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == name_id::POST_SCRIPT_NAME || n.name_id == name_id::FULL_NAME)
            .find_map(|n| n.to_string())
            .map(|n| n.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-').collect::<String>())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "EmbeddedCJK".to_string());
        let bbox = face.global_bounding_box();

        let font = Self {
            name,
            units_per_em: face.units_per_em().max(1),
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            data,
        };
        Ok(font)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }

    /// Font units → 1/1000 text space
    fn scale(&self, units: i32) -> i64 {
        (units as i64 * 1000) / self.units_per_em as i64
    }

    fn advance(&self, face: &Face<'_>, glyph: u16) -> i64 {
        face.glyph_hor_advance(ttf_parser::GlyphId(glyph))
            .map(|a| self.scale(a as i32))
            .unwrap_or(1000)
    }
}

/// CJK font chosen for a document render
#[derive(Debug, Clone)]
pub enum CjkFont {
    Embedded(EmbeddedFont),
    Predefined,
}

impl CjkFont {
    /// Load a TrueType file, degrading to the predefined font on any failure
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::warn!("No CJK font configured, using {}", PREDEFINED_CJK_FONT);
            return CjkFont::Predefined;
        };

        let loaded = std::fs::read(path)
            .map_err(FormEngineError::from)
            .and_then(EmbeddedFont::from_bytes);
        match loaded {
            Ok(font) => {
                tracing::info!(font = font.name(), path = %path.display(), "Loaded CJK font");
                CjkFont::Embedded(font)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "CJK font unavailable, using {}",
                    PREDEFINED_CJK_FONT
                );
                CjkFont::Predefined
            }
        }
    }

    /// Encode `text` as show-text operand bytes, recording glyphs used
    pub fn encode(&self, text: &str, used: &mut GlyphUsage) -> Vec<u8> {
        match self {
            CjkFont::Embedded(font) => {
                let face = font.face();
                text.chars()
                    .flat_map(|c| {
                        let glyph = face
                            .as_ref()
                            .and_then(|f| f.glyph_index(c))
                            .map(|g| g.0)
                            .unwrap_or(0);
                        if glyph != 0 {
                            used.insert(glyph, c);
                        }
                        glyph.to_be_bytes()
                    })
                    .collect()
            }
            CjkFont::Predefined => text
                .chars()
                .flat_map(|c| {
                    let code = u16::try_from(c as u32).unwrap_or(b'?' as u16);
                    code.to_be_bytes()
                })
                .collect(),
        }
    }

    /// Rendered width of `text` at `font_size`
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        match self {
            CjkFont::Embedded(font) => {
                let Some(face) = font.face() else {
                    return estimated_width(text, font_size);
                };
                let units: i64 = text
                    .chars()
                    .map(|c| {
                        face.glyph_index(c)
                            .map(|g| font.advance(&face, g.0))
                            .unwrap_or(1000)
                    })
                    .sum();
                units as f32 * font_size / 1000.0
            }
            CjkFont::Predefined => estimated_width(text, font_size),
        }
    }

    /// Add the Type0 font object; `used` feeds widths and ToUnicode
    pub fn add_to_document(&self, doc: &mut Document, used: &GlyphUsage) -> Result<ObjectId> {
        match self {
            CjkFont::Embedded(font) => add_embedded_font(doc, font, used),
            CjkFont::Predefined => Ok(add_predefined_font(doc)),
        }
    }
}

/// Full-width CJK, half-width everything else
pub fn estimated_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .map(|c| if is_cjk(c) { font_size } else { font_size * 0.5 })
        .sum()
}

/// Glyph id → character, collected while encoding
pub type GlyphUsage = BTreeMap<u16, char>;

fn add_predefined_font(doc: &mut Document) -> ObjectId {
    let descendant = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType0",
        "BaseFont" => PREDEFINED_CJK_FONT,
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Korea1"),
            "Supplement" => 2,
        },
        "FontDescriptor" => dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => PREDEFINED_CJK_FONT,
            "Flags" => 6,
            "FontBBox" => vec![(-6).into(), (-145).into(), 1003.into(), 880.into()],
            "ItalicAngle" => 0,
            "Ascent" => 880,
            "Descent" => -120,
            "CapHeight" => 880,
            "StemV" => 93,
        },
        "DW" => 1000,
    });

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => format!("{}-{}", PREDEFINED_CJK_FONT, PREDEFINED_CJK_ENCODING).as_str(),
        "Encoding" => PREDEFINED_CJK_ENCODING,
        "DescendantFonts" => vec![Object::Reference(descendant)],
    })
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn add_embedded_font(doc: &mut Document, font: &EmbeddedFont, used: &GlyphUsage) -> Result<ObjectId> {
    let font_file = Stream::new(
        dictionary! {
            "Length1" => font.data.len() as i64,
            "Filter" => "FlateDecode",
        },
        compress(&font.data)?,
    );
    let font_file_id = doc.add_object(font_file);

    let name = font.name.as_str();
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => name,
        "Flags" => 4,
        "FontBBox" => font.bbox.iter().map(|v| font.scale(*v as i32).into()).collect::<Vec<Object>>(),
        "ItalicAngle" => 0,
        "Ascent" => font.scale(font.ascender as i32),
        "Descent" => font.scale(font.descender as i32),
        "CapHeight" => font.scale(font.cap_height as i32),
        "StemV" => 80,
        "FontFile2" => Object::Reference(font_file_id),
    });

    let widths: Vec<Object> = match font.face() {
        Some(face) => used
            .keys()
            .flat_map(|glyph| {
                let advance = font.advance(&face, *glyph);
                [Object::Integer(*glyph as i64), Object::Array(vec![advance.into()])]
            })
            .collect(),
        None => Vec::new(),
    };

    let descendant = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => name,
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => Object::Reference(descriptor_id),
        "DW" => 1000,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode = doc.add_object(Stream::new(Dictionary::new(), to_unicode_cmap(used).into_bytes()));

    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => name,
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(descendant)],
        "ToUnicode" => Object::Reference(to_unicode),
    }))
}

/// ToUnicode CMap for two-byte glyph codes
pub fn to_unicode_cmap(used: &GlyphUsage) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );

    let entries: Vec<(&u16, &char)> = used.iter().collect();
    // At most 100 entries per bfchar block
    for chunk in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (glyph, c) in chunk {
            let mut units = [0u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", glyph, hex));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

/// Hex string operand, the form used for two-byte text
pub fn hex_string(bytes: Vec<u8>) -> Object {
    Object::String(bytes, StringFormat::Hexadecimal)
}
