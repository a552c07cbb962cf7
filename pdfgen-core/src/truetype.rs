use std::sync::Arc;

use crate::encoding::{encode_char, win_ansi_to_unicode};
use crate::error::{Error, Result};
use crate::fonts::{flags, FontMetrics, FontResourceEntries, FontSource, TextExtent};
use crate::objects::Token;

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;

/// A TrueType font loaded from raw .ttf bytes, exposed as a simple
/// single-byte font in WinAnsiEncoding and embedded as `FontFile2`.
#[derive(Debug)]
pub struct TrueTypeFont {
    postscript_name: String,
    font_data: Arc<[u8]>,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    bbox: [i16; 4],
    cap_height: i16,
    italic_angle: f64,
    flags: u32,
    stem_v: i16,
    /// Advance width in font units for codes FIRST_CHAR..=LAST_CHAR.
    widths: Vec<u16>,
}

impl TrueTypeFont {
    /// Parse a TrueType font from raw .ttf bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| Error::Font(format!("Failed to parse TTF: {}", e)))?;

        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return Err(Error::Font("TTF reports zero units per em".to_string()));
        }
        let ascent = face.ascender();
        let descent = face.descender();
        let bbox = face.global_bounding_box();
        let cap_height = face.capital_height().unwrap_or(ascent);
        let italic_angle = face.italic_angle() as f64;

        let flags = compute_flags(&face);
        let stem_v = estimate_stem_v(&face);

        let postscript_name = extract_postscript_name(&face)
            .or_else(|| extract_family_name(&face))
            .map(|n| sanitize_name(&n))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let notdef_width = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .unwrap_or(0);
        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                win_ansi_to_unicode(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .unwrap_or(notdef_width)
            })
            .collect();

        log::debug!(
            "loaded TrueType font {} ({} bytes, {} units/em)",
            postscript_name,
            data.len(),
            units_per_em
        );

        Ok(TrueTypeFont {
            postscript_name,
            font_data: Arc::from(data),
            units_per_em,
            ascent,
            descent,
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            cap_height,
            italic_angle,
            flags,
            stem_v,
            widths,
        })
    }

    /// Scale a raw font unit value to PDF units (1/1000 of text space).
    fn scale_to_pdf(&self, value: i32) -> i32 {
        value * 1000 / self.units_per_em as i32
    }

    /// Width of a character in PDF units (1/1000 of text space), taken
    /// from the WinAnsi code it is written as.
    pub fn char_width_pdf(&self, ch: char) -> u32 {
        let code = encode_char(ch);
        let raw = match code.checked_sub(FIRST_CHAR) {
            Some(index) => self.widths.get(index as usize).copied().unwrap_or(0),
            None => 0,
        };
        raw as u32 * 1000 / self.units_per_em as u32
    }
}

impl FontSource for TrueTypeFont {
    fn key(&self) -> &str {
        &self.postscript_name
    }

    fn requires_descriptor(&self) -> bool {
        true
    }

    fn requires_embedding(&self) -> bool {
        true
    }

    fn embedding_key(&self) -> Option<Token> {
        Some(Token::from_static("FontFile2"))
    }

    fn embedded_data(&self) -> Option<Arc<[u8]>> {
        Some(Arc::clone(&self.font_data))
    }

    fn flags(&self) -> u32 {
        self.flags
    }

    fn metrics(&self) -> FontMetrics {
        FontMetrics {
            ascent: self.scale_to_pdf(self.ascent as i32),
            descent: self.scale_to_pdf(self.descent as i32),
            cap_height: self.scale_to_pdf(self.cap_height as i32),
            italic_angle: self.italic_angle,
            stem_v: self.stem_v as i32,
        }
    }

    fn bounding_box(&self) -> [i32; 4] {
        self.bbox.map(|v| self.scale_to_pdf(v as i32))
    }

    /// Line height uses ascent - descent.
    fn measure(&self, text: &str, size: f64) -> TextExtent {
        let total: u64 = text.chars().map(|ch| self.char_width_pdf(ch) as u64).sum();
        let height = (self.ascent as i32 - self.descent as i32) as f64 / self.units_per_em as f64;
        TextExtent {
            width: total as f64 * size / 1000.0,
            height: height * size,
        }
    }

    fn resource_entries(&self) -> Result<FontResourceEntries> {
        let widths = self
            .widths
            .iter()
            .map(|&w| (w as i64 * 1000) / self.units_per_em as i64)
            .collect();
        Ok(FontResourceEntries {
            subtype: Token::from_static("TrueType"),
            base_font: Token::new(self.postscript_name.clone())?,
            encoding: Some(Token::from_static("WinAnsiEncoding")),
            widths: Some((FIRST_CHAR, LAST_CHAR, widths)),
        })
    }
}

/// Keep only bytes that are legal in a bare name token.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect()
}

/// Extract the font family name from the name table.
fn extract_family_name(face: &ttf_parser::Face) -> Option<String> {
    face.names()
        .into_iter()
        .find(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .and_then(|name| name.to_string())
}

/// Extract the PostScript name from the name table.
fn extract_postscript_name(face: &ttf_parser::Face) -> Option<String> {
    face.names()
        .into_iter()
        .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME && name.is_unicode())
        .and_then(|name| name.to_string())
}

/// Compute PDF font descriptor flags from the font tables.
fn compute_flags(face: &ttf_parser::Face) -> u32 {
    // Latin TrueType fonts used through WinAnsiEncoding are nonsymbolic.
    let mut f = flags::NONSYMBOLIC;
    if face.is_monospaced() {
        f |= flags::FIXED_PITCH;
    }
    if face.is_italic() {
        f |= flags::ITALIC;
    }
    f
}

/// Estimate StemV from the font's weight class.
fn estimate_stem_v(face: &ttf_parser::Face) -> i16 {
    let weight = face.weight().to_number();
    // Rough approximation: StemV ~ 10 + 220 * (weight/1000)^2
    let w = weight as f64 / 1000.0;
    (10.0 + 220.0 * w * w) as i16
}
