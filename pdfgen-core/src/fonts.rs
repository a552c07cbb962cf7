use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::afm::{
    COURIER_WIDTH, DEFAULT_WIDTH, HELVETICA_BOLD_WIDTHS, HELVETICA_WIDTHS, TIMES_BOLD_ITALIC_WIDTHS,
    TIMES_BOLD_WIDTHS, TIMES_ITALIC_WIDTHS, TIMES_ROMAN_WIDTHS,
};
use crate::encoding::encode_char;
use crate::error::Result;
use crate::lock;
use crate::objects::{Dictionary, ObjId, PdfObject, Token};

/// Font descriptor flag bits (PDF 32000-1 Table 123).
pub mod flags {
    pub const FIXED_PITCH: u32 = 1;
    pub const SERIF: u32 = 1 << 1;
    pub const SYMBOLIC: u32 = 1 << 2;
    pub const NONSYMBOLIC: u32 = 1 << 5;
    pub const ITALIC: u32 = 1 << 6;
}

/// Vertical metrics in glyph units (1/1000 em).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub italic_angle: f64,
    pub stem_v: i32,
}

/// Size of a run of text in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

/// The font-specific part of a `/Font` resource dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct FontResourceEntries {
    pub subtype: Token,
    pub base_font: Token,
    pub encoding: Option<Token>,
    /// First and last mapped byte with one width per code in between.
    pub widths: Option<(u8, u8, Vec<i64>)>,
}

/// Read-only view of a font, supplied by whatever loaded it.
///
/// The document never parses font files itself; everything it writes
/// about a font comes through this trait.
pub trait FontSource: fmt::Debug + Send + Sync {
    /// Identity key, stable across point sizes. One resource is written
    /// per key.
    fn key(&self) -> &str;

    /// Whether a `/FontDescriptor` object must be written.
    fn requires_descriptor(&self) -> bool;

    /// Whether the font program must be embedded.
    fn requires_embedding(&self) -> bool;

    /// Descriptor key under which the program is embedded (`FontFile2`).
    fn embedding_key(&self) -> Option<Token> {
        None
    }

    /// The raw font program.
    fn embedded_data(&self) -> Option<Arc<[u8]>> {
        None
    }

    /// Length of the raw program before any filter.
    fn embedded_len(&self) -> usize {
        self.embedded_data().map_or(0, |d| d.len())
    }

    fn flags(&self) -> u32;

    fn metrics(&self) -> FontMetrics;

    /// `[llx lly urx ury]` in glyph units.
    fn bounding_box(&self) -> [i32; 4];

    /// Measure `text` set at `size` points.
    fn measure(&self, text: &str, size: f64) -> TextExtent;

    fn resource_entries(&self) -> Result<FontResourceEntries>;
}

/// Font identifier for the 14 standard PDF fonts.
/// These fonts are guaranteed available in all PDF viewers
/// without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl BuiltinFont {
    /// Returns the PDF BaseFont name (e.g. "Helvetica",
    /// "Times-Roman").
    pub fn pdf_base_name(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::HelveticaOblique => "Helvetica-Oblique",
            BuiltinFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            BuiltinFont::TimesRoman => "Times-Roman",
            BuiltinFont::TimesBold => "Times-Bold",
            BuiltinFont::TimesItalic => "Times-Italic",
            BuiltinFont::TimesBoldItalic => "Times-BoldItalic",
            BuiltinFont::Courier => "Courier",
            BuiltinFont::CourierBold => "Courier-Bold",
            BuiltinFont::CourierOblique => "Courier-Oblique",
            BuiltinFont::CourierBoldOblique => "Courier-BoldOblique",
            BuiltinFont::Symbol => "Symbol",
            BuiltinFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Look up a BuiltinFont by its PDF base name string.
    pub fn from_name(name: &str) -> Option<BuiltinFont> {
        use BuiltinFont::*;
        [
            Helvetica,
            HelveticaBold,
            HelveticaOblique,
            HelveticaBoldOblique,
            TimesRoman,
            TimesBold,
            TimesItalic,
            TimesBoldItalic,
            Courier,
            CourierBold,
            CourierOblique,
            CourierBoldOblique,
            Symbol,
            ZapfDingbats,
        ]
        .into_iter()
        .find(|f| f.pdf_base_name() == name)
    }

    fn is_courier(&self) -> bool {
        matches!(
            self,
            BuiltinFont::Courier
                | BuiltinFont::CourierBold
                | BuiltinFont::CourierOblique
                | BuiltinFont::CourierBoldOblique
        )
    }

    fn is_symbolic(&self) -> bool {
        matches!(self, BuiltinFont::Symbol | BuiltinFont::ZapfDingbats)
    }

    fn is_bold(&self) -> bool {
        matches!(
            self,
            BuiltinFont::HelveticaBold
                | BuiltinFont::HelveticaBoldOblique
                | BuiltinFont::TimesBold
                | BuiltinFont::TimesBoldItalic
                | BuiltinFont::CourierBold
                | BuiltinFont::CourierBoldOblique
        )
    }

    /// Returns the width of a character in 1/1000 em units, looked up by
    /// the WinAnsi code it is written as.
    pub fn char_width(&self, ch: char) -> u16 {
        if self.is_courier() {
            return COURIER_WIDTH;
        }
        let code = encode_char(ch) as u32;
        if !(32..=126).contains(&code) || self.is_symbolic() {
            return DEFAULT_WIDTH;
        }
        let index = (code - 32) as usize;
        match self {
            BuiltinFont::Helvetica | BuiltinFont::HelveticaOblique => HELVETICA_WIDTHS[index],
            BuiltinFont::HelveticaBold | BuiltinFont::HelveticaBoldOblique => {
                HELVETICA_BOLD_WIDTHS[index]
            }
            BuiltinFont::TimesRoman => TIMES_ROMAN_WIDTHS[index],
            BuiltinFont::TimesBold => TIMES_BOLD_WIDTHS[index],
            BuiltinFont::TimesItalic => TIMES_ITALIC_WIDTHS[index],
            BuiltinFont::TimesBoldItalic => TIMES_BOLD_ITALIC_WIDTHS[index],
            _ => DEFAULT_WIDTH,
        }
    }
}

impl FontSource for BuiltinFont {
    fn key(&self) -> &str {
        self.pdf_base_name()
    }

    fn requires_descriptor(&self) -> bool {
        false
    }

    fn requires_embedding(&self) -> bool {
        false
    }

    fn flags(&self) -> u32 {
        let mut f = if self.is_symbolic() {
            flags::SYMBOLIC
        } else {
            flags::NONSYMBOLIC
        };
        if self.is_courier() {
            f |= flags::FIXED_PITCH;
        }
        if matches!(
            self,
            BuiltinFont::TimesRoman
                | BuiltinFont::TimesBold
                | BuiltinFont::TimesItalic
                | BuiltinFont::TimesBoldItalic
        ) {
            f |= flags::SERIF;
        }
        if self.metrics().italic_angle != 0.0 {
            f |= flags::ITALIC;
        }
        f
    }

    fn metrics(&self) -> FontMetrics {
        use BuiltinFont::*;
        let (ascent, descent, cap_height) = match self {
            Helvetica | HelveticaBold | HelveticaOblique | HelveticaBoldOblique => (718, -207, 718),
            TimesRoman | TimesBold | TimesItalic | TimesBoldItalic => (683, -217, 662),
            Courier | CourierBold | CourierOblique | CourierBoldOblique => (629, -157, 562),
            Symbol => (1010, -293, 0),
            ZapfDingbats => (820, -143, 0),
        };
        let italic_angle = match self {
            HelveticaOblique | HelveticaBoldOblique | CourierOblique | CourierBoldOblique => -12.0,
            TimesItalic | TimesBoldItalic => -15.5,
            _ => 0.0,
        };
        let stem_v = match (self.is_courier(), self.is_bold()) {
            (true, true) => 106,
            (true, false) => 51,
            (false, true) => 140,
            (false, false) => 85,
        };
        FontMetrics {
            ascent,
            descent,
            cap_height,
            italic_angle,
            stem_v,
        }
    }

    fn bounding_box(&self) -> [i32; 4] {
        use BuiltinFont::*;
        match self {
            Helvetica | HelveticaOblique => [-166, -225, 1000, 931],
            HelveticaBold | HelveticaBoldOblique => [-170, -228, 1003, 962],
            TimesRoman | TimesItalic => [-168, -218, 1000, 898],
            TimesBold | TimesBoldItalic => [-168, -218, 1000, 935],
            Courier | CourierBold | CourierOblique | CourierBoldOblique => [-23, -250, 715, 805],
            Symbol => [-180, -293, 1090, 1010],
            ZapfDingbats => [-1, -143, 981, 820],
        }
    }

    /// Width from the AFM tables; height uses a 1.2x line multiplier.
    fn measure(&self, text: &str, size: f64) -> TextExtent {
        let total: u32 = text.chars().map(|ch| self.char_width(ch) as u32).sum();
        TextExtent {
            width: total as f64 * size / 1000.0,
            height: size * 1.2,
        }
    }

    fn resource_entries(&self) -> Result<FontResourceEntries> {
        Ok(FontResourceEntries {
            subtype: Token::from_static("Type1"),
            base_font: Token::from_static(self.pdf_base_name()),
            encoding: (!self.is_symbolic()).then(|| Token::from_static("WinAnsiEncoding")),
            widths: None,
        })
    }
}

/// A font source at a point size, as passed to drawing calls.
#[derive(Debug, Clone)]
pub struct Font {
    source: Arc<dyn FontSource>,
    size: f64,
}

impl Font {
    pub fn new(source: Arc<dyn FontSource>, size: f64) -> Self {
        Font { source, size }
    }

    pub fn builtin(font: BuiltinFont, size: f64) -> Self {
        Font::new(Arc::new(font), size)
    }

    pub fn source(&self) -> &Arc<dyn FontSource> {
        &self.source
    }

    pub fn key(&self) -> &str {
        self.source.key()
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// Same face at another size.
    pub fn with_size(&self, size: f64) -> Font {
        Font::new(Arc::clone(&self.source), size)
    }

    pub fn measure(&self, text: &str) -> TextExtent {
        self.source.measure(text, self.size)
    }
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.size == other.size
    }
}

/// Source of internal font names. Process-wide so names never collide,
/// even between documents.
static NEXT_FONT_NUMBER: AtomicU32 = AtomicU32::new(1);

pub(crate) fn next_internal_name() -> Result<Token> {
    let n = NEXT_FONT_NUMBER.fetch_add(1, Ordering::Relaxed);
    Token::new(format!("F{}", n))
}

/// A font registered with a document: the `/Font` resource object and,
/// when the source asks for them, its descriptor and embedded program.
#[derive(Debug)]
pub struct FontResource {
    pub(crate) id: ObjId,
    pub(crate) name: Token,
    pub(crate) source: Arc<dyn FontSource>,
    pub(crate) descriptor: Option<ObjId>,
    pub(crate) file: Option<ObjId>,
}

impl FontResource {
    pub fn id(&self) -> ObjId {
        self.id
    }

    /// Internal resource name used with `Tf`, e.g. `F12`.
    pub fn name(&self) -> &Token {
        &self.name
    }

    pub fn key(&self) -> &str {
        self.source.key()
    }

    pub fn descriptor_id(&self) -> Option<ObjId> {
        self.descriptor
    }

    pub fn file_id(&self) -> Option<ObjId> {
        self.file
    }

    pub fn to_dictionary(&self) -> Result<Dictionary> {
        let entries = self.source.resource_entries()?;
        let mut dict = Dictionary::new()
            .entry("Type", PdfObject::static_name("Font"))
            .entry("Subtype", PdfObject::Name(entries.subtype))
            .entry("Name", PdfObject::Name(self.name.clone()))
            .entry("BaseFont", PdfObject::Name(entries.base_font));
        if let Some(encoding) = entries.encoding {
            dict.put("Encoding", PdfObject::Name(encoding));
        }
        if let Some((first, last, widths)) = entries.widths {
            dict.put("FirstChar", first as i64);
            dict.put("LastChar", last as i64);
            dict.put(
                "Widths",
                PdfObject::Array(widths.into_iter().map(PdfObject::Integer).collect()),
            );
        }
        if let Some(descriptor) = self.descriptor {
            dict.put("FontDescriptor", descriptor);
        }
        Ok(dict)
    }

    pub fn descriptor_dictionary(&self) -> Result<Dictionary> {
        let entries = self.source.resource_entries()?;
        let metrics = self.source.metrics();
        let [llx, lly, urx, ury] = self.source.bounding_box();
        let mut dict = Dictionary::new()
            .entry("Type", PdfObject::static_name("FontDescriptor"))
            .entry("FontName", PdfObject::Name(entries.base_font))
            .entry("Flags", self.source.flags() as i64)
            .entry(
                "FontBBox",
                crate::objects::Rectangle::integer(llx as i64, lly as i64, urx as i64, ury as i64),
            )
            .entry("ItalicAngle", metrics.italic_angle)
            .entry("Ascent", metrics.ascent as i64)
            .entry("Descent", metrics.descent as i64)
            .entry("CapHeight", metrics.cap_height as i64)
            .entry("StemV", metrics.stem_v as i64);
        if let (Some(file), Some(key)) = (self.file, self.source.embedding_key()) {
            dict.set(key, file);
        }
        Ok(dict)
    }
}

/// Document-scoped map from font identity key to its resource.
#[derive(Debug, Default)]
pub struct FontCache {
    fonts: Mutex<HashMap<String, Arc<FontResource>>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the resource for `key`, creating it with `create` on a
    /// miss. The lock is held across `create` so two callers can never
    /// both build a resource for one key.
    pub fn get_or_insert_with<F>(&self, key: &str, create: F) -> Result<Arc<FontResource>>
    where
        F: FnOnce() -> Result<Arc<FontResource>>,
    {
        let mut fonts = lock(&self.fonts);
        if let Some(existing) = fonts.get(key) {
            return Ok(Arc::clone(existing));
        }
        let resource = create()?;
        fonts.insert(key.to_string(), Arc::clone(&resource));
        Ok(resource)
    }

    pub fn get(&self, key: &str) -> Option<Arc<FontResource>> {
        lock(&self.fonts).get(key).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.fonts).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.fonts).is_empty()
    }
}
