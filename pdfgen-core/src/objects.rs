use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};

use crate::encoding;
use crate::error::{Error, Result};

/// Arrays break their line once the running column would pass this width.
pub const ARRAY_WRAP_COLUMN: usize = 254;

/// Literal strings are continued with `\` + newline every this many
/// encoded characters.
pub const STRING_WRAP_COLUMN: usize = 253;

/// Object identifier: (object_number, generation_number).
/// Generation is always 0 for new documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub u32, pub u16);

impl ObjId {
    /// Object 0 is the head of the free list and never a real object,
    /// so it doubles as the null handle.
    pub const NULL: ObjId = ObjId(0, 65535);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.0, self.1)
    }
}

/// A bare token: the shared representation of name and operator objects.
///
/// Only printable ASCII outside the PDF delimiter set is accepted, so a
/// token always renders verbatim without `#xx` escapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(Cow<'static, str>);

impl Token {
    /// Validate and wrap a runtime string.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        check_token(&s)?;
        Ok(Token(Cow::Owned(s)))
    }

    /// Wrap one of the crate's own literals, already known to be valid.
    pub(crate) fn from_static(s: &'static str) -> Self {
        debug_assert!(check_token(s).is_ok(), "invalid token literal {:?}", s);
        Token(Cow::Borrowed(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn check_token(s: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::invalid_argument("token must not be empty"));
    }
    if let Some(bad) = s.bytes().find(|&b| !is_regular_byte(b)) {
        return Err(Error::invalid_argument(format!(
            "token {:?} contains reserved byte 0x{:02X}",
            s, bad
        )));
    }
    Ok(())
}

fn is_regular_byte(b: u8) -> bool {
    matches!(b, 0x21..=0x7E)
        && !matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
        )
}

/// A rectangle given by two opposite corners. Both corners share one
/// numeric kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rectangle {
    Integer([i64; 4]),
    Real([f64; 4]),
}

impl Rectangle {
    pub fn integer(llx: i64, lly: i64, urx: i64, ury: i64) -> Self {
        Rectangle::Integer([llx, lly, urx, ury])
    }

    pub fn real(llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        Rectangle::Real([llx, lly, urx, ury])
    }

    /// Build from two corner points given as primitives. All four
    /// coordinates must be integers, or all four must be reals.
    pub fn from_corners(
        lower_left: (PdfObject, PdfObject),
        upper_right: (PdfObject, PdfObject),
    ) -> Result<Self> {
        use PdfObject::{Integer, Real};
        match (lower_left, upper_right) {
            ((Integer(a), Integer(b)), (Integer(c), Integer(d))) => {
                Ok(Rectangle::Integer([a, b, c, d]))
            }
            ((Real(a), Real(b)), (Real(c), Real(d))) => Ok(Rectangle::Real([a, b, c, d])),
            _ => Err(Error::invalid_argument(
                "rectangle corners must be all integers or all reals",
            )),
        }
    }

    pub fn width(&self) -> f64 {
        let [llx, _, urx, _] = self.as_f64();
        (urx - llx).abs()
    }

    pub fn height(&self) -> f64 {
        let [_, lly, _, ury] = self.as_f64();
        (ury - lly).abs()
    }

    fn as_f64(&self) -> [f64; 4] {
        match *self {
            Rectangle::Integer(v) => v.map(|n| n as f64),
            Rectangle::Real(v) => v,
        }
    }

    fn elements(&self) -> [PdfObject; 4] {
        match *self {
            Rectangle::Integer(v) => v.map(PdfObject::Integer),
            Rectangle::Real(v) => v.map(PdfObject::Real),
        }
    }
}

/// Ordered key-value pairs. A Vec keeps output order deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: Vec<(Token, PdfObject)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. A replaced entry keeps its position.
    pub fn set(&mut self, key: Token, value: impl Into<PdfObject>) -> &mut Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: Token, value: impl Into<PdfObject>) -> Self {
        self.set(key, value);
        self
    }

    pub(crate) fn put(&mut self, key: &'static str, value: impl Into<PdfObject>) -> &mut Self {
        self.set(Token::from_static(key), value)
    }

    pub(crate) fn entry(self, key: &'static str, value: impl Into<PdfObject>) -> Self {
        self.with(Token::from_static(key), value)
    }

    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<PdfObject> {
        let pos = self.entries.iter().position(|(k, _)| k.as_str() == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Token, &PdfObject)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(b"<< ")?;
        for (key, value) in &self.entries {
            write_token(w, b"/", key)?;
            value.write_to(w)?;
        }
        w.write_all(b">> ")
    }

    pub fn encoded_len(&self) -> usize {
        measure(|c| self.write_to(c))
    }
}

/// Represents PDF object types per PDF 32000-1:2008 Section 7.3.
///
/// Every variant renders with a single trailing space so that encodings
/// can be concatenated without further delimiters.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Rendered with a leading `/`.
    Name(Token),
    /// Content stream operator, rendered bare.
    Operator(Token),
    /// PDF literal string (stored without the enclosing parens).
    /// Characters are written as WinAnsiEncoding bytes.
    LiteralString(String),
    /// Rendered as a hex string `<...>`.
    ByteString(Vec<u8>),
    Array(Vec<PdfObject>),
    Rectangle(Rectangle),
    Dictionary(Dictionary),
    Reference(ObjId),
}

impl PdfObject {
    /// A name object; fails on whitespace, delimiters or an empty name.
    pub fn name(s: &str) -> Result<Self> {
        Token::new(s).map(PdfObject::Name)
    }

    /// A content-stream operator; validated like a name.
    pub fn operator(s: &str) -> Result<Self> {
        Token::new(s).map(PdfObject::Operator)
    }

    pub(crate) fn static_name(s: &'static str) -> Self {
        PdfObject::Name(Token::from_static(s))
    }

    pub fn literal_string(s: &str) -> Self {
        if !encoding::is_encodable(s) {
            log::warn!(
                "literal string {:?} has characters outside WinAnsiEncoding, written as '?'",
                s
            );
        }
        PdfObject::LiteralString(s.to_string())
    }

    pub fn reference(obj_num: u32, gen: u16) -> Self {
        PdfObject::Reference(ObjId(obj_num, gen))
    }

    pub fn array(items: Vec<PdfObject>) -> Self {
        PdfObject::Array(items)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PdfObject::Integer(_) | PdfObject::Real(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            PdfObject::Integer(n) => Some(n as f64),
            PdfObject::Real(f) => Some(f),
            _ => None,
        }
    }

    /// Render this object's encoding into `w`.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        match self {
            PdfObject::Null => w.write_all(b"null "),
            PdfObject::Boolean(true) => w.write_all(b"true "),
            PdfObject::Boolean(false) => w.write_all(b"false "),
            PdfObject::Integer(n) => write!(w, "{} ", n),
            PdfObject::Real(f) => write!(w, "{} ", format_real(*f)),
            PdfObject::Name(t) => write_token(w, b"/", t),
            PdfObject::Operator(t) => write_token(w, b"", t),
            PdfObject::LiteralString(s) => write_literal_string(w, s),
            PdfObject::ByteString(bytes) => {
                w.write_all(b"<")?;
                for b in bytes {
                    write!(w, "{:02X}", b)?;
                }
                w.write_all(b"> ")
            }
            PdfObject::Array(items) => write_array(w, items),
            PdfObject::Rectangle(r) => write_array(w, &r.elements()),
            PdfObject::Dictionary(d) => d.write_to(w),
            PdfObject::Reference(id) => write!(w, "{} {} R ", id.0, id.1),
        }
    }

    /// Length of the encoding, computed without building it.
    pub fn encoded_len(&self) -> usize {
        measure(|c| self.write_to(c))
    }

    /// The encoding as an owned buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        buf
    }
}

impl From<bool> for PdfObject {
    fn from(b: bool) -> Self {
        PdfObject::Boolean(b)
    }
}

impl From<i64> for PdfObject {
    fn from(n: i64) -> Self {
        PdfObject::Integer(n)
    }
}

impl From<f64> for PdfObject {
    fn from(f: f64) -> Self {
        PdfObject::Real(f)
    }
}

impl From<ObjId> for PdfObject {
    fn from(id: ObjId) -> Self {
        PdfObject::Reference(id)
    }
}

impl From<Rectangle> for PdfObject {
    fn from(r: Rectangle) -> Self {
        PdfObject::Rectangle(r)
    }
}

impl From<Dictionary> for PdfObject {
    fn from(d: Dictionary) -> Self {
        PdfObject::Dictionary(d)
    }
}

impl From<Vec<PdfObject>> for PdfObject {
    fn from(items: Vec<PdfObject>) -> Self {
        PdfObject::Array(items)
    }
}

/// A `Write` sink that only counts bytes.
#[derive(Debug, Default)]
pub struct LengthCounter(usize);

impl LengthCounter {
    pub fn len(&self) -> usize {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Write for LengthCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn measure<F>(render: F) -> usize
where
    F: FnOnce(&mut LengthCounter) -> io::Result<()>,
{
    let mut counter = LengthCounter::default();
    // LengthCounter never returns an error.
    let _ = render(&mut counter);
    counter.len()
}

fn write_token<W: Write + ?Sized>(w: &mut W, prefix: &[u8], token: &Token) -> io::Result<()> {
    w.write_all(prefix)?;
    w.write_all(token.as_str().as_bytes())?;
    w.write_all(b" ")
}

fn write_array<W: Write + ?Sized>(w: &mut W, items: &[PdfObject]) -> io::Result<()> {
    w.write_all(b"[")?;
    let mut column = 1;
    for item in items {
        let len = item.encoded_len();
        if len > ARRAY_WRAP_COLUMN {
            if column > 0 {
                w.write_all(b"\n")?;
            }
            item.write_to(w)?;
            w.write_all(b"\n")?;
            column = 0;
        } else {
            if column + len > ARRAY_WRAP_COLUMN {
                w.write_all(b"\n")?;
                column = 0;
            }
            item.write_to(w)?;
            column += len;
        }
    }
    w.write_all(b"] ")
}

/// True when every `)` closes an earlier `(` and none are left open.
fn parens_balanced(s: &str) -> bool {
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

fn write_literal_string<W: Write + ?Sized>(w: &mut W, s: &str) -> io::Result<()> {
    let escape_parens = !parens_balanced(s);
    w.write_all(b"(")?;
    let mut run = 0;
    for c in s.chars() {
        let byte = encoding::encode_char(c);
        let escaped: &[u8] = match byte {
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x08 => b"\\b",
            0x0C => b"\\f",
            b'(' if escape_parens => b"\\(",
            b')' if escape_parens => b"\\)",
            _ => std::slice::from_ref(&byte),
        };
        if run + escaped.len() > STRING_WRAP_COLUMN {
            w.write_all(b"\\\n")?;
            run = 0;
        }
        w.write_all(escaped)?;
        run += escaped.len();
    }
    w.write_all(b") ")
}

/// Format a float for PDF output: no exponent, at most four decimals,
/// integral values without a fractional part.
pub(crate) fn format_real(f: f64) -> String {
    if !f.is_finite() {
        return "0".to_string();
    }
    if f == f.trunc() && f.abs() < 1e15 {
        return format!("{}", f as i64);
    }
    let s = format!("{:.4}", f);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
