//! Stream encoders.
//!
//! Each filter is a pure transform from bytes to bytes. A stream applies
//! its filters in encoding order and lists their names in decoding order,
//! so a reader can undo them front to back.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};
use crate::objects::{PdfObject, Token};

/// A single encoding step of a stream's filter chain.
pub trait StreamEncoder {
    /// Encode `input`. Implementations keep no state between calls.
    fn encode(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// The `/Filter` name a reader uses to undo this step.
    fn name(&self) -> &'static str;
}

/// The filters this crate can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    /// zlib/deflate compression
    FlateDecode,
    /// Hex pairs terminated by `>`
    ASCIIHexDecode,
    /// Base-85 terminated by `~>`
    ASCII85Decode,
}

impl Filter {
    pub fn from_name(name: &str) -> Result<Filter> {
        match name {
            "FlateDecode" => Ok(Filter::FlateDecode),
            "ASCIIHexDecode" => Ok(Filter::ASCIIHexDecode),
            "ASCII85Decode" => Ok(Filter::ASCII85Decode),
            other => Err(Error::invalid_argument(format!(
                "unsupported filter {:?}",
                other
            ))),
        }
    }

    fn encoder(&self) -> &'static dyn StreamEncoder {
        match self {
            Filter::FlateDecode => &FlateEncoder,
            Filter::ASCIIHexDecode => &AsciiHexEncoder,
            Filter::ASCII85Decode => &Ascii85Encoder,
        }
    }

    pub fn name(&self) -> &'static str {
        self.encoder().name()
    }

    pub fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.encoder().encode(input)
    }

    pub fn to_name_object(&self) -> PdfObject {
        PdfObject::Name(Token::from_static(self.name()))
    }
}

/// Run `data` through `filters` in order.
pub fn encode_chain(data: &[u8], filters: &[Filter]) -> Result<Vec<u8>> {
    let mut iter = filters.iter();
    let Some(first) = iter.next() else {
        return Ok(data.to_vec());
    };
    let mut out = first.encode(data)?;
    for filter in iter {
        out = filter.encode(&out)?;
    }
    Ok(out)
}

/// The `/Filter` value for a chain: `None` when empty, a bare name for a
/// single filter, otherwise an array in decoding order.
pub fn filter_entry(filters: &[Filter]) -> Option<PdfObject> {
    match filters {
        [] => None,
        [only] => Some(only.to_name_object()),
        _ => Some(PdfObject::Array(
            filters.iter().rev().map(Filter::to_name_object).collect(),
        )),
    }
}

/// FlateDecode via flate2's zlib encoder.
pub struct FlateEncoder;

impl StreamEncoder for FlateEncoder {
    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(input)?;
        Ok(encoder.finish()?)
    }

    fn name(&self) -> &'static str {
        "FlateDecode"
    }
}

pub struct AsciiHexEncoder;

impl StreamEncoder for AsciiHexEncoder {
    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
        let mut out = Vec::with_capacity(input.len() * 2 + 1);
        for &b in input {
            out.push(DIGITS[(b >> 4) as usize]);
            out.push(DIGITS[(b & 0x0F) as usize]);
        }
        out.push(b'>');
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "ASCIIHexDecode"
    }
}

pub struct Ascii85Encoder;

impl StreamEncoder for Ascii85Encoder {
    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(input.len() * 5 / 4 + 7);
        for chunk in input.chunks(4) {
            let mut group = [0u8; 4];
            group[..chunk.len()].copy_from_slice(chunk);
            let value = u32::from_be_bytes(group);
            if value == 0 && chunk.len() == 4 {
                out.push(b'z');
                continue;
            }
            let mut digits = [0u8; 5];
            let mut v = value;
            for d in digits.iter_mut().rev() {
                *d = b'!' + (v % 85) as u8;
                v /= 85;
            }
            out.extend_from_slice(&digits[..chunk.len() + 1]);
        }
        out.extend_from_slice(b"~>");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "ASCII85Decode"
    }
}
