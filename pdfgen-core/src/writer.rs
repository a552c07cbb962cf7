use std::io::{self, Write};

use crate::error::{Error, Result};
use crate::objects::{Dictionary, ObjId};

/// Magic bytes plus a comment of high-bit bytes that tells transfer
/// tools the file is binary.
pub const FILE_HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

/// Low-level PDF binary writer. Passes bytes through to any `Write`
/// target while tracking the byte offset for the xref table.
pub struct PdfWriter<W: Write> {
    writer: W,
    offset: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(writer: W) -> Self {
        PdfWriter { writer, offset: 0 }
    }

    /// Write the PDF 1.4 header and binary comment.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.write_all(FILE_HEADER)
    }

    /// Frame an indirect object: `<id> <gen> obj\n ... \nendobj\n`.
    /// `body` renders the object's content.
    pub fn write_indirect<F>(&mut self, id: ObjId, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        write!(self, "{} {} obj\n", id.0, id.1)?;
        body(self)?;
        self.write_all(b"\nendobj\n")?;
        Ok(())
    }

    /// Current byte offset in the output.
    pub fn current_offset(&self) -> u64 {
        self.offset
    }

    /// Return the inner writer, consuming this PdfWriter.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Write for PdfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// The file trailer: table size, catalog reference and the xref offset.
#[derive(Debug, Clone)]
pub struct Trailer {
    size: usize,
    root: ObjId,
    info: Option<ObjId>,
    xref_offset: Option<u64>,
}

impl Trailer {
    pub fn new(size: usize, root: ObjId) -> Self {
        Trailer {
            size,
            root,
            info: None,
            xref_offset: None,
        }
    }

    pub fn with_info(mut self, info: Option<ObjId>) -> Self {
        self.info = info;
        self
    }

    pub fn set_xref_offset(&mut self, offset: u64) {
        self.xref_offset = Some(offset);
    }

    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new()
            .entry("Size", self.size as i64)
            .entry("Root", self.root);
        if let Some(info) = self.info {
            dict.put("Info", info);
        }
        dict
    }

    /// Write `trailer`, the dictionary, `startxref` and `%%EOF`.
    /// Nothing follows the EOF marker.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        let offset = self.xref_offset.ok_or_else(|| {
            Error::invalid_operation("trailer written before the xref offset was set")
        })?;
        w.write_all(b"trailer\n")?;
        self.to_dictionary().write_to(w)?;
        write!(w, "\nstartxref\n{}\n%%EOF", offset)?;
        Ok(())
    }
}
