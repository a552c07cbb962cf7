use std::io::Write;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::filters::{encode_chain, filter_entry, Filter};
use crate::objects::{Dictionary, PdfObject, Token};

/// Unencoded stream payload.
#[derive(Debug, Clone)]
pub enum StreamData {
    /// Growable buffer owned by the stream.
    Owned(Vec<u8>),
    /// Read-only bytes shared with another owner (e.g. a font program).
    Shared(Arc<[u8]>),
}

impl StreamData {
    fn as_slice(&self) -> &[u8] {
        match self {
            StreamData::Owned(v) => v,
            StreamData::Shared(s) => s,
        }
    }
}

/// A PDF stream: metadata dictionary, payload and filter chain.
///
/// `/Length` and `/Filter` are owned by the stream and rewritten from the
/// payload every time it is written.
#[derive(Debug, Clone)]
pub struct Stream {
    dict: Dictionary,
    data: StreamData,
    filters: Vec<Filter>,
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream {
    pub fn new() -> Self {
        Self::with_filters(Vec::new())
    }

    /// An empty, growable stream whose payload passes through `filters`
    /// (encoding order) when written.
    pub fn with_filters(filters: Vec<Filter>) -> Self {
        let mut stream = Stream {
            dict: Dictionary::new(),
            data: StreamData::Owned(Vec::new()),
            filters,
        };
        stream.dict.put("Length", 0i64);
        stream
    }

    /// A read-only stream over shared bytes.
    pub fn shared(data: Arc<[u8]>, filters: Vec<Filter>) -> Self {
        let mut stream = Self::with_filters(filters);
        stream.data = StreamData::Shared(data);
        stream
    }

    /// Append to the unencoded payload.
    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        match &mut self.data {
            StreamData::Owned(buf) => {
                buf.extend_from_slice(bytes);
                Ok(())
            }
            StreamData::Shared(_) => Err(Error::invalid_operation(
                "cannot append to a read-only stream",
            )),
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.data, StreamData::Shared(_))
    }

    /// The unencoded payload.
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Length before any filter is applied.
    pub fn raw_len(&self) -> usize {
        self.data().len()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Set a metadata entry. `Length` and `Filter` are reserved.
    pub fn set_entry(&mut self, key: Token, value: impl Into<PdfObject>) -> Result<()> {
        if matches!(key.as_str(), "Length" | "Filter") {
            return Err(Error::invalid_argument(format!(
                "/{} is maintained by the stream",
                key
            )));
        }
        self.dict.set(key, value);
        Ok(())
    }

    /// The metadata dictionary as of the last write.
    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// Run the filter chain over the current payload.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_chain(self.data(), &self.filters)
    }

    /// Length of the fully encoded payload.
    pub fn encoded_length(&self) -> Result<usize> {
        Ok(self.encode()?.len())
    }

    /// Write `<<dict>> stream ... endstream`, refreshing `/Length` and
    /// `/Filter` first.
    pub fn write_to<W: Write + ?Sized>(&mut self, w: &mut W) -> Result<()> {
        let encoded = self.encode()?;
        self.dict.put("Length", encoded.len() as i64);
        match filter_entry(&self.filters) {
            Some(entry) => {
                self.dict.put("Filter", entry);
            }
            None => {
                self.dict.remove("Filter");
            }
        }
        self.dict.write_to(w)?;
        w.write_all(b"\nstream\n")?;
        w.write_all(&encoded)?;
        w.write_all(b"\nendstream")?;
        Ok(())
    }
}
