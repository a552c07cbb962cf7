use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::fonts::Font;
use crate::geometry::{Margins, Orientation, PageSize};
use crate::graphics::{GraphicsContext, GraphicsState, Ops};
use crate::lock;
use crate::objects::{Dictionary, ObjId, PdfObject, Rectangle, Token};
use crate::stream::Stream;

static NEXT_PAGE_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Page geometry chosen when the page is added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub size: PageSize,
    pub orientation: Orientation,
    pub margins: Margins,
}

/// A leaf of the page tree.
///
/// Pages are shared (`Arc<Page>`) between the caller and the document and
/// may be drawn on from several threads; the content stream, the drawing
/// state and the font usage map each sit behind their own lock.
#[derive(Debug)]
pub struct Page {
    id: ObjId,
    parent: ObjId,
    document: u64,
    serial: u64,
    width: f64,
    height: f64,
    margins: Margins,
    contents_id: ObjId,
    contents: Arc<Mutex<Stream>>,
    state: Mutex<GraphicsState>,
    fonts: Mutex<BTreeMap<Token, ObjId>>,
}

impl Page {
    pub(crate) fn new(
        id: ObjId,
        parent: ObjId,
        document: u64,
        setup: PageSetup,
        contents_id: ObjId,
        contents: Arc<Mutex<Stream>>,
    ) -> Self {
        let (width, height) = setup.orientation.apply(setup.size.dimensions());
        Page {
            id,
            parent,
            document,
            serial: NEXT_PAGE_SERIAL.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            margins: setup.margins,
            contents_id,
            contents,
            state: Mutex::new(GraphicsState::default()),
            fonts: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn id(&self) -> ObjId {
        self.id
    }

    pub fn contents_id(&self) -> ObjId {
        self.contents_id
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn media_box(&self) -> Rectangle {
        Rectangle::real(0.0, 0.0, self.width, self.height)
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Width between the left and right margins.
    pub fn available_width(&self) -> f64 {
        (self.width - self.margins.left - self.margins.right).max(0.0)
    }

    /// Height between the top and bottom margins.
    pub fn available_height(&self) -> f64 {
        (self.height - self.margins.top - self.margins.bottom).max(0.0)
    }

    /// Open a drawing context. `document` must be the one that created
    /// this page.
    pub fn graphics<'a>(&'a self, document: &'a Document) -> Result<GraphicsContext<'a>> {
        self.check_owner(document)?;
        Ok(GraphicsContext::new(document, self))
    }

    /// Register `font` with the document and record it in this page's
    /// resources. Returns the name to use with `Tf`.
    pub fn use_font(&self, document: &Document, font: &Font) -> Result<Token> {
        self.check_owner(document)?;
        let resource = document.use_font(font.source())?;
        lock(&self.fonts)
            .entry(resource.name().clone())
            .or_insert(resource.id());
        Ok(resource.name().clone())
    }

    /// Font resources used on this page, by internal name.
    pub fn fonts(&self) -> Vec<(Token, ObjId)> {
        lock(&self.fonts)
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect()
    }

    /// Unencoded content written so far.
    pub fn content(&self) -> Vec<u8> {
        lock(&self.contents).data().to_vec()
    }

    /// Saves not yet matched by a restore.
    pub fn open_saves(&self) -> usize {
        lock(&self.state).depth()
    }

    pub fn to_dictionary(&self) -> Dictionary {
        let mut fonts = Dictionary::new();
        for (name, id) in lock(&self.fonts).iter() {
            fonts.set(name.clone(), *id);
        }
        let proc_set = vec![PdfObject::static_name("PDF"), PdfObject::static_name("Text")];
        let mut resources = Dictionary::new();
        if !fonts.is_empty() {
            resources.put("Font", fonts);
        }
        resources.put("ProcSet", proc_set);

        Dictionary::new()
            .entry("Type", PdfObject::static_name("Page"))
            .entry("Parent", self.parent)
            .entry("MediaBox", self.media_box())
            .entry("Resources", resources)
            .entry("Contents", self.contents_id)
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    pub(crate) fn state(&self) -> &Mutex<GraphicsState> {
        &self.state
    }

    pub(crate) fn append_content(&self, bytes: &[u8]) -> Result<()> {
        lock(&self.contents).add_bytes(bytes)
    }

    /// Balance every open save before the page is written.
    pub(crate) fn close_graphics(&self) -> Result<()> {
        let mut state = lock(&self.state);
        let mut ops = Ops::default();
        state.unwind(&mut ops);
        if ops.as_bytes().is_empty() {
            return Ok(());
        }
        log::debug!("page {} closed with unbalanced saves", self.id);
        self.append_content(ops.as_bytes())
    }

    fn check_owner(&self, document: &Document) -> Result<()> {
        if self.document != document.serial() {
            return Err(Error::invalid_argument(format!(
                "page {} belongs to another document",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(setup: PageSetup) -> Page {
        Page::new(
            ObjId(3, 0),
            ObjId(2, 0),
            0,
            setup,
            ObjId(4, 0),
            Arc::new(Mutex::new(Stream::new())),
        )
    }

    #[test]
    fn geometry_follows_setup() {
        let p = page(PageSetup {
            size: PageSize::A4,
            orientation: Orientation::Landscape,
            margins: Margins::uniform(36.0),
        });
        assert_eq!((p.width(), p.height()), (842.0, 595.0));
        assert_eq!(p.available_width(), 770.0);
        assert_eq!(p.available_height(), 523.0);
    }

    #[test]
    fn dictionary_without_fonts() {
        let p = page(PageSetup {
            size: PageSize::A4,
            orientation: Orientation::Portrait,
            margins: Margins::default(),
        });
        let out = String::from_utf8(PdfObject::from(p.to_dictionary()).to_bytes()).unwrap();
        assert_eq!(
            out,
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842 ] \
             /Resources << /ProcSet [/PDF /Text ] >> /Contents 4 0 R >> "
        );
    }

    #[test]
    fn close_graphics_on_clean_page_writes_nothing() {
        let p = page(PageSetup {
            size: PageSize::Letter,
            orientation: Orientation::Portrait,
            margins: Margins::default(),
        });
        p.close_graphics().unwrap();
        assert!(p.content().is_empty());
    }
}
