use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::filters::Filter;
use crate::fonts::{FontCache, FontResource, FontSource, next_internal_name};
use crate::geometry::{Margins, Orientation, PageSize};
use crate::lock;
use crate::objects::{Dictionary, ObjId, PdfObject, Token};
use crate::page::{Page, PageSetup};
use crate::page_tree::{Catalog, PageTreeNode};
use crate::stream::Stream;
use crate::writer::{PdfWriter, Trailer};
use crate::xref::XrefTable;

static NEXT_DOCUMENT_SERIAL: AtomicU64 = AtomicU64::new(1);

const PRODUCER: &str = concat!("pdfgen-core ", env!("CARGO_PKG_VERSION"));

/// Document-wide settings: stream encoding and the geometry given to
/// pages added without an explicit setup.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOptions {
    /// Run content and font streams through `FlateDecode`.
    pub compress: bool,
    /// Append `ASCII85Decode` so the body stays 7-bit clean.
    pub ascii_transport: bool,
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub margins: Margins,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        DocumentOptions {
            compress: false,
            ascii_transport: false,
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margins: Margins::default(),
        }
    }
}

impl DocumentOptions {
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_ascii_transport(mut self, ascii: bool) -> Self {
        self.ascii_transport = ascii;
        self
    }

    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Filter chain in encoding order.
    pub fn stream_filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if self.compress {
            filters.push(Filter::FlateDecode);
        }
        if self.ascii_transport {
            filters.push(Filter::ASCII85Decode);
        }
        filters
    }

    fn page_setup(&self) -> PageSetup {
        PageSetup {
            size: self.page_size,
            orientation: self.orientation,
            margins: self.margins,
        }
    }
}

/// What an indirect object is rebuilt from at write time.
#[derive(Debug, Clone)]
enum Body {
    Catalog,
    PageTree,
    Page(Arc<Page>),
    Stream(Arc<Mutex<Stream>>),
    Font(Arc<FontResource>),
    FontDescriptor(Arc<FontResource>),
    Info,
}

#[derive(Debug, Clone)]
struct Registered {
    id: ObjId,
    body: Body,
}

#[derive(Debug)]
struct Info {
    id: ObjId,
    entries: Dictionary,
}

/// High-level API for building PDF documents.
///
/// A document owns every indirect object it will write, in registration
/// order, and rebuilds each one's dictionary when written. All methods take
/// `&self`, so a document can be shared between threads that build pages
/// in parallel.
///
/// ```no_run
/// use pdfgen_core::{BuiltinFont, Document, Font, Point};
///
/// let doc = Document::new();
/// let page = doc.add_page()?;
/// let gc = page.graphics(&doc)?;
/// let font = Font::builtin(BuiltinFont::Helvetica, 12.0);
/// gc.draw_string("Hello", &font, Default::default(), Point::new(72.0, 72.0))?;
/// doc.write_to_file("hello.pdf")?;
/// # Ok::<(), pdfgen_core::Error>(())
/// ```
#[derive(Debug)]
pub struct Document {
    serial: u64,
    options: Mutex<DocumentOptions>,
    xref: XrefTable,
    objects: Mutex<Vec<Registered>>,
    catalog: Catalog,
    page_tree: Mutex<PageTreeNode>,
    pages: Mutex<Vec<Arc<Page>>>,
    fonts: FontCache,
    info: Mutex<Option<Info>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    /// Create a document; the catalogue and page tree root are registered
    /// immediately as objects 1 and 2.
    pub fn with_options(options: DocumentOptions) -> Self {
        let xref = XrefTable::new();
        let catalog_id = xref.claim_slot();
        let root_id = xref.claim_slot();
        let objects = vec![
            Registered {
                id: catalog_id,
                body: Body::Catalog,
            },
            Registered {
                id: root_id,
                body: Body::PageTree,
            },
        ];
        Document {
            serial: NEXT_DOCUMENT_SERIAL.fetch_add(1, Ordering::Relaxed),
            options: Mutex::new(options),
            xref,
            objects: Mutex::new(objects),
            catalog: Catalog::new(catalog_id, root_id),
            page_tree: Mutex::new(PageTreeNode::new(root_id, None)),
            pages: Mutex::new(Vec::new()),
            fonts: FontCache::new(),
            info: Mutex::new(None),
        }
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    pub fn options(&self) -> DocumentOptions {
        lock(&self.options).clone()
    }

    /// Applies to streams created after the call.
    pub fn set_compression(&self, compress: bool) -> &Self {
        lock(&self.options).compress = compress;
        self
    }

    pub fn set_ascii_transport(&self, ascii: bool) -> &Self {
        lock(&self.options).ascii_transport = ascii;
        self
    }

    pub fn set_default_page_size(&self, size: PageSize) -> &Self {
        lock(&self.options).page_size = size;
        self
    }

    pub fn set_default_orientation(&self, orientation: Orientation) -> &Self {
        lock(&self.options).orientation = orientation;
        self
    }

    pub fn set_default_margins(&self, margins: Margins) -> &Self {
        lock(&self.options).margins = margins;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn xref(&self) -> &XrefTable {
        &self.xref
    }

    /// Number of registered indirect objects.
    pub fn object_count(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn pages(&self) -> Vec<Arc<Page>> {
        lock(&self.pages).clone()
    }

    /// Append a page with the document's default geometry.
    pub fn add_page(&self) -> Result<Arc<Page>> {
        let setup = lock(&self.options).page_setup();
        self.add_page_with(setup)
    }

    /// Append a page with explicit geometry.
    pub fn add_page_with(&self, setup: PageSetup) -> Result<Arc<Page>> {
        let (width, height) = setup.orientation.apply(setup.size.dimensions());
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(Error::invalid_argument(format!(
                "page size {} x {} is not positive",
                width, height
            )));
        }
        let filters = lock(&self.options).stream_filters();
        let root = self.catalog.pages();
        let contents = Arc::new(Mutex::new(Stream::with_filters(filters)));

        // The tree insert shares the arena's critical section so a write
        // never sees a page its parent does not list.
        let page = {
            let mut objects = lock(&self.objects);
            let page_id = self.xref.claim_slot();
            let contents_id = self.xref.claim_slot();
            lock(&self.page_tree).add_child(page_id, 1)?;
            let page = Arc::new(Page::new(
                page_id,
                root,
                self.serial,
                setup,
                contents_id,
                Arc::clone(&contents),
            ));
            objects.push(Registered {
                id: page_id,
                body: Body::Page(Arc::clone(&page)),
            });
            objects.push(Registered {
                id: contents_id,
                body: Body::Stream(contents),
            });
            lock(&self.pages).push(Arc::clone(&page));
            page
        };

        log::debug!("added page {} ({} x {})", page.id(), width, height);
        Ok(page)
    }

    /// Look up `source` in the font cache, registering its resource (and
    /// descriptor and program stream when needed) on first use.
    pub fn use_font(&self, source: &Arc<dyn FontSource>) -> Result<Arc<FontResource>> {
        self.fonts
            .get_or_insert_with(source.key(), || self.register_font(source))
    }

    fn register_font(&self, source: &Arc<dyn FontSource>) -> Result<Arc<FontResource>> {
        let embedded = if source.requires_embedding() {
            let data = source.embedded_data().ok_or_else(|| {
                Error::Font(format!("font {} has no program to embed", source.key()))
            })?;
            let filters = lock(&self.options).stream_filters();
            let mut stream = Stream::shared(data, filters);
            stream.set_entry(
                Token::from_static("Length1"),
                source.embedded_len() as i64,
            )?;
            Some(stream)
        } else {
            None
        };
        let needs_descriptor = source.requires_descriptor() || embedded.is_some();
        let name = next_internal_name()?;

        let mut objects = lock(&self.objects);
        let id = self.xref.claim_slot();
        let descriptor = needs_descriptor.then(|| self.xref.claim_slot());
        let file = embedded.as_ref().map(|_| self.xref.claim_slot());
        let resource = Arc::new(FontResource {
            id,
            name,
            source: Arc::clone(source),
            descriptor,
            file,
        });
        objects.push(Registered {
            id,
            body: Body::Font(Arc::clone(&resource)),
        });
        if let Some(descriptor) = descriptor {
            objects.push(Registered {
                id: descriptor,
                body: Body::FontDescriptor(Arc::clone(&resource)),
            });
        }
        if let (Some(file), Some(stream)) = (file, embedded) {
            objects.push(Registered {
                id: file,
                body: Body::Stream(Arc::new(Mutex::new(stream))),
            });
        }
        log::debug!(
            "registered font {} as /{} (object {})",
            resource.key(),
            resource.name(),
            id
        );
        Ok(resource)
    }

    /// Record a document information entry such as `Title` or `Author`.
    pub fn set_info(&self, key: &str, value: &str) -> Result<&Self> {
        let key = Token::new(key)?;
        let mut info = lock(&self.info);
        match info.as_mut() {
            Some(info) => {
                info.entries.set(key, PdfObject::literal_string(value));
            }
            None => {
                let mut objects = lock(&self.objects);
                let id = self.xref.claim_slot();
                objects.push(Registered {
                    id,
                    body: Body::Info,
                });
                *info = Some(Info {
                    id,
                    entries: Dictionary::new().with(key, PdfObject::literal_string(value)),
                });
            }
        }
        Ok(self)
    }

    fn info_id(&self) -> Option<ObjId> {
        lock(&self.info).as_ref().map(|info| info.id)
    }

    fn info_dictionary(&self) -> Dictionary {
        let mut dict = lock(&self.info)
            .as_ref()
            .map(|info| info.entries.clone())
            .unwrap_or_default();
        if dict.get("Producer").is_none() {
            dict.put("Producer", PdfObject::literal_string(PRODUCER));
        }
        dict
    }

    /// Render one object body, taking only the locks it needs. The page
    /// tree comes from the snapshot taken with the object list.
    fn render_body(&self, body: &Body, tree: &PageTreeNode) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        match body {
            Body::Catalog => self.catalog.to_dictionary().write_to(&mut buf)?,
            Body::PageTree => tree.to_dictionary().write_to(&mut buf)?,
            Body::Page(page) => page.to_dictionary().write_to(&mut buf)?,
            Body::Stream(stream) => lock(stream).write_to(&mut buf)?,
            Body::Font(font) => font.to_dictionary()?.write_to(&mut buf)?,
            Body::FontDescriptor(font) => font.descriptor_dictionary()?.write_to(&mut buf)?,
            Body::Info => self.info_dictionary().write_to(&mut buf)?,
        }
        Ok(buf)
    }

    /// Write the complete file to `out` and hand it back.
    ///
    /// Open saves on every page are closed first. The document stays
    /// usable; writing again produces the file for its state at that time.
    pub fn write<W: Write>(&self, out: W) -> Result<W> {
        let mut writer = PdfWriter::new(out);
        writer.write_header()?;

        for page in self.pages() {
            page.close_graphics()?;
        }

        let (objects, tree) = {
            let objects = lock(&self.objects);
            let tree = lock(&self.page_tree).clone();
            (objects.clone(), tree)
        };
        for object in &objects {
            let body = self.render_body(&object.body, &tree)?;
            self.xref.resolve_slot(object.id, writer.current_offset())?;
            writer.write_indirect(object.id, |w| {
                w.write_all(&body)?;
                Ok(())
            })?;
        }

        let xref_offset = writer.current_offset();
        self.xref.write_to(&mut writer)?;

        let mut trailer =
            Trailer::new(self.xref.len(), self.catalog.id()).with_info(self.info_id());
        trailer.set_xref_offset(xref_offset);
        trailer.write_to(&mut writer)?;
        writer.flush()?;

        log::info!(
            "wrote PDF: {} objects, {} bytes",
            objects.len(),
            writer.current_offset()
        );
        Ok(writer.into_inner())
    }

    /// The complete file as bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.write(Vec::new())
    }

    /// Build the file in memory, then write it to `path` in one go.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
