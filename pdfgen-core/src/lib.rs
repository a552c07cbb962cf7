//! Build PDF files from scratch: primitive objects, streams with filter
//! chains, a cross-reference table, and a document with pages, fonts and a
//! drawing API on top.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod document;
pub mod encoding;
pub mod error;
pub mod filters;
pub mod fonts;
pub mod geometry;
pub mod graphics;
pub mod objects;
pub mod page;
pub mod page_tree;
pub mod stream;
pub mod truetype;
pub mod writer;
pub mod xref;

mod afm;

pub use document::{Document, DocumentOptions};
pub use error::{Error, Result};
pub use filters::Filter;
pub use fonts::{BuiltinFont, Font, FontResource, FontSource, TextExtent};
pub use geometry::{Margins, Orientation, PageSize, Point};
pub use graphics::{Color, DashStyle, GraphicsContext, Pen, SavedState};
pub use objects::{Dictionary, ObjId, PdfObject, Rectangle, Token};
pub use page::{Page, PageSetup};
pub use stream::Stream;
pub use truetype::TrueTypeFont;

/// Lock `m`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
