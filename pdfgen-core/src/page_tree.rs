use crate::error::{Error, Result};
use crate::objects::{Dictionary, ObjId, PdfObject};

/// An interior node of the page tree (`/Type /Pages`).
///
/// Each kid is recorded together with the number of leaf pages below it,
/// so `/Count` can be written without walking the subtree.
#[derive(Debug, Clone)]
pub struct PageTreeNode {
    id: ObjId,
    parent: Option<ObjId>,
    kids: Vec<(ObjId, usize)>,
}

impl PageTreeNode {
    pub fn new(id: ObjId, parent: Option<ObjId>) -> Self {
        PageTreeNode {
            id,
            parent,
            kids: Vec::new(),
        }
    }

    pub fn id(&self) -> ObjId {
        self.id
    }

    pub fn parent(&self) -> Option<ObjId> {
        self.parent
    }

    /// Append a kid. A page leaf counts as one; a subtree passes its own
    /// `count()`.
    pub fn add_child(&mut self, child: ObjId, leaves: usize) -> Result<()> {
        if child.is_null() {
            return Err(Error::invalid_argument("page tree child is missing"));
        }
        self.kids.push((child, leaves));
        Ok(())
    }

    pub fn kids(&self) -> impl Iterator<Item = ObjId> + '_ {
        self.kids.iter().map(|(id, _)| *id)
    }

    /// Leaf pages below this node.
    pub fn count(&self) -> usize {
        self.kids.iter().map(|(_, leaves)| leaves).sum()
    }

    pub fn to_dictionary(&self) -> Dictionary {
        let kids = self.kids().map(PdfObject::Reference).collect::<Vec<_>>();
        let mut dict = Dictionary::new()
            .entry("Type", PdfObject::static_name("Pages"))
            .entry("Kids", kids)
            .entry("Count", self.count() as i64);
        if let Some(parent) = self.parent {
            dict.put("Parent", parent);
        }
        dict
    }
}

/// The document catalogue: entry point of the object graph.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    id: ObjId,
    pages: ObjId,
}

impl Catalog {
    pub fn new(id: ObjId, pages: ObjId) -> Self {
        Catalog { id, pages }
    }

    pub fn id(&self) -> ObjId {
        self.id
    }

    pub fn pages(&self) -> ObjId {
        self.pages
    }

    pub fn to_dictionary(&self) -> Dictionary {
        Dictionary::new()
            .entry("Type", PdfObject::static_name("Catalog"))
            .entry("Pages", self.pages)
    }
}
