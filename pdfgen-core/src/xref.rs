use std::io::{self, Write};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::lock;
use crate::objects::ObjId;

/// Generation stored in the free-list head.
const HEAD_GENERATION: u16 = 65535;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefSlot {
    /// Claimed but not yet written.
    Free { generation: u16 },
    /// Written at `offset` bytes from the start of the file.
    Occupied { generation: u16, offset: u64 },
}

/// Cross-reference table: one slot per object number.
///
/// Slot 0 is the head of the free list. Claiming and resolving go through
/// an internal lock so pages built on different threads can register
/// objects against one table.
#[derive(Debug)]
pub struct XrefTable {
    slots: Mutex<Vec<XrefSlot>>,
}

impl Default for XrefTable {
    fn default() -> Self {
        Self::new()
    }
}

impl XrefTable {
    pub fn new() -> Self {
        XrefTable {
            slots: Mutex::new(vec![XrefSlot::Free {
                generation: HEAD_GENERATION,
            }]),
        }
    }

    /// Reserve the next object number. The slot stays free until
    /// [`resolve_slot`](Self::resolve_slot) records its offset.
    pub fn claim_slot(&self) -> ObjId {
        let mut slots = lock(&self.slots);
        let num = slots.len() as u32;
        slots.push(XrefSlot::Free { generation: 0 });
        ObjId(num, 0)
    }

    /// Mark a claimed slot as occupied at `offset`.
    ///
    /// Resolving the same slot again overwrites the offset, so a document
    /// can be written more than once.
    pub fn resolve_slot(&self, id: ObjId, offset: u64) -> Result<()> {
        let mut slots = lock(&self.slots);
        let count = slots.len();
        if id.0 == 0 || id.0 as usize >= count {
            return Err(Error::OutOfRange { id: id.0, count });
        }
        log::trace!("xref: object {} at offset {}", id.0, offset);
        slots[id.0 as usize] = XrefSlot::Occupied {
            generation: id.1,
            offset,
        };
        Ok(())
    }

    /// Number of slots including the free-list head; the trailer's `/Size`.
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    /// Always false: slot 0 exists from construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn slot(&self, num: u32) -> Option<XrefSlot> {
        lock(&self.slots).get(num as usize).copied()
    }

    /// Write the `xref` section. Every record is exactly 20 bytes.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        let slots = lock(&self.slots).clone();
        write!(w, "xref\n0 {}\n", slots.len())?;
        for (index, slot) in slots.iter().enumerate() {
            match *slot {
                XrefSlot::Occupied { generation, offset } => {
                    write!(w, "{:010} {:05} n \n", offset, generation)?;
                }
                XrefSlot::Free { generation } => {
                    let next = next_free(&slots, index);
                    let generation = if index == 0 {
                        HEAD_GENERATION
                    } else {
                        generation
                    };
                    write!(w, "{:010} {:05} f \n", next, generation)?;
                }
            }
        }
        Ok(())
    }
}

/// First free slot after `index`, or 0 when the list wraps.
fn next_free(slots: &[XrefSlot], index: usize) -> usize {
    slots
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, s)| matches!(s, XrefSlot::Free { .. }))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
