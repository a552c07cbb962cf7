use pdfgen_core::writer::{PdfWriter, Trailer, FILE_HEADER};
use pdfgen_core::xref::{XrefSlot, XrefTable};
use pdfgen_core::{Error, ObjId, PdfObject};
use proptest::prelude::*;

fn xref_text(table: &XrefTable) -> String {
    let mut buf = Vec::new();
    table.write_to(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

/// Parse `xref` records into (field1, generation, kind).
fn records(text: &str) -> Vec<(u64, u16, char)> {
    text.lines()
        .skip(2)
        .map(|line| {
            let mut parts = line.split(' ');
            let a = parts.next().unwrap().parse().unwrap();
            let b = parts.next().unwrap().parse().unwrap();
            let kind = parts.next().unwrap().chars().next().unwrap();
            (a, b, kind)
        })
        .collect()
}

#[test]
fn unresolved_slots_form_the_free_list() {
    let table = XrefTable::new();
    let a = table.claim_slot();
    let _b = table.claim_slot();
    let c = table.claim_slot();
    let _d = table.claim_slot();
    table.resolve_slot(a, 15).unwrap();
    table.resolve_slot(c, 99).unwrap();

    let text = xref_text(&table);
    assert!(text.starts_with("xref\n0 5\n"));
    assert_eq!(
        records(&text),
        vec![
            (2, 65535, 'f'),
            (15, 0, 'n'),
            (4, 0, 'f'),
            (99, 0, 'n'),
            (0, 0, 'f'),
        ]
    );
}

#[test]
fn resolving_slot_zero_fails() {
    let table = XrefTable::new();
    table.claim_slot();
    assert!(matches!(
        table.resolve_slot(ObjId(0, 0), 10),
        Err(Error::OutOfRange { id: 0, count: 2 })
    ));
    assert!(matches!(
        table.resolve_slot(ObjId(9, 0), 10),
        Err(Error::OutOfRange { id: 9, .. })
    ));
}

#[test]
fn resolve_twice_keeps_last_offset() {
    let table = XrefTable::new();
    let id = table.claim_slot();
    table.resolve_slot(id, 10).unwrap();
    table.resolve_slot(id, 20).unwrap();
    assert_eq!(
        table.slot(1),
        Some(XrefSlot::Occupied {
            generation: 0,
            offset: 20
        })
    );
}

#[test]
fn framed_object_and_trailer() {
    let mut w = PdfWriter::new(Vec::new());
    w.write_header().unwrap();
    let table = XrefTable::new();
    let id = table.claim_slot();
    table.resolve_slot(id, w.current_offset()).unwrap();
    w.write_indirect(id, |w| {
        PdfObject::Integer(42).write_to(w)?;
        Ok(())
    })
    .unwrap();
    let xref_offset = w.current_offset();
    table.write_to(&mut w).unwrap();
    let mut trailer = Trailer::new(table.len(), id);
    trailer.set_xref_offset(xref_offset);
    trailer.write_to(&mut w).unwrap();

    let bytes = w.into_inner();
    assert!(bytes.starts_with(FILE_HEADER));
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("1 0 obj\n42 \nendobj\n"));
    assert!(text.contains(&format!("{:010} 00000 n \n", FILE_HEADER.len())));
    assert!(text.ends_with(&format!(
        "trailer\n<< /Size 2 /Root 1 0 R >> \nstartxref\n{}\n%%EOF",
        xref_offset
    )));
}

proptest! {
    #[test]
    fn free_list_links_every_free_slot(resolved in prop::collection::vec(any::<bool>(), 0..40)) {
        let table = XrefTable::new();
        for (i, &used) in resolved.iter().enumerate() {
            let id = table.claim_slot();
            if used {
                table.resolve_slot(id, 100 + i as u64).unwrap();
            }
        }
        let text = xref_text(&table);
        prop_assert!(text.lines().skip(2).all(|l| l.len() + 1 == 20));

        let recs = records(&text);
        prop_assert_eq!(recs.len(), resolved.len() + 1);
        prop_assert_eq!(recs[0].1, 65535);

        let free: Vec<usize> = recs
            .iter()
            .enumerate()
            .filter(|(_, r)| r.2 == 'f')
            .map(|(i, _)| i)
            .collect();
        for (pos, &index) in free.iter().enumerate() {
            let next = free.get(pos + 1).copied().unwrap_or(0);
            prop_assert_eq!(recs[index].0, next as u64);
        }
        for (i, &used) in resolved.iter().enumerate() {
            if used {
                prop_assert_eq!(recs[i + 1], (100 + i as u64, 0, 'n'));
            }
        }
    }
}
