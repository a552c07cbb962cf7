use std::sync::Arc;

use pdfgen_core::fonts::{FontMetrics, FontResourceEntries};
use pdfgen_core::{
    BuiltinFont, Color, Document, DocumentOptions, Error, Font, FontSource, Margins, Orientation,
    PageSetup, PageSize, Point, Result, TextExtent, Token,
};

/// Helper: find a byte pattern in a buffer.
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Helper: check that a byte pattern exists in the buffer.
fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    find_bytes(haystack, needle).is_some()
}

fn count_bytes(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// A font that must be embedded, with a fixed program.
#[derive(Debug)]
struct EmbeddedStub {
    program: Option<Arc<[u8]>>,
}

impl FontSource for EmbeddedStub {
    fn key(&self) -> &str {
        "StubSans"
    }

    fn requires_descriptor(&self) -> bool {
        true
    }

    fn requires_embedding(&self) -> bool {
        true
    }

    fn embedding_key(&self) -> Option<Token> {
        Some(Token::new("FontFile2").unwrap())
    }

    fn embedded_data(&self) -> Option<Arc<[u8]>> {
        self.program.clone()
    }

    fn flags(&self) -> u32 {
        32
    }

    fn metrics(&self) -> FontMetrics {
        FontMetrics {
            ascent: 800,
            descent: -200,
            cap_height: 700,
            italic_angle: 0.0,
            stem_v: 80,
        }
    }

    fn bounding_box(&self) -> [i32; 4] {
        [0, -200, 1000, 800]
    }

    fn measure(&self, text: &str, size: f64) -> TextExtent {
        TextExtent {
            width: text.chars().count() as f64 * size * 0.5,
            height: size,
        }
    }

    fn resource_entries(&self) -> Result<FontResourceEntries> {
        Ok(FontResourceEntries {
            subtype: Token::new("TrueType").unwrap(),
            base_font: Token::new("StubSans").unwrap(),
            encoding: Some(Token::new("WinAnsiEncoding").unwrap()),
            widths: Some((32, 33, vec![500, 500])),
        })
    }
}

fn stub_font() -> Arc<dyn FontSource> {
    Arc::new(EmbeddedStub {
        program: Some(Arc::from(vec![7u8; 300])),
    })
}

#[test]
fn empty_a4_page_document() {
    let doc = Document::new();
    doc.add_page().unwrap();
    let bytes = doc.to_bytes().unwrap();

    assert!(bytes.starts_with(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n"));
    let body = "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >> \nendobj\n\
                2 0 obj\n<< /Type /Pages /Kids [3 0 R ] /Count 1 >> \nendobj\n\
                3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842 ] \
                /Resources << /ProcSet [/PDF /Text ] >> /Contents 4 0 R >> \nendobj\n\
                4 0 obj\n<< /Length 0 >> \nstream\n\nendstream\nendobj\n";
    assert_eq!(&bytes[15..15 + body.len()], body.as_bytes());

    let offsets: Vec<usize> = (1..=4)
        .map(|n| find_bytes(&bytes, format!("{} 0 obj\n", n).as_bytes()).unwrap())
        .collect();
    assert_eq!(offsets[0], 15);

    let xref_pos = find_bytes(&bytes, b"xref\n").unwrap();
    let mut expected = String::from("xref\n0 5\n0000000000 65535 f \n");
    for off in &offsets {
        expected.push_str(&format!("{:010} 00000 n \n", off));
    }
    expected.push_str(&format!(
        "trailer\n<< /Size 5 /Root 1 0 R >> \nstartxref\n{}\n%%EOF",
        xref_pos
    ));
    assert_eq!(&bytes[xref_pos..], expected.as_bytes());
}

#[test]
fn writing_twice_gives_identical_files() {
    let doc = Document::new();
    let page = doc.add_page().unwrap();
    let gc = page.graphics(&doc).unwrap();
    gc.draw_string(
        "Hello",
        &Font::builtin(BuiltinFont::Helvetica, 12.0),
        Color::BLACK,
        Point::new(72.0, 72.0),
    )
    .unwrap();
    let first = doc.to_bytes().unwrap();
    let second = doc.to_bytes().unwrap();
    assert_eq!(first, second);
}

#[test]
fn one_font_resource_per_key() {
    let doc = Document::new();
    let p1 = doc.add_page().unwrap();
    let p2 = doc.add_page().unwrap();
    let small = Font::builtin(BuiltinFont::TimesRoman, 10.0);
    let large = small.with_size(24.0);

    p1.graphics(&doc)
        .unwrap()
        .draw_string("a", &small, Color::BLACK, Point::new(10.0, 10.0))
        .unwrap();
    p2.graphics(&doc)
        .unwrap()
        .draw_string("b", &large, Color::BLACK, Point::new(10.0, 10.0))
        .unwrap();

    let first = doc.use_font(small.source()).unwrap();
    let second = doc.use_font(large.source()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(p1.fonts(), p2.fonts());

    let bytes = doc.to_bytes().unwrap();
    assert_eq!(count_bytes(&bytes, b"/Type /Font "), 1);
    assert!(contains_bytes(&bytes, b"/BaseFont /Times-Roman "));
    let entry = format!("/Font << /{} {} 0 R >> ", first.name(), first.id().0);
    assert_eq!(count_bytes(&bytes, entry.as_bytes()), 2);
}

#[test]
fn embedded_font_gets_descriptor_and_program() {
    let doc = Document::new();
    let resource = doc.use_font(&stub_font()).unwrap();
    let descriptor = resource.descriptor_id().unwrap();
    let file = resource.file_id().unwrap();
    assert_eq!(descriptor.0, resource.id().0 + 1);
    assert_eq!(file.0, resource.id().0 + 2);

    let bytes = doc.to_bytes().unwrap();
    assert!(contains_bytes(
        &bytes,
        format!("/FontDescriptor {} 0 R ", descriptor.0).as_bytes()
    ));
    assert!(contains_bytes(
        &bytes,
        format!("/FontFile2 {} 0 R ", file.0).as_bytes()
    ));
    assert!(contains_bytes(&bytes, b"<< /Length 300 /Length1 300 >> \nstream\n"));
    assert!(contains_bytes(&bytes, b"/FirstChar 32 /LastChar 33 /Widths [500 500 ] "));
}

#[test]
fn missing_program_is_a_font_error() {
    let doc = Document::new();
    let source: Arc<dyn FontSource> = Arc::new(EmbeddedStub { program: None });
    assert!(matches!(doc.use_font(&source), Err(Error::Font(_))));
    assert_eq!(doc.object_count(), 2);
}

#[test]
fn compression_applies_to_content_and_fonts() {
    let doc = Document::with_options(DocumentOptions::default().with_compression(true));
    let page = doc.add_page().unwrap();
    let gc = page.graphics(&doc).unwrap();
    let font = Font::new(stub_font(), 11.0);
    gc.draw_string("compressed", &font, Color::BLACK, Point::new(50.0, 50.0))
        .unwrap();

    let bytes = doc.to_bytes().unwrap();
    assert_eq!(count_bytes(&bytes, b"/Filter /FlateDecode "), 2);
    assert!(contains_bytes(&bytes, b"/Length1 300 "));
    assert!(!contains_bytes(&bytes, b"(compressed) Tj"));
}

#[test]
fn ascii_transport_chain_is_listed_outermost_first() {
    let doc = Document::new();
    doc.set_compression(true).set_ascii_transport(true);
    doc.add_page().unwrap();
    let bytes = doc.to_bytes().unwrap();
    assert!(contains_bytes(&bytes, b"/Filter [/ASCII85Decode /FlateDecode ] "));
}

#[test]
fn info_dictionary_is_referenced_from_trailer() {
    let doc = Document::new();
    doc.set_info("Title", "Quarterly (draft)").unwrap();
    doc.set_info("Author", "Ops").unwrap();
    doc.add_page().unwrap();
    let bytes = doc.to_bytes().unwrap();

    assert!(contains_bytes(&bytes, b"/Title (Quarterly (draft)) "));
    assert!(contains_bytes(&bytes, b"/Author (Ops) "));
    assert!(contains_bytes(&bytes, b"/Producer (pdfgen-core "));
    assert!(contains_bytes(&bytes, b"/Root 1 0 R /Info 3 0 R >> "));
}

#[test]
fn no_info_without_entries() {
    let doc = Document::new();
    doc.add_page().unwrap();
    let bytes = doc.to_bytes().unwrap();
    assert!(!contains_bytes(&bytes, b"/Info"));
    assert!(!contains_bytes(&bytes, b"/Producer"));
}

#[test]
fn page_defaults_and_explicit_setup() {
    let doc = Document::new();
    doc.set_default_page_size(PageSize::Letter)
        .set_default_margins(Margins::uniform(36.0));
    let letter = doc.add_page().unwrap();
    assert_eq!((letter.width(), letter.height()), (612.0, 792.0));
    assert_eq!(letter.available_width(), 540.0);

    let wide = doc
        .add_page_with(PageSetup {
            size: PageSize::A5,
            orientation: Orientation::Landscape,
            margins: Margins::default(),
        })
        .unwrap();
    assert_eq!((wide.width(), wide.height()), (595.0, 420.0));

    let bytes = doc.to_bytes().unwrap();
    assert!(contains_bytes(&bytes, b"/MediaBox [0 0 612 792 ] "));
    assert!(contains_bytes(&bytes, b"/MediaBox [0 0 595 420 ] "));
    assert!(contains_bytes(&bytes, b"/Kids [3 0 R 5 0 R ] /Count 2 "));
}

#[test]
fn unbalanced_saves_are_closed_on_write() {
    let doc = Document::new();
    let page = doc.add_page().unwrap();
    let gc = page.graphics(&doc).unwrap();
    gc.save().unwrap();
    gc.save().unwrap();
    assert_eq!(page.open_saves(), 2);

    let bytes = doc.to_bytes().unwrap();
    assert_eq!(page.open_saves(), 0);
    assert!(contains_bytes(&bytes, b"q\nq\nQ\nQ\n\nendstream"));
}

#[test]
fn pages_from_another_document_are_rejected() {
    let a = Document::new();
    let b = Document::new();
    let page = a.add_page().unwrap();
    assert!(matches!(page.graphics(&b), Err(Error::InvalidArgument(_))));
}

#[test]
fn pages_built_in_parallel() {
    let doc = Document::new();
    let font = Font::builtin(BuiltinFont::Courier, 9.0);
    std::thread::scope(|s| {
        for t in 0..4 {
            let doc = &doc;
            let font = &font;
            s.spawn(move || {
                for i in 0..5 {
                    let page = doc.add_page().unwrap();
                    let gc = page.graphics(doc).unwrap();
                    gc.draw_string(
                        &format!("thread {} page {}", t, i),
                        font,
                        Color::BLACK,
                        Point::new(72.0, 72.0),
                    )
                    .unwrap();
                }
            });
        }
    });

    assert_eq!(doc.pages().len(), 20);
    let bytes = doc.to_bytes().unwrap();
    assert!(contains_bytes(&bytes, b"/Count 20 "));
    assert_eq!(count_bytes(&bytes, b"/Type /Font "), 1);
    // catalog, root, 20 pages with their content, one font
    assert_eq!(doc.object_count(), 43);
    assert!(contains_bytes(&bytes, b"xref\n0 44\n"));
}

/// The `/Count` of the first page tree node in `bytes`.
fn page_count(bytes: &[u8]) -> usize {
    let at = find_bytes(bytes, b"/Count ").unwrap() + b"/Count ".len();
    bytes[at..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0, |n, &b| n * 10 + (b - b'0') as usize)
}

#[test]
fn write_during_add_page_keeps_tree_consistent() {
    let doc = Document::new();
    std::thread::scope(|s| {
        let adder = s.spawn(|| {
            for _ in 0..200 {
                doc.add_page().unwrap();
            }
        });
        while !adder.is_finished() {
            let bytes = doc.to_bytes().unwrap();
            assert_eq!(page_count(&bytes), count_bytes(&bytes, b"/Type /Page "));
        }
    });
    let bytes = doc.to_bytes().unwrap();
    assert_eq!(page_count(&bytes), 200);
    assert_eq!(count_bytes(&bytes, b"/Type /Page "), 200);
}

#[test]
fn write_to_file_matches_to_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let doc = Document::new();
    doc.add_page().unwrap();
    doc.write_to_file(&path).unwrap();
    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk, doc.to_bytes().unwrap());
    assert!(on_disk.ends_with(b"%%EOF"));
}
