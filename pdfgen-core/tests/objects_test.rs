use pdfgen_core::objects::ARRAY_WRAP_COLUMN;
use pdfgen_core::{Dictionary, Error, ObjId, PdfObject, Rectangle, Token};
use proptest::prelude::*;

fn encode(obj: &PdfObject) -> String {
    String::from_utf8(obj.to_bytes()).unwrap()
}

#[test]
fn every_primitive_ends_with_a_space() {
    let samples = vec![
        PdfObject::Null,
        PdfObject::Boolean(false),
        PdfObject::Integer(-1),
        PdfObject::Real(0.25),
        PdfObject::name("Type").unwrap(),
        PdfObject::operator("Tj").unwrap(),
        PdfObject::literal_string("hi"),
        PdfObject::ByteString(vec![0x00, 0xFF]),
        PdfObject::array(vec![]),
        PdfObject::Rectangle(Rectangle::integer(0, 0, 10, 10)),
        PdfObject::Dictionary(Dictionary::new()),
        PdfObject::reference(3, 0),
    ];
    for obj in &samples {
        let s = encode(obj);
        assert!(s.ends_with(' '), "{:?} encoded as {:?}", obj, s);
        assert_eq!(obj.encoded_len(), s.len());
    }
}

#[test]
fn scalar_forms() {
    assert_eq!(encode(&PdfObject::Integer(-1)), "-1 ");
    assert_eq!(encode(&PdfObject::name("Foo").unwrap()), "/Foo ");
    assert_eq!(encode(&PdfObject::Boolean(true)), "true ");
    assert_eq!(encode(&PdfObject::Null), "null ");
    assert_eq!(encode(&PdfObject::reference(3, 0)), "3 0 R ");
    assert_eq!(encode(&PdfObject::ByteString(vec![0x00, 0xFF])), "<00FF> ");
    assert_eq!(encode(&PdfObject::Real(3.14159)), "3.1416 ");
    assert_eq!(encode(&PdfObject::Real(2.0)), "2 ");
}

#[test]
fn array_of_integers() {
    let arr = PdfObject::array(vec![PdfObject::Integer(1), PdfObject::Integer(2)]);
    assert_eq!(encode(&arr), "[1 2 ] ");
}

#[test]
fn rectangle_renders_as_array() {
    let r = Rectangle::real(0.0, 0.0, 612.0, 792.5);
    assert_eq!(encode(&PdfObject::Rectangle(r)), "[0 0 612 792.5 ] ");
    assert_eq!(r.width(), 612.0);
    assert_eq!(r.height(), 792.5);
}

#[test]
fn mixed_rectangle_corners_are_rejected() {
    let result = Rectangle::from_corners(
        (PdfObject::Integer(0), PdfObject::Real(0.0)),
        (PdfObject::Integer(1), PdfObject::Integer(1)),
    );
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn token_validation() {
    assert!(Token::new("Helvetica-Bold").is_ok());
    assert!(Token::new("").is_err());
    assert!(Token::new("two words").is_err());
    assert!(Token::new("a/b").is_err());
    assert!(Token::new("caf\u{e9}").is_err());
}

#[test]
fn invalid_names_are_argument_errors() {
    assert!(matches!(PdfObject::name("Bad Name"), Err(Error::InvalidArgument(_))));
    assert!(matches!(PdfObject::name("a[0]"), Err(Error::InvalidArgument(_))));
    assert!(matches!(PdfObject::operator("T j"), Err(Error::InvalidArgument(_))));
    assert!(matches!(Token::new("My Key"), Err(Error::InvalidArgument(_))));
}

#[test]
fn nested_dictionary() {
    let key = |s: &str| Token::new(s).unwrap();
    let inner = Dictionary::new().with(key("F1"), ObjId(5, 0));
    let outer = Dictionary::new()
        .with(key("Font"), inner)
        .with(key("ProcSet"), vec![PdfObject::name("PDF").unwrap()]);
    assert_eq!(
        encode(&PdfObject::Dictionary(outer)),
        "<< /Font << /F1 5 0 R >> /ProcSet [/PDF ] >> "
    );
}

#[test]
fn string_escaping() {
    assert_eq!(encode(&PdfObject::literal_string("a(b)c")), "(a(b)c) ");
    assert_eq!(encode(&PdfObject::literal_string("a)b")), "(a\\)b) ");
    assert_eq!(encode(&PdfObject::literal_string("x\\y")), "(x\\\\y) ");
}

#[test]
fn strings_are_written_in_win_ansi() {
    let obj = PdfObject::literal_string("\u{2018}quoted\u{2019} \u{2022} 10\u{2026}");
    assert_eq!(obj.to_bytes(), b"(\x91quoted\x92 \x95 10\x85) ".to_vec());
    assert_eq!(obj.encoded_len(), obj.to_bytes().len());
}

#[test]
fn long_string_continues_on_next_line() {
    let s = "a".repeat(600);
    let out = encode(&PdfObject::literal_string(&s));
    let body = &out[1..out.len() - 2];
    let pieces: Vec<&str> = body.split("\\\n").collect();
    assert_eq!(pieces.len(), 3);
    assert!(pieces.iter().all(|p| p.len() <= 253));
    assert_eq!(pieces.concat(), s);
}

proptest! {
    #[test]
    fn array_wrap_only_inserts_newlines(
        values in prop::collection::vec(any::<i64>(), 0..200)
    ) {
        let items: Vec<PdfObject> = values.iter().copied().map(PdfObject::Integer).collect();
        let out = encode(&PdfObject::array(items.clone()));

        let expected: String = std::iter::once("[".to_string())
            .chain(items.iter().map(encode))
            .chain(std::iter::once("] ".to_string()))
            .collect();
        prop_assert_eq!(out.replace('\n', ""), expected);

        let lines: Vec<&str> = out.split('\n').collect();
        for line in &lines[..lines.len() - 1] {
            prop_assert!(line.len() <= ARRAY_WRAP_COLUMN);
        }
    }

    #[test]
    fn encoded_len_agrees_with_output(
        values in prop::collection::vec(-1.0e6f64..1.0e6, 0..50)
    ) {
        let obj = PdfObject::array(values.into_iter().map(PdfObject::Real).collect());
        prop_assert_eq!(obj.encoded_len(), obj.to_bytes().len());
    }
}
