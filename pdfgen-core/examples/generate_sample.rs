use pdfgen_core::{
    BuiltinFont, Color, DashStyle, Document, DocumentOptions, Font, Pen, Point, TrueTypeFont,
};
use std::sync::Arc;

fn main() -> pdfgen_core::Result<()> {
    env_logger::init();

    let path = "sample_output.pdf";
    let doc = Document::with_options(DocumentOptions::default().with_compression(true));
    doc.set_info("Creator", "pdfgen-core")?;
    doc.set_info("Title", "A Test Document")?;

    let page = doc.add_page()?;
    let gc = page.graphics(&doc)?;
    let margins = page.margins();

    let title = Font::builtin(BuiltinFont::HelveticaBold, 18.0);
    let body = Font::builtin(BuiltinFont::TimesRoman, 11.0);
    gc.draw_string("Hello, PDF!", &title, Color::BLACK, Point::new(margins.left, margins.top))?;

    let rule = Pen::new(Color::gray(0.4), 0.5);
    let y = margins.top + 8.0;
    gc.draw_line(
        &rule,
        Point::new(margins.left, y),
        Point::new(margins.left + page.available_width(), y),
    )?;

    let saved = gc.save()?;
    let dashed = Pen::new(Color::rgb(0.8, 0.1, 0.1), 2.0).with_dash(DashStyle::Dash);
    gc.draw_rectangle(
        Some(&dashed),
        Some(Color::rgb(1.0, 0.95, 0.9)),
        Point::new(margins.left, y + 20.0),
        200.0,
        80.0,
    )?;
    gc.restore(saved)?;

    let text = "Created by the pdfgen-core library.";
    let extent = gc.measure_string(text, &body);
    gc.draw_string(text, &body, Color::BLACK, Point::new(margins.left, y + 130.0))?;
    gc.draw_string(
        &format!("({:.1} pt wide)", extent.width),
        &body,
        Color::gray(0.5),
        Point::new(margins.left + extent.width + 6.0, y + 130.0),
    )?;

    // Optional TrueType font given on the command line.
    if let Some(ttf) = std::env::args().nth(1) {
        let font = TrueTypeFont::from_bytes(std::fs::read(ttf)?)?;
        let font = Font::new(Arc::new(font), 14.0);
        let at = Point::new(margins.left, y + 160.0);
        gc.draw_string("Embedded TrueType text", &font, Color::BLACK, at)?;
    }

    doc.write_to_file(path)?;
    println!("Generated: {}", path);
    Ok(())
}
