use crate::document::Document;
use crate::error::{Error, Result};
use crate::fonts::{Font, TextExtent};
use crate::geometry::Point;
use crate::lock;
use crate::objects::PdfObject;
use crate::page::Page;

/// RGB color for PDF graphics operations.
///
/// Each component is in the range 0.0 (none) to 1.0 (full intensity).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Create a color from RGB components (each 0.0–1.0).
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b }
    }

    /// Create a grayscale color (r = g = b = level).
    pub fn gray(level: f64) -> Self {
        Color {
            r: level,
            g: level,
            b: level,
        }
    }

    fn operands(&self) -> [PdfObject; 3] {
        [self.r, self.g, self.b].map(|c| PdfObject::Real(c.clamp(0.0, 1.0)))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Stroke pattern. Lengths are multiples of the line width.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DashStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    Custom(Vec<PdfObject>),
}

impl DashStyle {
    /// A custom on/off pattern. Every entry must be a number.
    pub fn custom(pattern: Vec<PdfObject>) -> Result<DashStyle> {
        if let Some(bad) = pattern.iter().find(|p| !p.is_numeric()) {
            return Err(Error::invalid_argument(format!(
                "dash pattern entry {:?} is not a number",
                bad
            )));
        }
        Ok(DashStyle::Custom(pattern))
    }

    /// The `d` operator's array, scaled by `line_width`.
    fn pattern(&self, line_width: f64) -> Vec<PdfObject> {
        let units: Vec<f64> = match self {
            DashStyle::Solid => Vec::new(),
            DashStyle::Dash => vec![3.0, 1.0],
            DashStyle::Dot => vec![1.0, 1.0],
            DashStyle::DashDot => vec![3.0, 1.0, 1.0, 1.0],
            DashStyle::Custom(pattern) => pattern.iter().filter_map(PdfObject::as_f64).collect(),
        };
        units
            .into_iter()
            .map(|u| PdfObject::Real(u * line_width))
            .collect()
    }
}

/// Stroke settings for lines and outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub width: f64,
    pub dash: DashStyle,
}

impl Pen {
    pub fn new(color: Color, width: f64) -> Self {
        Pen {
            color,
            width,
            dash: DashStyle::Solid,
        }
    }

    pub fn with_dash(mut self, dash: DashStyle) -> Self {
        self.dash = dash;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(Error::invalid_argument(format!(
                "line width {} must be a non-negative number",
                self.width
            )));
        }
        Ok(())
    }
}

impl Default for Pen {
    fn default() -> Self {
        Pen::new(Color::BLACK, 1.0)
    }
}

/// Values last written to the content stream, as far as a `Q` would
/// restore them.
#[derive(Debug, Clone, PartialEq)]
struct Emitted {
    line_width: f64,
    dash: DashStyle,
    stroke: Color,
    fill: Color,
    /// Line width was changed after the dash was last written.
    width_newer_than_dash: bool,
}

impl Default for Emitted {
    /// The PDF initial graphics state.
    fn default() -> Self {
        Emitted {
            line_width: 1.0,
            dash: DashStyle::Solid,
            stroke: Color::BLACK,
            fill: Color::BLACK,
            width_newer_than_dash: false,
        }
    }
}

/// Per-page drawing state, shared by every context opened on the page.
#[derive(Debug, Default)]
pub(crate) struct GraphicsState {
    emitted: Emitted,
    stack: Vec<(u64, Emitted)>,
    next_save: u64,
    font: Option<Font>,
}

impl GraphicsState {
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Pop every open save, writing one `Q` each.
    pub(crate) fn unwind(&mut self, ops: &mut Ops) {
        while let Some((_, saved)) = self.stack.pop() {
            self.emitted = saved;
            ops.op(&[], "Q");
        }
        self.font = None;
    }
}

/// Handle returned by [`GraphicsContext::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedState {
    page: u64,
    id: u64,
}

/// Buffer of content-stream lines: operands followed by an operator.
#[derive(Debug, Default)]
pub(crate) struct Ops(Vec<u8>);

impl Ops {
    pub(crate) fn op(&mut self, operands: &[PdfObject], operator: &str) {
        for operand in operands {
            // Writing into a Vec cannot fail.
            let _ = operand.write_to(&mut self.0);
        }
        self.0.extend_from_slice(operator.as_bytes());
        self.0.push(b'\n');
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

type Transform<'a> = Box<dyn Fn(f64) -> f64 + 'a>;

/// Emits drawing operators into a page's content stream.
///
/// Coordinates given to the drawing calls pass through the X and Y
/// transforms first. By default the origin is the top-left corner of the
/// page with Y growing downward.
pub struct GraphicsContext<'a> {
    document: &'a Document,
    page: &'a Page,
    transform_x: Transform<'a>,
    transform_y: Transform<'a>,
}

impl<'a> GraphicsContext<'a> {
    pub(crate) fn new(document: &'a Document, page: &'a Page) -> Self {
        let height = page.height();
        GraphicsContext {
            document,
            page,
            transform_x: Box::new(|x| x),
            transform_y: Box::new(move |y| height - y),
        }
    }

    /// Replace the coordinate transforms.
    pub fn with_transforms<X, Y>(mut self, x: X, y: Y) -> Self
    where
        X: Fn(f64) -> f64 + 'a,
        Y: Fn(f64) -> f64 + 'a,
    {
        self.transform_x = Box::new(x);
        self.transform_y = Box::new(y);
        self
    }

    /// Use PDF's native bottom-left origin.
    pub fn with_pdf_coordinates(self) -> Self {
        self.with_transforms(|x| x, |y| y)
    }

    pub fn page(&self) -> &Page {
        self.page
    }

    fn point(&self, p: Point) -> [PdfObject; 2] {
        [
            PdfObject::Real((self.transform_x)(p.x)),
            PdfObject::Real((self.transform_y)(p.y)),
        ]
    }

    /// Run `build` under the page state lock, then append what it wrote.
    fn emit<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce(&mut GraphicsState, &mut Ops) -> Result<()>,
    {
        let mut state = lock(self.page.state());
        let mut ops = Ops::default();
        build(&mut state, &mut ops)?;
        if ops.is_empty() {
            return Ok(());
        }
        self.page.append_content(ops.as_bytes())
    }

    /// Push the current stroke state and write `q`.
    pub fn save(&self) -> Result<SavedState> {
        let mut saved = None;
        self.emit(|state, ops| {
            let id = state.next_save;
            state.next_save += 1;
            state.stack.push((id, state.emitted.clone()));
            ops.op(&[], "q");
            saved = Some(SavedState {
                page: self.page.serial(),
                id,
            });
            Ok(())
        })?;
        saved.ok_or_else(|| Error::invalid_operation("save produced no state"))
    }

    /// Pop down to and including `saved`, writing one `Q` per level.
    /// A state that was already popped is ignored.
    pub fn restore(&self, saved: SavedState) -> Result<()> {
        if saved.page != self.page.serial() {
            return Err(Error::invalid_argument(
                "saved state belongs to another page",
            ));
        }
        self.emit(|state, ops| {
            let Some(position) = state.stack.iter().position(|(id, _)| *id == saved.id) else {
                return Ok(());
            };
            while state.stack.len() > position {
                if let Some((_, emitted)) = state.stack.pop() {
                    state.emitted = emitted;
                }
                ops.op(&[], "Q");
            }
            // Q also reverts the text font.
            state.font = None;
            Ok(())
        })
    }

    /// Pop every remaining saved state.
    pub fn close_graphics(&self) -> Result<()> {
        self.emit(|state, ops| {
            state.unwind(ops);
            Ok(())
        })
    }

    pub fn draw_line(&self, pen: &Pen, from: Point, to: Point) -> Result<()> {
        pen.validate()?;
        self.emit(|state, ops| {
            apply_pen(state, ops, pen);
            ops.op(&self.point(from), "m");
            ops.op(&self.point(to), "l");
            ops.op(&[], "S");
            Ok(())
        })
    }

    /// Outline with `pen`, fill with `fill`, or both.
    pub fn draw_rectangle(
        &self,
        pen: Option<&Pen>,
        fill: Option<Color>,
        origin: Point,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let paint = paint_operator(pen, fill)?;
        let x0 = (self.transform_x)(origin.x);
        let x1 = (self.transform_x)(origin.x + width);
        let y0 = (self.transform_y)(origin.y);
        let y1 = (self.transform_y)(origin.y + height);
        self.emit(|state, ops| {
            if let Some(pen) = pen {
                apply_pen(state, ops, pen);
            }
            if let Some(color) = fill {
                apply_fill(state, ops, color);
            }
            ops.op(
                &[
                    PdfObject::Real(x0.min(x1)),
                    PdfObject::Real(y0.min(y1)),
                    PdfObject::Real((x1 - x0).abs()),
                    PdfObject::Real((y1 - y0).abs()),
                ],
                "re",
            );
            ops.op(&[], paint);
            Ok(())
        })
    }

    /// Closed path through `points`.
    pub fn draw_polygon(
        &self,
        pen: Option<&Pen>,
        points: &[Point],
        fill: Option<Color>,
    ) -> Result<()> {
        let paint = paint_operator(pen, fill)?;
        let (first, rest) = match points.split_first() {
            Some((first, rest)) if !rest.is_empty() => (first, rest),
            _ => {
                return Err(Error::invalid_argument(
                    "a polygon needs at least two points",
                ))
            }
        };
        self.emit(|state, ops| {
            if let Some(pen) = pen {
                apply_pen(state, ops, pen);
            }
            if let Some(color) = fill {
                apply_fill(state, ops, color);
            }
            ops.op(&self.point(*first), "m");
            for p in rest {
                ops.op(&self.point(*p), "l");
            }
            ops.op(&[], "h");
            ops.op(&[], paint);
            Ok(())
        })
    }

    /// Draw `text` with its baseline starting at `at`.
    pub fn draw_string(&self, text: &str, font: &Font, color: Color, at: Point) -> Result<()> {
        if !font.size().is_finite() || font.size() <= 0.0 {
            return Err(Error::invalid_argument(format!(
                "font size {} must be positive",
                font.size()
            )));
        }
        let name = self.page.use_font(self.document, font)?;
        self.emit(|state, ops| {
            ops.op(&[], "BT");
            if state.font.as_ref() != Some(font) {
                ops.op(
                    &[PdfObject::Name(name), PdfObject::Real(font.size())],
                    "Tf",
                );
                state.font = Some(font.clone());
            }
            apply_fill(state, ops, color);
            ops.op(&self.point(at), "Td");
            ops.op(&[PdfObject::literal_string(text)], "Tj");
            ops.op(&[], "ET");
            Ok(())
        })
    }

    /// Rotate the coordinate system by `degrees` (counter-clockwise on
    /// the page) around `origin`.
    pub fn rotate(&self, degrees: f64, origin: Point) -> Result<()> {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let ox = (self.transform_x)(origin.x);
        let oy = (self.transform_y)(origin.y);
        self.concat([
            cos,
            sin,
            -sin,
            cos,
            ox - cos * ox + sin * oy,
            oy - sin * ox - cos * oy,
        ])
    }

    /// Shift the coordinate system by (dx, dy) in caller units.
    pub fn translate(&self, dx: f64, dy: f64) -> Result<()> {
        let tx = (self.transform_x)(dx) - (self.transform_x)(0.0);
        let ty = (self.transform_y)(dy) - (self.transform_y)(0.0);
        self.concat([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn concat(&self, matrix: [f64; 6]) -> Result<()> {
        self.emit(|_, ops| {
            ops.op(&matrix.map(PdfObject::Real), "cm");
            Ok(())
        })
    }

    pub fn measure_string(&self, text: &str, font: &Font) -> TextExtent {
        font.measure(text)
    }
}

fn paint_operator(pen: Option<&Pen>, fill: Option<Color>) -> Result<&'static str> {
    if let Some(pen) = pen {
        pen.validate()?;
    }
    match (pen.is_some(), fill.is_some()) {
        (true, true) => Ok("B"),
        (true, false) => Ok("S"),
        (false, true) => Ok("f"),
        (false, false) => Err(Error::invalid_argument(
            "a shape needs a pen, a fill color, or both",
        )),
    }
}

fn apply_pen(state: &mut GraphicsState, ops: &mut Ops, pen: &Pen) {
    let current = &mut state.emitted;
    if pen.width != current.line_width {
        ops.op(&[PdfObject::Real(pen.width)], "w");
        current.line_width = pen.width;
        current.width_newer_than_dash = true;
    }
    if pen.dash != current.dash || current.width_newer_than_dash {
        ops.op(
            &[
                PdfObject::Array(pen.dash.pattern(pen.width)),
                PdfObject::Integer(0),
            ],
            "d",
        );
        current.dash = pen.dash.clone();
        current.width_newer_than_dash = false;
    }
    if pen.color != current.stroke {
        ops.op(&pen.color.operands(), "RG");
        current.stroke = pen.color;
    }
}

fn apply_fill(state: &mut GraphicsState, ops: &mut Ops, color: Color) {
    if color != state.emitted.fill {
        ops.op(&color.operands(), "rg");
        state.emitted.fill = color;
    }
}
