/// A point in drawing coordinates (points, 1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Page dimensions in points, given in portrait orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Custom { width: f64, height: f64 },
}

impl PageSize {
    /// (width, height) in points for portrait orientation.
    pub fn dimensions(&self) -> (f64, f64) {
        match *self {
            PageSize::A3 => (842.0, 1191.0),
            PageSize::A4 => (595.0, 842.0),
            PageSize::A5 => (420.0, 595.0),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (width, height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Apply this orientation to portrait dimensions.
    pub fn apply(&self, (width, height): (f64, f64)) -> (f64, f64) {
        match self {
            Orientation::Portrait => (width, height),
            Orientation::Landscape => (height, width),
        }
    }
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Margins {
    pub fn uniform(m: f64) -> Self {
        Margins {
            left: m,
            top: m,
            right: m,
            bottom: m,
        }
    }
}

impl Default for Margins {
    /// One inch on every side.
    fn default() -> Self {
        Margins::uniform(72.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_swaps_dimensions() {
        let dims = Orientation::Landscape.apply(PageSize::A4.dimensions());
        assert_eq!(dims, (842.0, 595.0));
        let dims = Orientation::Portrait.apply(PageSize::Letter.dimensions());
        assert_eq!(dims, (612.0, 792.0));
    }
}
