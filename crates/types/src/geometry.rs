/// An axis-aligned rectangle in PDF user space (origin bottom-left, points).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Builds a rectangle from its top edge, which is how table rows are laid out.
    pub fn from_top(x: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y: top - height,
            width,
            height,
        }
    }
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// US Letter, 8.5 x 11 in.
    pub const LETTER: Size = Size::new(612.0, 792.0);

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_from_top_keeps_top_edge() {
        let rect = Rect::from_top(40.0, 415.0, 100.0, 22.2);
        assert!((rect.y + rect.height - 415.0).abs() < 1e-4);
        assert_eq!(rect.x, 40.0);
    }

    #[test]
    fn letter_dimensions() {
        assert_eq!(Size::LETTER, Size::new(612.0, 792.0));
    }
}
