use crate::fonts::{StandardFont, to_win_ansi};
use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};
use statement_types::{Color, Rect};

/// Text and stroke state already emitted into the content stream, so repeated
/// cells with the same style do not re-emit operators.
#[derive(Default, Clone, PartialEq)]
struct CanvasState {
    font: Option<(StandardFont, f32)>,
    fill_color: Option<Color>,
    stroke: Option<(Color, f32)>,
}

/// Drawing surface for one page. Coordinates are PDF user space in points,
/// origin at the bottom-left corner; text positions are baselines.
pub struct PageCanvas {
    operations: Vec<Operation>,
    state: CanvasState,
}

impl Default for PageCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCanvas {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            state: CanvasState::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub(crate) fn finish(self) -> Content {
        Content {
            operations: self.operations,
        }
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color != Some(color) {
            let [r, g, b] = color.components();
            self.push("rg", vec![r.into(), g.into(), b.into()]);
            self.state.fill_color = Some(color);
        }
    }

    fn set_stroke(&mut self, color: Color, width: f32) {
        if self.state.stroke != Some((color, width)) {
            let [r, g, b] = color.components();
            self.push("w", vec![width.into()]);
            self.push("RG", vec![r.into(), g.into(), b.into()]);
            self.state.stroke = Some((color, width));
        }
    }

    fn set_font(&mut self, font: StandardFont, size: f32) {
        if self.state.font != Some((font, size)) {
            self.push(
                "Tf",
                vec![
                    Object::Name(font.resource_name().as_bytes().to_vec()),
                    size.into(),
                ],
            );
            self.state.font = Some((font, size));
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.set_fill_color(color);
        self.push(
            "re",
            vec![
                rect.x.into(),
                rect.y.into(),
                rect.width.into(),
                rect.height.into(),
            ],
        );
        self.push("f", vec![]);
    }

    pub fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color) {
        self.set_stroke(color, width);
        self.push(
            "re",
            vec![
                rect.x.into(),
                rect.y.into(),
                rect.width.into(),
                rect.height.into(),
            ],
        );
        self.push("S", vec![]);
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color) {
        self.set_stroke(color, width);
        self.push("m", vec![from.0.into(), from.1.into()]);
        self.push("l", vec![to.0.into(), to.1.into()]);
        self.push("S", vec![]);
    }

    /// Draws one line of text with its baseline starting at `(x, y)`.
    pub fn text(&mut self, x: f32, y: f32, font: StandardFont, size: f32, color: Color, text: &str) {
        if text.is_empty() {
            return;
        }
        self.push("BT", vec![]);
        self.set_font(font, size);
        self.set_fill_color(color);
        self.push("Td", vec![x.into(), y.into()]);
        self.push(
            "Tj",
            vec![Object::String(to_win_ansi(text), StringFormat::Literal)],
        );
        self.push("ET", vec![]);
    }

    /// Draws text so that it ends at `right`.
    pub fn text_right(
        &mut self,
        right: f32,
        y: f32,
        font: StandardFont,
        size: f32,
        color: Color,
        text: &str,
    ) {
        let width = font.text_width(text, size);
        self.text(right - width, y, font, size, color, text);
    }

    /// Draws text horizontally centered on `center`.
    pub fn text_centered(
        &mut self,
        center: f32,
        y: f32,
        font: StandardFont,
        size: f32,
        color: Color,
        text: &str,
    ) {
        let width = font.text_width(text, size);
        self.text(center - width / 2.0, y, font, size, color, text);
    }

    /// Paints a registered image XObject scaled into `rect`.
    pub fn image(&mut self, resource_name: &str, rect: Rect) {
        self.push("q", vec![]);
        self.push(
            "cm",
            vec![
                rect.width.into(),
                Object::Integer(0),
                Object::Integer(0),
                rect.height.into(),
                rect.x.into(),
                rect.y.into(),
            ],
        );
        self.push("Do", vec![Object::Name(resource_name.as_bytes().to_vec())]);
        self.push("Q", vec![]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operators(canvas: PageCanvas) -> Vec<String> {
        canvas
            .finish()
            .operations
            .into_iter()
            .map(|op| op.operator)
            .collect()
    }

    #[test]
    fn repeated_styles_are_not_reemitted() {
        let mut canvas = PageCanvas::new();
        canvas.text(10.0, 10.0, StandardFont::Helvetica, 6.0, Color::BLACK, "a");
        canvas.text(10.0, 20.0, StandardFont::Helvetica, 6.0, Color::BLACK, "b");
        let ops = operators(canvas);
        assert_eq!(ops.iter().filter(|op| *op == "Tf").count(), 1);
        assert_eq!(ops.iter().filter(|op| *op == "rg").count(), 1);
        assert_eq!(ops.iter().filter(|op| *op == "Tj").count(), 2);
    }

    #[test]
    fn empty_text_draws_nothing() {
        let mut canvas = PageCanvas::new();
        canvas.text(0.0, 0.0, StandardFont::Helvetica, 6.0, Color::BLACK, "");
        assert!(canvas.is_empty());
    }

    #[test]
    fn image_is_wrapped_in_saved_state() {
        let mut canvas = PageCanvas::new();
        canvas.image("Im1", Rect::new(30.0, 700.0, 220.0, 55.0));
        assert_eq!(operators(canvas), vec!["q", "cm", "Do", "Q"]);
    }
}
