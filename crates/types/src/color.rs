/// An opaque RGB color. Statements are printed, so there is no alpha channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(value: u8) -> Self {
        Self::rgb(value, value, value)
    }

    /// Components scaled to the 0.0..=1.0 range used by PDF color operators.
    pub fn components(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_are_normalized() {
        let [r, g, b] = Color::WHITE.components();
        assert_eq!((r, g, b), (1.0, 1.0, 1.0));
        assert_eq!(Color::BLACK.components(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn gray_sets_every_channel() {
        assert_eq!(Color::gray(0xF0), Color::rgb(0xF0, 0xF0, 0xF0));
    }
}
