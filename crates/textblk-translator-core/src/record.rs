//! Records that carry text to translate and receive the translation.

/// Anything a translator can read text from and write a translation to
pub trait TextRecord {
    /// Text to translate
    fn text(&self) -> String;

    /// Store the final translation
    fn set_translation(&mut self, translation: String);
}

/// Bounding box in page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// A detected text region: its lines, where it sits, and its translation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    /// Source lines, top to bottom
    pub lines: Vec<String>,
    pub bbox: Option<BoundingBox>,
    /// Font size in points, 0 when unknown
    pub font_size: f32,
    pub translation: String,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            ..Self::default()
        }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    #[must_use]
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }
}

impl TextRecord for TextBlock {
    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn set_translation(&mut self, translation: String) {
        self.translation = translation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_joins_lines() {
        let block = TextBlock::from_lines(["first", "second"]);
        assert_eq!(block.text(), "first\nsecond");
        assert_eq!(TextBlock::new("solo").text(), "solo");
    }

    #[test]
    fn test_set_translation() {
        let mut block = TextBlock::new("hola").with_bbox(BoundingBox::new(0.0, 0.0, 40.0, 10.0));
        block.set_translation("hello".to_string());
        assert_eq!(block.translation, "hello");
        assert!((block.bbox.map_or(0.0, |b| b.width()) - 40.0).abs() < f32::EPSILON);
    }
}
