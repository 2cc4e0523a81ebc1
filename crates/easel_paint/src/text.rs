//! Text shapes sized and anchored in view space
//!
//! The font pixel size is fitted at rasterize time, since it depends on the
//! current view and device size. Glyph rendering stays in the backend.

use easel_core::Color;

use crate::backend::{RasterBackend, TextBounds, TextRun};
use crate::view::ViewTransform;

/// Requested text size in view units
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextSize {
    /// Letter height; the width follows
    Height(f64),
    /// Largest size that fits inside the box
    Box { width: f64, height: f64 },
}

impl From<f64> for TextSize {
    fn from(height: f64) -> Self {
        TextSize::Height(height)
    }
}

impl From<(f64, f64)> for TextSize {
    fn from((width, height): (f64, f64)) -> Self {
        TextSize::Box { width, height }
    }
}

/// Where the draw location sits relative to the text.
///
/// With a box size the location is always the box's bottom-left corner and
/// the anchor positions the text inside the box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    #[default]
    BottomLeft,
    BottomCenter,
    BottomRight,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Align {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    /// Vertical alignment: `Start` is the bottom
    fn vertical(self) -> Align {
        match self {
            TextAnchor::TopLeft | TextAnchor::TopCenter | TextAnchor::TopRight => Align::End,
            TextAnchor::CenterLeft | TextAnchor::Center | TextAnchor::CenterRight => Align::Middle,
            TextAnchor::BottomLeft | TextAnchor::BottomCenter | TextAnchor::BottomRight => {
                Align::Start
            }
        }
    }

    /// Horizontal alignment: `Start` is the left
    fn horizontal(self) -> Align {
        match self {
            TextAnchor::TopLeft | TextAnchor::CenterLeft | TextAnchor::BottomLeft => Align::Start,
            TextAnchor::TopCenter | TextAnchor::Center | TextAnchor::BottomCenter => Align::Middle,
            TextAnchor::TopRight | TextAnchor::CenterRight | TextAnchor::BottomRight => Align::End,
        }
    }
}

/// Font family and style
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            bold: false,
            italic: false,
        }
    }

    /// Parse a style string such as `"bold"`, `"italic"` or `"bold italic"`
    pub fn with_styles(family: impl Into<String>, styles: &str) -> Self {
        let styles = styles.to_ascii_lowercase();
        Self {
            family: family.into(),
            bold: styles.contains("bold"),
            italic: styles.contains("italic"),
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

/// Fitted font size and device baseline position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextPlacement {
    pub pixel_size: f64,
    pub position: (f64, f64),
}

/// A string drawn at a view-space location
#[derive(Clone, Debug, PartialEq)]
pub struct TextShape {
    pub text: String,
    pub location: (f64, f64),
    pub size: TextSize,
    pub color: Color,
    pub font: FontSpec,
    pub anchor: TextAnchor,
    /// Count the descent as part of the letter height
    pub include_descent: bool,
}

impl TextShape {
    pub fn new(
        text: impl Into<String>,
        location: (f64, f64),
        size: impl Into<TextSize>,
        color: Color,
        font: FontSpec,
    ) -> Self {
        Self {
            text: text.into(),
            location,
            size: size.into(),
            color,
            font,
            anchor: TextAnchor::default(),
            include_descent: true,
        }
    }

    pub fn anchored(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn include_descent(mut self, include: bool) -> Self {
        self.include_descent = include;
        self
    }

    fn effective_height(&self, bounds: &TextBounds) -> f64 {
        if self.include_descent {
            bounds.height
        } else {
            bounds.height - bounds.bottom()
        }
    }

    /// Fit the font to the requested size and compute the baseline position.
    ///
    /// `None` for empty text or a size that maps to no pixels.
    pub fn place(
        &self,
        backend: &mut dyn RasterBackend,
        view: &ViewTransform,
    ) -> Option<TextPlacement> {
        if self.text.is_empty() {
            return None;
        }

        let (goal_width, goal_height, boxed) = match self.size {
            TextSize::Height(height) => (f64::INFINITY, view.height_to_device(height), false),
            TextSize::Box { width, height } => {
                (view.width_to_device(width), view.height_to_device(height), true)
            }
        };
        if !(goal_height.is_finite() && goal_height > 0.0) {
            tracing::trace!(goal_height, "text size maps to no pixels");
            return None;
        }

        let mut pixel_size = goal_height;
        let bounds = backend.text_bounds(&self.text, &self.font, pixel_size);
        let ratio = (bounds.width / goal_width).max(self.effective_height(&bounds) / goal_height);
        if ratio.is_finite() && ratio > 0.0 {
            pixel_size /= ratio;
        }

        let bounds = backend.text_bounds(&self.text, &self.font, pixel_size);
        let effective_height = self.effective_height(&bounds);

        let zero_x = -bounds.left;
        let zero_y = if self.include_descent {
            -bounds.bottom()
        } else {
            0.0
        };

        let anchor_y = match self.anchor.vertical() {
            Align::End if boxed => effective_height - goal_height,
            Align::End => effective_height,
            Align::Middle if boxed => (effective_height - goal_height) / 2.0,
            Align::Middle => effective_height / 2.0,
            Align::Start => 0.0,
        };
        let anchor_x = match self.anchor.horizontal() {
            Align::End if boxed => goal_width - bounds.width,
            Align::End => -bounds.width,
            Align::Middle if boxed => (goal_width - bounds.width) / 2.0,
            Align::Middle => -bounds.width / 2.0,
            Align::Start => 0.0,
        };

        let (x, y) = view.view_to_device(self.location.0, self.location.1);
        Some(TextPlacement {
            pixel_size,
            position: (x + zero_x + anchor_x, y + zero_y + anchor_y),
        })
    }

    pub fn rasterize(&self, backend: &mut dyn RasterBackend, view: &ViewTransform) {
        let Some(placement) = self.place(backend, view) else {
            return;
        };
        backend.draw_text(&TextRun {
            text: &self.text,
            font: &self.font,
            pixel_size: placement.pixel_size,
            position: placement.position,
            color: self.color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, RecordingBackend};
    use crate::view::{DeviceSize, ViewBounds};

    fn view() -> ViewTransform {
        ViewTransform::new(ViewBounds::default(), DeviceSize::new(500, 500))
    }

    fn approx(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    fn shape(text: &str, size: impl Into<TextSize>) -> TextShape {
        TextShape::new(text, (0.5, 0.5), size, Color::WHITE, FontSpec::new("Sans"))
    }

    #[test]
    fn test_height_fits_with_descent() {
        let mut backend = RecordingBackend::new();
        let placement = shape("ab", 0.1).place(&mut backend, &view()).unwrap();
        assert!((placement.pixel_size - 50.0).abs() < 1e-9);
        // Descent lifted so the glyph bottom lands on the location
        assert!(approx(placement.position, (250.0, 240.0)));
    }

    #[test]
    fn test_height_without_descent() {
        let mut backend = RecordingBackend::new();
        let placement = shape("ab", 0.1)
            .include_descent(false)
            .place(&mut backend, &view())
            .unwrap();
        assert!((placement.pixel_size - 62.5).abs() < 1e-9);
        assert!(approx(placement.position, (250.0, 250.0)));
    }

    #[test]
    fn test_point_anchors() {
        let mut backend = RecordingBackend::new();
        let top_right = shape("ab", 0.1)
            .anchored(TextAnchor::TopRight)
            .place(&mut backend, &view())
            .unwrap();
        assert!(approx(top_right.position, (190.0, 290.0)));

        let center = shape("ab", 0.1)
            .anchored(TextAnchor::Center)
            .place(&mut backend, &view())
            .unwrap();
        assert!(approx(center.position, (220.0, 265.0)));
    }

    #[test]
    fn test_box_limited_by_width() {
        let mut backend = RecordingBackend::new();
        let placement = shape("abcd", (0.1, 0.2))
            .anchored(TextAnchor::CenterRight)
            .place(&mut backend, &view())
            .unwrap();
        let px = 100.0 / 4.8;
        assert!((placement.pixel_size - px).abs() < 1e-9);
        let descent = 0.2 * px;
        // Fills the box width, so the right anchor adds nothing
        let expected_y = 250.0 - descent + (px - 100.0) / 2.0;
        assert!(approx(placement.position, (250.0, expected_y)));
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let mut backend = RecordingBackend::new();
        shape("", 0.1).rasterize(&mut backend, &view());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_rasterize_emits_run() {
        let mut backend = RecordingBackend::new();
        let font = FontSpec::with_styles("Serif", "Bold Italic");
        assert!(font.bold && font.italic);
        TextShape::new("hi", (0.0, 0.0), 0.2, Color::RED, font.clone())
            .rasterize(&mut backend, &view());
        match backend.calls().last() {
            Some(BackendCall::DrawText {
                text,
                font: drawn_font,
                pixel_size,
                color,
                ..
            }) => {
                assert_eq!(text, "hi");
                assert_eq!(drawn_font, &font);
                assert!((pixel_size - 100.0).abs() < 1e-9);
                assert_eq!(*color, Color::RED);
            }
            other => panic!("expected text draw, got {:?}", other),
        }
    }
}
