//! View bounds, device size and the mapping between them
//!
//! View space is the caller's coordinate system with y growing upward.
//! Device space is pixels with y growing downward from the top-left corner.

use serde::{Deserialize, Serialize};

/// The region of view space mapped onto the device
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewBounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl ViewBounds {
    pub const fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    /// Same size, moved so that `(x, y)` is the middle
    pub fn centered_at(&self, x: f64, y: f64) -> Self {
        let (w, h) = (self.width(), self.height());
        Self::new(x - w / 2.0, x + w / 2.0, y - h / 2.0, y + h / 2.0)
    }

    /// Finite with a non-zero extent on both axes
    pub fn is_valid(&self) -> bool {
        let finite = [self.xmin, self.xmax, self.ymin, self.ymax]
            .iter()
            .all(|v| v.is_finite());
        finite && self.width() != 0.0 && self.height() != 0.0
    }
}

impl Default for ViewBounds {
    fn default() -> Self {
        Self::new(0.0, 1.0, 0.0, 1.0)
    }
}

/// Device size in pixels, never smaller than 1x1
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceSize {
    pub width: u32,
    pub height: u32,
}

impl DeviceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Width over height
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl Default for DeviceSize {
    fn default() -> Self {
        Self::new(500, 500)
    }
}

/// How view bounds follow a device resize
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Keep the bounds; the picture stretches with the device
    Stretch,
    /// Grow or shrink the bounds evenly around their middle
    #[default]
    AnchorMiddle,
    /// Keep the top-left corner fixed
    AnchorCorner,
}

impl ResizePolicy {
    /// Bounds after resizing the device from `previous` to `current`
    pub fn apply(
        self,
        bounds: ViewBounds,
        previous: DeviceSize,
        current: DeviceSize,
    ) -> ViewBounds {
        let dw = bounds.width() * (f64::from(current.width) / f64::from(previous.width) - 1.0);
        let dh = bounds.height() * (f64::from(current.height) / f64::from(previous.height) - 1.0);
        match self {
            ResizePolicy::Stretch => bounds,
            ResizePolicy::AnchorMiddle => ViewBounds::new(
                bounds.xmin - dw / 2.0,
                bounds.xmax + dw / 2.0,
                bounds.ymin - dh / 2.0,
                bounds.ymax + dh / 2.0,
            ),
            ResizePolicy::AnchorCorner => {
                ViewBounds::new(bounds.xmin, bounds.xmax + dw, bounds.ymin - dh, bounds.ymax)
            }
        }
    }
}

/// View bounds paired with a device size
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewTransform {
    bounds: ViewBounds,
    device: DeviceSize,
}

impl ViewTransform {
    pub fn new(bounds: ViewBounds, device: DeviceSize) -> Self {
        Self { bounds, device }
    }

    pub fn bounds(&self) -> ViewBounds {
        self.bounds
    }

    pub fn device(&self) -> DeviceSize {
        self.device
    }

    pub fn view_to_device(&self, x: f64, y: f64) -> (f64, f64) {
        let b = &self.bounds;
        (
            (x - b.xmin) / b.width() * f64::from(self.device.width),
            (1.0 - (y - b.ymin) / b.height()) * f64::from(self.device.height),
        )
    }

    pub fn device_to_view(&self, x: f64, y: f64) -> (f64, f64) {
        let b = &self.bounds;
        (
            x / f64::from(self.device.width) * b.width() + b.xmin,
            (1.0 - y / f64::from(self.device.height)) * b.height() + b.ymin,
        )
    }

    /// View units per pixel horizontally over view units per pixel
    /// vertically. 1 when a view square is a device square.
    pub fn squash_factor(&self) -> f64 {
        self.bounds.width() * f64::from(self.device.height)
            / f64::from(self.device.width)
            / self.bounds.height()
    }

    /// A view-space height in device pixels
    pub fn height_to_device(&self, height: f64) -> f64 {
        height / self.bounds.height() * f64::from(self.device.height)
    }

    /// A view-space width in device pixels
    pub fn width_to_device(&self, width: f64) -> f64 {
        width / self.bounds.width() * f64::from(self.device.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_map_to_device_corners() {
        let view = ViewTransform::new(
            ViewBounds::new(-2.0, 2.0, 0.0, 10.0),
            DeviceSize::new(400, 200),
        );
        assert_eq!(view.view_to_device(-2.0, 10.0), (0.0, 0.0));
        assert_eq!(view.view_to_device(2.0, 0.0), (400.0, 200.0));
        assert_eq!(view.view_to_device(0.0, 5.0), (200.0, 100.0));
    }

    #[test]
    fn test_round_trip() {
        let view = ViewTransform::new(
            ViewBounds::new(-3.7, 12.1, 0.25, 4.5),
            DeviceSize::new(640, 480),
        );
        for &(x, y) in &[(0.0, 0.0), (1.5, -2.25), (11.9, 4.4), (-100.0, 100.0)] {
            let (dx, dy) = view.view_to_device(x, y);
            let (vx, vy) = view.device_to_view(dx, dy);
            assert!((vx - x).abs() < 1e-9, "x {} -> {}", x, vx);
            assert!((vy - y).abs() < 1e-9, "y {} -> {}", y, vy);
        }
    }

    #[test]
    fn test_squash_factor() {
        let square = ViewTransform::new(ViewBounds::default(), DeviceSize::new(500, 500));
        assert_eq!(square.squash_factor(), 1.0);
        let wide = ViewTransform::new(ViewBounds::default(), DeviceSize::new(1000, 500));
        assert_eq!(wide.squash_factor(), 0.5);
    }

    #[test]
    fn test_resize_policies() {
        let bounds = ViewBounds::new(0.0, 4.0, 0.0, 2.0);
        let prev = DeviceSize::new(400, 200);
        let next = DeviceSize::new(800, 300);

        assert_eq!(ResizePolicy::Stretch.apply(bounds, prev, next), bounds);
        assert_eq!(
            ResizePolicy::AnchorMiddle.apply(bounds, prev, next),
            ViewBounds::new(-2.0, 6.0, -0.5, 2.5)
        );
        assert_eq!(
            ResizePolicy::AnchorCorner.apply(bounds, prev, next),
            ViewBounds::new(0.0, 8.0, -1.0, 2.0)
        );
    }

    #[test]
    fn test_device_size_clamped() {
        assert_eq!(DeviceSize::new(0, 0), DeviceSize::new(1, 1));
        assert!(!ViewBounds::new(0.0, 0.0, 0.0, 1.0).is_valid());
        assert_eq!(
            ViewBounds::default().centered_at(5.0, 5.0),
            ViewBounds::new(4.5, 5.5, 4.5, 5.5)
        );
    }
}
