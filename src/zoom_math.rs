//! Zoom-to-cursor mathematics.
//!
//! The transform maps image space to screen space as
//! `screen = image * zoom + pan`, with both origins at the top-left corner.

/// Represents pan/zoom transform state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Transform {
    /// Create a new transform with the given zoom and pan.
    pub fn new(zoom: f32, pan_x: f32, pan_y: f32) -> Self {
        Self { zoom, pan_x, pan_y }
    }

    /// Create an identity transform (zoom=1, no pan).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Transform that fits an image inside a view, preserving aspect ratio
    /// and centering it.
    pub fn fit(image_w: f32, image_h: f32, view_w: f32, view_h: f32) -> Transform {
        if image_w <= 0.0 || image_h <= 0.0 || view_w <= 0.0 || view_h <= 0.0 {
            return Transform::identity();
        }
        let zoom = (view_w / image_w).min(view_h / image_h);
        Transform {
            zoom,
            pan_x: (view_w - image_w * zoom) / 2.0,
            pan_y: (view_h - image_h * zoom) / 2.0,
        }
    }

    /// Map a screen position to image space.
    pub fn screen_to_image(&self, screen_x: f32, screen_y: f32) -> (f32, f32) {
        (
            (screen_x - self.pan_x) / self.zoom,
            (screen_y - self.pan_y) / self.zoom,
        )
    }

    /// Map an image position to screen space.
    pub fn image_to_screen(&self, img_x: f32, img_y: f32) -> (f32, f32) {
        (img_x * self.zoom + self.pan_x, img_y * self.zoom + self.pan_y)
    }

    /// Calculate zoom-to-cursor transformation.
    ///
    /// Keeps the image point under the cursor fixed while zooming:
    /// 1. Find the image-space point under the cursor
    /// 2. After zooming, adjust pan so that same point stays under cursor
    pub fn zoom_to_cursor(&self, new_zoom: f32, cursor_x: f32, cursor_y: f32) -> Transform {
        let (img_x, img_y) = self.screen_to_image(cursor_x, cursor_y);

        Transform {
            zoom: new_zoom,
            pan_x: cursor_x - img_x * new_zoom,
            pan_y: cursor_y - img_y * new_zoom,
        }
    }

    /// Apply a pan delta to the transform.
    pub fn pan_by(&self, dx: f32, dy: f32) -> Transform {
        Transform {
            zoom: self.zoom,
            pan_x: self.pan_x + dx,
            pan_y: self.pan_y + dy,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        assert_eq!(t.screen_to_image(12.0, 7.0), (12.0, 7.0));
    }

    #[test]
    fn test_zoom_to_cursor_preserves_cursor_point() {
        let t = Transform::new(1.5, 50.0, 30.0);
        let (cursor_x, cursor_y) = (150.0, 120.0);

        let before = t.screen_to_image(cursor_x, cursor_y);
        let new_t = t.zoom_to_cursor(3.0, cursor_x, cursor_y);
        let after = new_t.screen_to_image(cursor_x, cursor_y);

        assert_eq!(new_t.zoom, 3.0);
        assert!(approx_eq(before.0, after.0));
        assert!(approx_eq(before.1, after.1));
    }

    #[test]
    fn test_fit_wide_image() {
        // 200x100 image in a 100x100 view: scale 0.5, letterboxed vertically
        let t = Transform::fit(200.0, 100.0, 100.0, 100.0);
        assert!(approx_eq(t.zoom, 0.5));
        assert!(approx_eq(t.pan_x, 0.0));
        assert!(approx_eq(t.pan_y, 25.0));
    }

    #[test]
    fn test_fit_degenerate_view() {
        assert_eq!(Transform::fit(100.0, 100.0, 0.0, 50.0), Transform::identity());
    }

    #[test]
    fn test_screen_image_round_trip() {
        let t = Transform::new(2.5, -13.0, 40.0);
        let (sx, sy) = t.image_to_screen(33.0, 71.0);
        let (ix, iy) = t.screen_to_image(sx, sy);
        assert!(approx_eq(ix, 33.0));
        assert!(approx_eq(iy, 71.0));
    }

    #[test]
    fn test_pan_by() {
        let t = Transform::new(1.0, 10.0, 20.0);
        let new_t = t.pan_by(5.0, -10.0);

        assert_eq!(new_t.zoom, 1.0);
        assert_eq!(new_t.pan_x, 15.0);
        assert_eq!(new_t.pan_y, 10.0);
    }
}
