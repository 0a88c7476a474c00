//! Viewport state: zoom steps, panning and screen-to-image mapping.

use crate::constants::zoom;
use crate::paint::ImagePoint;
use crate::zoom_math::Transform;

/// A pointer position in view (screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    /// Create a new screen-space point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Pan/zoom controller for the image view.
///
/// Zooming is counted in steps relative to fit-to-view. Step 0 is the fitted
/// view; zooming out never goes past it.
#[derive(Debug, Clone)]
pub struct ViewportController {
    view_size: (f32, f32),
    image_size: Option<(u32, u32)>,
    transform: Transform,
    zoom_steps: i32,
    pan_anchor: Option<ScreenPoint>,
}

impl ViewportController {
    /// Create a controller for a view of the given size, with no image.
    pub fn new(view_width: f32, view_height: f32) -> Self {
        Self {
            view_size: (view_width, view_height),
            image_size: None,
            transform: Transform::identity(),
            zoom_steps: 0,
            pan_anchor: None,
        }
    }

    /// Current image-to-screen transform.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Zoom steps above fit-to-view.
    pub fn zoom_steps(&self) -> i32 {
        self.zoom_steps
    }

    /// View size as `(width, height)`.
    pub fn view_size(&self) -> (f32, f32) {
        self.view_size
    }

    /// Update the view size. The transform is kept; call
    /// [`fit_to_view`](Self::fit_to_view) to refit.
    pub fn set_view_size(&mut self, width: f32, height: f32) {
        self.view_size = (width, height);
    }

    /// Set the displayed image and fit it to the view.
    pub fn set_image_size(&mut self, width: u32, height: u32) {
        self.image_size = Some((width, height));
        self.pan_anchor = None;
        self.fit_to_view();
    }

    /// Forget the displayed image.
    pub fn clear_image(&mut self) {
        self.image_size = None;
        self.pan_anchor = None;
        self.transform = Transform::identity();
        self.zoom_steps = 0;
    }

    /// Scale the image to fit the view and center it.
    pub fn fit_to_view(&mut self) {
        self.zoom_steps = 0;
        if let Some((w, h)) = self.image_size {
            self.transform = Transform::fit(w as f32, h as f32, self.view_size.0, self.view_size.1);
            log::debug!("🔄 View fit: {:.2}x", self.transform.zoom);
        }
    }

    /// Zoom in one step, keeping `anchor` fixed.
    pub fn zoom_in(&mut self, anchor: ScreenPoint) {
        if self.image_size.is_none() {
            return;
        }
        self.zoom_steps += 1;
        self.apply_zoom(zoom::IN_FACTOR, anchor);
    }

    /// Zoom out one step, keeping `anchor` fixed. Reaching step 0 refits the view.
    pub fn zoom_out(&mut self, anchor: ScreenPoint) {
        if self.image_size.is_none() || self.zoom_steps <= 0 {
            self.zoom_steps = 0;
            return;
        }
        self.zoom_steps -= 1;
        if self.zoom_steps == 0 {
            self.fit_to_view();
        } else {
            self.apply_zoom(zoom::OUT_FACTOR, anchor);
        }
    }

    /// Zoom from a wheel event: positive delta zooms in, negative zooms out.
    pub fn wheel(&mut self, delta_y: f32, anchor: ScreenPoint) {
        if delta_y > 0.0 {
            self.zoom_in(anchor);
        } else if delta_y < 0.0 {
            self.zoom_out(anchor);
        }
    }

    fn apply_zoom(&mut self, factor: f32, anchor: ScreenPoint) {
        let new_zoom = self.transform.zoom * factor;
        self.transform = self.transform.zoom_to_cursor(new_zoom, anchor.x, anchor.y);
        log::debug!("🔍 Zoom: {:.2}x (step {})", new_zoom, self.zoom_steps);
    }

    /// Start panning from `position`.
    pub fn begin_pan(&mut self, position: ScreenPoint) {
        if self.image_size.is_some() {
            self.pan_anchor = Some(position);
        }
    }

    /// Move the image with the pointer. Returns whether a pan is active.
    pub fn drag_pan(&mut self, position: ScreenPoint) -> bool {
        let Some(anchor) = self.pan_anchor else {
            return false;
        };
        self.transform = self
            .transform
            .pan_by(position.x - anchor.x, position.y - anchor.y);
        self.pan_anchor = Some(position);
        true
    }

    /// Stop panning.
    pub fn end_pan(&mut self) {
        self.pan_anchor = None;
    }

    /// Check if a pan is in progress.
    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// Map a screen position to image coordinates.
    pub fn screen_to_image(&self, position: ScreenPoint) -> ImagePoint {
        let (x, y) = self.transform.screen_to_image(position.x, position.y);
        ImagePoint::new(x, y)
    }

    /// Map image coordinates to a screen position.
    pub fn image_to_screen(&self, point: ImagePoint) -> ScreenPoint {
        let (x, y) = self.transform.image_to_screen(point.x, point.y);
        ScreenPoint::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn viewer() -> ViewportController {
        let mut viewport = ViewportController::new(400.0, 200.0);
        viewport.set_image_size(100, 100);
        viewport
    }

    #[test]
    fn test_fit_maps_view_to_image() {
        let viewport = viewer();
        // Scale 2.0, image centered horizontally: x offset 100
        let p = viewport.screen_to_image(ScreenPoint::new(100.0, 0.0));
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.y, 0.0));
        let p = viewport.screen_to_image(ScreenPoint::new(300.0, 200.0));
        assert!(approx_eq(p.x, 100.0));
        assert!(approx_eq(p.y, 100.0));
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = viewer();
        let anchor = ScreenPoint::new(170.0, 80.0);
        let before = viewport.screen_to_image(anchor);

        viewport.zoom_in(anchor);
        viewport.zoom_in(anchor);
        let after = viewport.screen_to_image(anchor);

        assert_eq!(viewport.zoom_steps(), 2);
        assert!(approx_eq(viewport.transform().zoom, 2.0 * 1.25 * 1.25));
        assert!(approx_eq(before.x, after.x));
        assert!(approx_eq(before.y, after.y));
    }

    #[test]
    fn test_zoom_out_returns_to_fit_and_stops() {
        let mut viewport = viewer();
        let fitted = viewport.transform();
        let anchor = ScreenPoint::new(10.0, 10.0);

        viewport.zoom_in(anchor);
        viewport.zoom_out(anchor);
        assert_eq!(viewport.zoom_steps(), 0);
        assert_eq!(viewport.transform(), fitted);

        viewport.zoom_out(anchor);
        assert_eq!(viewport.zoom_steps(), 0);
        assert_eq!(viewport.transform(), fitted);
    }

    #[test]
    fn test_wheel_direction() {
        let mut viewport = viewer();
        let anchor = ScreenPoint::new(200.0, 100.0);
        viewport.wheel(120.0, anchor);
        assert_eq!(viewport.zoom_steps(), 1);
        viewport.wheel(-120.0, anchor);
        assert_eq!(viewport.zoom_steps(), 0);
    }

    #[test]
    fn test_pan_moves_image_with_pointer() {
        let mut viewport = viewer();
        let before = viewport.screen_to_image(ScreenPoint::new(200.0, 100.0));

        viewport.begin_pan(ScreenPoint::new(50.0, 50.0));
        assert!(viewport.drag_pan(ScreenPoint::new(70.0, 40.0)));
        viewport.end_pan();
        assert!(!viewport.drag_pan(ScreenPoint::new(0.0, 0.0)));

        // Pointer moved +20,-10 screen px at scale 2: image shifted by +10,-5
        let after = viewport.screen_to_image(ScreenPoint::new(200.0, 100.0));
        assert!(approx_eq(before.x - after.x, 10.0));
        assert!(approx_eq(before.y - after.y, -5.0));
    }

    #[test]
    fn test_no_image_ignores_zoom_and_pan() {
        let mut viewport = ViewportController::new(100.0, 100.0);
        viewport.zoom_in(ScreenPoint::new(0.0, 0.0));
        viewport.begin_pan(ScreenPoint::new(0.0, 0.0));
        assert_eq!(viewport.zoom_steps(), 0);
        assert!(!viewport.is_panning());
    }
}
