//! Pointer adapter: turns host pointer events into session calls.
//!
//! - Primary button: press starts a stroke, drag extends it, release ends it.
//! - Any other button: drag pans the view.
//! - Wheel: zooms around the cursor, ignored while a stroke is active.

use crate::error::Result;
use crate::session::EditorSession;
use crate::viewport::ScreenPoint;

/// Mouse button reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer event in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press {
        button: PointerButton,
        position: ScreenPoint,
    },
    Move {
        position: ScreenPoint,
    },
    Release {
        button: PointerButton,
        position: ScreenPoint,
    },
    Wheel {
        delta_y: f32,
        position: ScreenPoint,
    },
}

/// What an event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEffect {
    /// Nothing changed
    None,
    /// The mask was painted
    Painted,
    /// The view moved or zoomed
    ViewChanged,
}

/// Apply one pointer event to the session.
pub fn handle_pointer(session: &mut EditorSession, event: PointerEvent) -> Result<PointerEffect> {
    match event {
        PointerEvent::Press {
            button: PointerButton::Primary,
            position,
        } => {
            if session.viewport().is_panning() {
                return Ok(PointerEffect::None);
            }
            let point = session.viewport().screen_to_image(position);
            if session.begin_stroke(point)? {
                Ok(PointerEffect::Painted)
            } else {
                Ok(PointerEffect::None)
            }
        }
        PointerEvent::Press { position, .. } => {
            if session.is_stroking() {
                return Ok(PointerEffect::None);
            }
            session.viewport_mut().begin_pan(position);
            Ok(PointerEffect::None)
        }
        PointerEvent::Move { position } => {
            if session.viewport_mut().drag_pan(position) {
                return Ok(PointerEffect::ViewChanged);
            }
            if session.is_stroking() {
                let point = session.viewport().screen_to_image(position);
                session.extend_stroke(point)?;
                return Ok(PointerEffect::Painted);
            }
            Ok(PointerEffect::None)
        }
        PointerEvent::Release {
            button: PointerButton::Primary,
            ..
        } => {
            session.end_stroke();
            Ok(PointerEffect::None)
        }
        PointerEvent::Release { .. } => {
            session.viewport_mut().end_pan();
            Ok(PointerEffect::None)
        }
        PointerEvent::Wheel { delta_y, position } => {
            if session.is_stroking() || delta_y == 0.0 {
                return Ok(PointerEffect::None);
            }
            session.viewport_mut().wheel(delta_y, position);
            Ok(PointerEffect::ViewChanged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::Channel;
    use image::{Rgb, RgbImage};

    /// 50x50 image in a 100x100 view: screen = image * 2
    fn session() -> EditorSession {
        let mut session = EditorSession::new(100.0, 100.0);
        session
            .set_image(RgbImage::from_pixel(50, 50, Rgb([90, 90, 90])))
            .unwrap();
        session
    }

    fn press(button: PointerButton, x: f32, y: f32) -> PointerEvent {
        PointerEvent::Press {
            button,
            position: ScreenPoint::new(x, y),
        }
    }

    fn release(button: PointerButton, x: f32, y: f32) -> PointerEvent {
        PointerEvent::Release {
            button,
            position: ScreenPoint::new(x, y),
        }
    }

    fn moved(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Move {
            position: ScreenPoint::new(x, y),
        }
    }

    #[test]
    fn test_click_paints_one_dot() {
        let mut session = session();
        let effect = handle_pointer(&mut session, press(PointerButton::Primary, 40.0, 40.0)).unwrap();
        assert_eq!(effect, PointerEffect::Painted);
        handle_pointer(&mut session, release(PointerButton::Primary, 40.0, 40.0)).unwrap();

        let mask = session.mask().unwrap();
        assert_eq!(mask.value(Channel::Foreground, 20, 20), 255);
        assert_eq!(mask.value(Channel::Foreground, 30, 20), 0);
        assert_eq!(session.history().undo_count(), 1);
    }

    #[test]
    fn test_drag_paints_line() {
        let mut session = session();
        handle_pointer(&mut session, press(PointerButton::Primary, 20.0, 40.0)).unwrap();
        handle_pointer(&mut session, moved(80.0, 40.0)).unwrap();
        handle_pointer(&mut session, release(PointerButton::Primary, 80.0, 40.0)).unwrap();

        let mask = session.mask().unwrap();
        for x in 10..=40 {
            assert_eq!(mask.value(Channel::Foreground, x, 20), 255, "x = {}", x);
        }
        // Moving after release paints nothing
        let before = mask.clone();
        handle_pointer(&mut session, moved(10.0, 90.0)).unwrap();
        assert_eq!(session.mask().unwrap(), &before);
    }

    #[test]
    fn test_secondary_drag_pans_without_painting() {
        let mut session = session();
        let before = session.viewport().transform();

        handle_pointer(&mut session, press(PointerButton::Secondary, 50.0, 50.0)).unwrap();
        let effect = handle_pointer(&mut session, moved(60.0, 50.0)).unwrap();
        handle_pointer(&mut session, release(PointerButton::Secondary, 60.0, 50.0)).unwrap();

        assert_eq!(effect, PointerEffect::ViewChanged);
        assert_eq!(session.viewport().transform().pan_x, before.pan_x + 10.0);
        assert!(session.mask().unwrap().is_blank());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_wheel_ignored_while_stroking() {
        let mut session = session();
        handle_pointer(&mut session, press(PointerButton::Primary, 40.0, 40.0)).unwrap();
        let wheel = PointerEvent::Wheel {
            delta_y: 1.0,
            position: ScreenPoint::new(40.0, 40.0),
        };
        assert_eq!(handle_pointer(&mut session, wheel).unwrap(), PointerEffect::None);
        assert_eq!(session.viewport().zoom_steps(), 0);

        handle_pointer(&mut session, release(PointerButton::Primary, 40.0, 40.0)).unwrap();
        assert_eq!(handle_pointer(&mut session, wheel).unwrap(), PointerEffect::ViewChanged);
        assert_eq!(session.viewport().zoom_steps(), 1);
    }

    #[test]
    fn test_press_outside_image() {
        let mut session = EditorSession::new(200.0, 100.0);
        session
            .set_image(RgbImage::from_pixel(50, 50, Rgb([0, 0, 0])))
            .unwrap();
        // Image occupies x in 50..150 of the view
        let effect = handle_pointer(&mut session, press(PointerButton::Primary, 10.0, 50.0)).unwrap();
        assert_eq!(effect, PointerEffect::None);
        assert!(!session.is_stroking());
    }
}
