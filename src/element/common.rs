use egui::{Rect, Vec2, pos2};

// Common constants for all element types
pub const MIN_ELEMENT_SIZE: f32 = 30.0;
pub const RESIZE_HANDLE_RADIUS: f32 = 8.0;

/// Clamps a rectangle so it lies fully inside a canvas of the given logical size.
///
/// The size floor is applied first, then the position: an element can never be
/// smaller than `MIN_ELEMENT_SIZE` or larger than the canvas itself, and its
/// bounding box always ends up inside `[0, canvas.x] x [0, canvas.y]`.
/// Applying this twice yields the same rectangle.
pub(crate) fn clamp_rect_to_canvas(rect: Rect, canvas: Vec2) -> Rect {
    let width = rect.width().max(MIN_ELEMENT_SIZE).min(canvas.x);
    let height = rect.height().max(MIN_ELEMENT_SIZE).min(canvas.y);

    let x = rect.min.x.clamp(0.0, canvas.x - width);
    let y = rect.min.y.clamp(0.0, canvas.y - height);

    Rect::from_min_size(pos2(x, y), Vec2::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_is_idempotent() {
        let canvas = Vec2::new(400.0, 500.0);
        let rect = Rect::from_min_size(pos2(390.0, -20.0), Vec2::new(50.0, 10.0));

        let once = clamp_rect_to_canvas(rect, canvas);
        let twice = clamp_rect_to_canvas(once, canvas);

        assert_eq!(once, twice);
        assert!(once.min.x >= 0.0 && once.max.x <= canvas.x);
        assert!(once.min.y >= 0.0 && once.max.y <= canvas.y);
        assert!(once.height() >= MIN_ELEMENT_SIZE);
    }

    #[test]
    fn oversized_rect_is_shrunk_to_canvas() {
        let canvas = Vec2::new(400.0, 400.0);
        let rect = Rect::from_min_size(pos2(0.0, 0.0), Vec2::new(1000.0, 1000.0));

        let clamped = clamp_rect_to_canvas(rect, canvas);
        assert_eq!(clamped.size(), canvas);
        assert_eq!(clamped.min, pos2(0.0, 0.0));
    }
}
