use egui::{Pos2, Rect};

use super::types::Axis;

/// Relative pointer position along `axis` inside `rect`, clamped to `[0, 1]`.
///
/// Returns `None` for a degenerate rect (zero or negative extent, e.g. an element that was
/// unmounted mid-drag) or a non-finite pointer.
pub(super) fn pointer_ratio(rect: Rect, pointer: Pos2, axis: Axis) -> Option<f32> {
    let (start, size, coord) = match axis {
        Axis::Horizontal => (rect.left(), rect.width(), pointer.x),
        Axis::Vertical => (rect.top(), rect.height(), pointer.y),
    };

    if !size.is_finite() || size <= 0.0 || !coord.is_finite() || !start.is_finite() {
        return None;
    }

    let ratio = (coord - start) / size;
    Some(ratio.clamp(0.0, 1.0))
}
