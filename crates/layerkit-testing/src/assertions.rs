//! Fuzzy-comparison assertion helpers for layout and gesture tests, where
//! floating-point frame arithmetic makes exact equality the wrong tool.

use layerkit_foundation::{Point, Rect};

pub fn assert_approx_eq(actual: f64, expected: f64, tolerance: f64, msg: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{}: expected {} (±{}), got {} (diff: {})",
        msg,
        expected,
        tolerance,
        actual,
        diff
    );
}

pub fn assert_point_approx_eq(actual: Point, expected: Point, tolerance: f64, msg: &str) {
    assert_approx_eq(actual.x, expected.x, tolerance, &format!("{} - x", msg));
    assert_approx_eq(actual.y, expected.y, tolerance, &format!("{} - y", msg));
}

pub fn assert_rect_approx_eq(actual: Rect, expected: Rect, tolerance: f64, msg: &str) {
    assert_approx_eq(actual.left, expected.left, tolerance, &format!("{} - left", msg));
    assert_approx_eq(actual.top, expected.top, tolerance, &format!("{} - top", msg));
    assert_approx_eq(actual.width(), expected.width(), tolerance, &format!("{} - width", msg));
    assert_approx_eq(actual.height(), expected.height(), tolerance, &format!("{} - height", msg));
}
