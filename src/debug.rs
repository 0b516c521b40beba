//! Shapes recorded while simulating a frame, drained by `Simulation::debug`.

use crate::math::Point2d;
#[cfg(feature = "debug")]
use serde_json::{json, Value};

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<Value>> = Default::default();
);

#[cfg(feature = "debug")]
fn push_shape(shape: Value) {
    DEBUG_FRAME.with(|frame| frame.borrow_mut().push(shape))
}

#[allow(unused)]
pub fn debug_line(name: &str, p1: Point2d, p2: Point2d) {
    #[cfg(feature = "debug")]
    push_shape(json!({
        "type": "line",
        "name": name,
        "p1": [p1.x, p1.y],
        "p2": [p2.x, p2.y],
    }));
}

#[allow(unused)]
pub fn debug_circle(name: &str, centre: Point2d, radius: f64) {
    #[cfg(feature = "debug")]
    push_shape(json!({
        "type": "circle",
        "name": name,
        "centre": [centre.x, centre.y],
        "radius": radius,
    }));
}

/// Records a closed polygon.
#[allow(unused)]
pub fn debug_polygon(name: &str, points: &[Point2d]) {
    #[cfg(feature = "debug")]
    push_shape(json!({
        "type": "polygon",
        "name": name,
        "points": points.iter().map(|p| [p.x, p.y]).collect::<Vec<_>>(),
    }));
}

/// Drains the shapes recorded on this thread since the last call.
#[cfg(feature = "debug")]
pub fn take_debug_frame() -> Value {
    Value::Array(DEBUG_FRAME.with(|frame| frame.take()))
}
