//! Geometry: block/inline layout and the client rectangles derived from it

pub mod layout;

use serde::Serialize;

pub use layout::{DocumentMetrics, ElementMetrics, Rect};

/// Border box of an element relative to the viewport, the shape of
/// `getBoundingClientRect()`.
///
/// Elements without a box (`display: none`, detached, inside an
/// unrendered subtree) report all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl From<Rect> for BoundingBox {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            top: rect.y,
            right: rect.right(),
            bottom: rect.bottom(),
            left: rect.x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_follow_rect() {
        let bb = BoundingBox::from(Rect {
            x: 10.0,
            y: -5.0,
            width: 30.0,
            height: 20.0,
        });
        assert_eq!(bb.left, 10.0);
        assert_eq!(bb.right, 40.0);
        assert_eq!(bb.top, -5.0);
        assert_eq!(bb.bottom, 15.0);
    }
}
