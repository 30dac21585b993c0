//! Reading-order engine.
//!
//! Shapes are read top-to-bottom, then left-to-right. Shapes sharing the
//! exact same top and left keep their document order. This approximates
//! natural reading order for typical layouts (title above a single body
//! column); multi-column and overlapping layouts are not reconstructed.

use crate::types::{ShapeRef, TextBlock};

/// Sort shapes into reading order and return their text blocks.
pub fn reading_order(mut shapes: Vec<ShapeRef>) -> Vec<TextBlock> {
    sort_by_position(&mut shapes);
    shapes.into_iter().map(|s| s.block).collect()
}

/// Sort shapes in place by (top, left, document order).
///
/// The sort key is total, so the result does not depend on the input
/// permutation.
pub fn sort_by_position(shapes: &mut [ShapeRef]) {
    shapes.sort_by_key(|s| (s.top, s.left, s.order));
}
