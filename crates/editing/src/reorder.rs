//! Reorder: permute curve draw order.
//!
//! Curve order is draw order, so moving a stroke "up" means drawing it
//! later. Top and Bottom are stable partitions; Up and Down are single-step
//! neighbor swaps whose processing order (ascending for Down, descending for
//! Up) keeps a block of adjacent selected curves moving as a unit.

use serde::{Deserialize, Serialize};
use strokes::{gather_curves, Drawing, IndexMask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReorderDirection {
    Top,
    Up,
    Down,
    Bottom,
}

/// The new draw order as a dst-to-src curve permutation
pub fn reordered_indices(
    universe: usize,
    selected: &IndexMask,
    direction: ReorderDirection,
) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..universe).collect();
    match direction {
        ReorderDirection::Down => {
            for (pos, curve) in selected.iter().enumerate() {
                // Packed at the very bottom already when index equals its
                // ordinal in the mask.
                if curve != pos {
                    indices.swap(curve, curve - 1);
                }
            }
        }
        ReorderDirection::Up => {
            for (pos, &curve) in selected.indices().iter().rev().enumerate() {
                if curve != universe - 1 - pos {
                    indices.swap(curve, curve + 1);
                }
            }
        }
        ReorderDirection::Top => {
            indices.retain(|i| !selected.contains(*i));
            indices.extend(selected.iter());
        }
        ReorderDirection::Bottom => {
            let mut reordered: Vec<usize> = selected.iter().collect();
            reordered.extend(indices.into_iter().filter(|i| !selected.contains(*i)));
            indices = reordered;
        }
    }
    indices
}

/// Apply a reorder to the drawing. Returns `None` when the permutation is
/// the identity.
pub fn reorder_curves(
    src: &Drawing,
    selected: &IndexMask,
    direction: ReorderDirection,
) -> Option<Drawing> {
    let order = reordered_indices(src.curve_count(), selected, direction);
    if order.iter().enumerate().all(|(pos, &curve)| pos == curve) {
        return None;
    }

    let mut counts = Vec::with_capacity(order.len());
    let mut dst_to_src_point = Vec::with_capacity(src.point_count());
    for &curve in &order {
        counts.push(src.partition().size_of(curve));
        dst_to_src_point.extend(src.partition().points_of(curve));
    }
    Some(gather_curves(src, &counts, &dst_to_src_point, &order, &[]))
}
