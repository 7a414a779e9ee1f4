//! Selection retrieval: turning the `".selection"` attribute into index masks.
//!
//! Masks are valid only against the point/curve counts they were computed
//! from; every structural rewrite invalidates them and callers recompute.

use serde::{Deserialize, Serialize};
use strokes::{AttrDomain, Drawing, IndexMask, ATTR_SELECTION};

/// Which domain an operation's selection applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionDomain {
    Point,
    Curve,
}

/// Selected points of a drawing. All points count as selected while the
/// selection attribute is still virtual.
pub fn selected_points(drawing: &Drawing) -> IndexMask {
    let selection = drawing.selection(AttrDomain::Point);
    if selection.is_single() {
        return IndexMask::all(drawing.point_count());
    }
    IndexMask::from_predicate(0..drawing.point_count(), |i| selection.get(i))
}

/// Selected curves. A drawing selected on the point domain maps up: a curve
/// is selected when any of its points is.
pub fn selected_curves(drawing: &Drawing) -> IndexMask {
    let curve_selection = drawing.selection(AttrDomain::Curve);
    if !curve_selection.is_single() {
        return IndexMask::from_predicate(0..drawing.curve_count(), |i| curve_selection.get(i));
    }
    let point_selection = drawing.selection(AttrDomain::Point);
    if point_selection.is_single() {
        return IndexMask::all(drawing.curve_count());
    }
    IndexMask::from_predicate(0..drawing.curve_count(), |curve| {
        drawing
            .partition()
            .points_of(curve)
            .any(|point| point_selection.get(point))
    })
}

/// Whether any element of the drawing is selected on either domain
pub fn has_selection(drawing: &Drawing) -> bool {
    !selected_points(drawing).is_empty() || !selected_curves(drawing).is_empty()
}

/// Boolean per-point selection over the whole drawing, restricted to the
/// given curves; points of other curves read false.
pub fn point_selection_within(drawing: &Drawing, curves: &IndexMask) -> Vec<bool> {
    let selection = drawing.selection(AttrDomain::Point);
    let mut bools = vec![false; drawing.point_count()];
    for curve in curves.iter() {
        for point in drawing.partition().points_of(curve) {
            bools[point] = selection.get(point);
        }
    }
    bools
}

/// Materialize an all-false selection on one domain
pub fn deselect_all(drawing: &mut Drawing, domain: AttrDomain) {
    let len = drawing.domain_len(domain);
    drawing
        .attributes_mut()
        .bools_for_write(domain, ATTR_SELECTION, true, len)
        .fill(false);
}

/// Write the selection of one domain from explicit bools
pub fn write_selection(drawing: &mut Drawing, domain: AttrDomain, bools: &[bool]) {
    let len = drawing.domain_len(domain);
    debug_assert_eq!(bools.len(), len);
    drawing
        .attributes_mut()
        .bools_for_write(domain, ATTR_SELECTION, true, len)
        .copy_from_slice(bools);
}
