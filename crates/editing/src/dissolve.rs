//! Dissolve: excise points without introducing new curve boundaries.

use serde::{Deserialize, Serialize};
use strokes::{invert_booleans, AttrDomain, Drawing, IndexMask};

use crate::delete::remove_points;

/// Which points of each selected curve dissolve away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DissolveMode {
    /// Dissolve exactly the selected points
    Points,
    /// Dissolve unselected points strictly between the first and last
    /// selected point of the curve
    Between,
    /// Dissolve everything except the selected points
    Unselect,
}

/// Per-point dissolve flags for the drawing. Curves outside `curves`, and
/// curves without any selected point, are fully protected.
pub fn dissolve_flags(drawing: &Drawing, curves: &IndexMask, mode: DissolveMode) -> Vec<bool> {
    let selection = drawing.selection(AttrDomain::Point);
    let mut keep = vec![true; drawing.point_count()];

    for curve in curves.iter() {
        let points = drawing.partition().points_of(curve);
        let selected: Vec<usize> = points.clone().filter(|&p| selection.get(p)).collect();
        let (Some(&first_selected), Some(&last_selected)) = (selected.first(), selected.last())
        else {
            continue;
        };

        for point in points {
            let is_selected = selection.get(point);
            keep[point] = match mode {
                DissolveMode::Points => !is_selected,
                DissolveMode::Between => {
                    is_selected || point < first_selected || point > last_selected
                }
                DissolveMode::Unselect => is_selected,
            };
        }
    }
    invert_booleans(&mut keep);
    keep
}

/// Dissolve points of the selected curves. Returns `None` when the flags
/// come up empty.
pub fn dissolve_points(drawing: &Drawing, curves: &IndexMask, mode: DissolveMode) -> Option<Drawing> {
    let flags = dissolve_flags(drawing, curves, mode);
    let mask = IndexMask::from_bools(&flags);
    if mask.is_empty() {
        return None;
    }
    Some(remove_points(drawing, &mask))
}
