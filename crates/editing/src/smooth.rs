//! Iterative neighbor smoothing of point attributes.

use serde::{Deserialize, Serialize};
use strokes::{AttrData, AttrDomain, Drawing, IndexMask, ATTR_OPACITY, ATTR_POSITION, ATTR_RADIUS};
use tracing::debug;

/// Smoothing parameters shared by all target attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothParams {
    pub iterations: usize,
    /// Blend factor per iteration, in `[0, 1]`
    pub influence: f32,
    /// Whether the first and last point of an open curve may move
    pub smooth_ends: bool,
    /// Average against the original values each iteration instead of the
    /// progressively smoothed ones, which limits shrinkage
    pub keep_shape: bool,
    pub smooth_position: bool,
    pub smooth_radius: bool,
    pub smooth_opacity: bool,
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self {
            iterations: 10,
            influence: 1.0,
            smooth_ends: false,
            keep_shape: false,
            smooth_position: true,
            smooth_radius: true,
            smooth_opacity: false,
        }
    }
}

fn neighbor_indices(
    point: usize,
    range: &std::ops::Range<usize>,
    is_cyclic: bool,
) -> Option<(usize, usize)> {
    let first = range.start;
    let last = range.end - 1;
    let prev = if point == first {
        if !is_cyclic {
            return None;
        }
        last
    } else {
        point - 1
    };
    let next = if point == last {
        if !is_cyclic {
            return None;
        }
        first
    } else {
        point + 1
    };
    Some((prev, next))
}

/// One smoothing pass over a float or vector array, restricted to selected
/// points of the masked curves. Returns whether any value moved.
fn smooth_array(
    data: &mut AttrData,
    drawing: &Drawing,
    curves: &IndexMask,
    selected: &[bool],
    params: SmoothParams,
) -> bool {
    let mut changed = false;
    let cyclic = drawing.cyclic();
    let original = data.clone();
    for _ in 0..params.iterations {
        let source = data.clone();
        let reference = if params.keep_shape { &original } else { &source };
        let mut updates: Vec<(usize, strokes::AttrValue)> = Vec::new();
        for curve in curves.iter() {
            let range = drawing.partition().points_of(curve);
            if range.is_empty() {
                continue;
            }
            let is_cyclic = cyclic.get(curve);
            let first = range.start;
            let last = range.end - 1;
            for point in range.clone() {
                if !selected[point] {
                    continue;
                }
                let (prev, next) = match neighbor_indices(point, &range, is_cyclic) {
                    Some(neighbors) => neighbors,
                    // Open-curve endpoints average one-sided when asked.
                    None if params.smooth_ends && first != last => {
                        if point == first {
                            (point, point + 1)
                        } else {
                            (point - 1, point)
                        }
                    }
                    None => continue,
                };
                let target = average_pair(reference, prev, next);
                updates.push((point, blend(&source, point, target, params.influence)));
            }
        }
        for (point, value) in updates {
            changed |= set_value(data, point, value);
        }
    }
    changed
}

fn average_pair(data: &AttrData, a: usize, b: usize) -> strokes::AttrValue {
    data.lerp(a, b, 0.5)
}

fn blend(data: &AttrData, point: usize, target: strokes::AttrValue, influence: f32) -> strokes::AttrValue {
    use strokes::AttrValue;
    match (data.value(point), target) {
        (AttrValue::Float(a), AttrValue::Float(b)) => AttrValue::Float(a + (b - a) * influence),
        (AttrValue::Vec3(a), AttrValue::Vec3(b)) => AttrValue::Vec3(a.lerp(b, influence)),
        (current, _) => current,
    }
}

fn set_value(data: &mut AttrData, index: usize, value: strokes::AttrValue) -> bool {
    use strokes::AttrValue;
    match (data, value) {
        (AttrData::Float(v), AttrValue::Float(x)) => {
            let moved = v[index] != x;
            v[index] = x;
            moved
        }
        (AttrData::Vec3(v), AttrValue::Vec3(x)) => {
            let moved = v[index] != x;
            v[index] = x;
            moved
        }
        _ => false,
    }
}

/// Smooth the enabled point attributes of the masked curves in place.
/// Returns whether anything was smoothed.
pub fn smooth_drawing(drawing: &mut Drawing, curves: &IndexMask, params: SmoothParams) -> bool {
    if curves.is_empty() || params.iterations == 0 || params.influence <= 0.0 {
        return false;
    }
    let selected: Vec<bool> = drawing.selection(AttrDomain::Point).materialize();

    let mut targets: Vec<&str> = Vec::new();
    if params.smooth_position {
        targets.push(ATTR_POSITION);
    }
    // Virtual radius and opacity are uniform; smoothing them is a no-op, so
    // only materialized arrays are touched.
    if params.smooth_radius && drawing.attributes().contains(AttrDomain::Point, ATTR_RADIUS) {
        targets.push(ATTR_RADIUS);
    }
    if params.smooth_opacity && drawing.attributes().contains(AttrDomain::Point, ATTR_OPACITY) {
        targets.push(ATTR_OPACITY);
    }

    let mut changed = false;
    for name in targets {
        let Some(data) = drawing.attributes().lookup(AttrDomain::Point, name) else {
            continue;
        };
        let mut data = data.clone();
        // Position keeps the overall shape when asked; radius and opacity
        // never do.
        let params = SmoothParams {
            keep_shape: params.keep_shape && name == ATTR_POSITION,
            ..params
        };
        if smooth_array(&mut data, drawing, curves, &selected, params) {
            drawing.attributes_mut().insert(AttrDomain::Point, name, data);
            changed = true;
        }
    }
    if changed {
        debug!(iterations = params.iterations, influence = params.influence, "smoothed attributes");
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use strokes::CurvePartition;

    fn spike() -> Drawing {
        Drawing::new(
            CurvePartition::single(3),
            vec![
                Vec3::ZERO,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_smooth_flattens_spike() {
        let mut drawing = spike();
        let params = SmoothParams {
            iterations: 1,
            influence: 1.0,
            ..SmoothParams::default()
        };
        assert!(smooth_drawing(&mut drawing, &IndexMask::all(1), params));
        // Midpoint pulled onto the chord; endpoints pinned.
        assert_eq!(drawing.positions()[1], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(drawing.positions()[0], Vec3::ZERO);
        assert_eq!(drawing.positions()[2], Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_influence_scales_movement() {
        let mut drawing = spike();
        let params = SmoothParams {
            iterations: 1,
            influence: 0.5,
            ..SmoothParams::default()
        };
        smooth_drawing(&mut drawing, &IndexMask::all(1), params);
        assert!((drawing.positions()[1].y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cyclic_smooths_endpoints() {
        let mut drawing = spike();
        drawing.cyclic_mut()[0] = true;
        let params = SmoothParams {
            iterations: 1,
            influence: 1.0,
            ..SmoothParams::default()
        };
        smooth_drawing(&mut drawing, &IndexMask::all(1), params);
        // Endpoint 0 averages its cyclic neighbors (points 2 and 1).
        assert_eq!(drawing.positions()[0], Vec3::new(1.5, 0.5, 0.0));
    }

    #[test]
    fn test_straight_line_reports_unchanged() {
        let mut drawing = Drawing::new(
            CurvePartition::single(3),
            vec![Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)],
        );
        let params = SmoothParams {
            iterations: 2,
            influence: 1.0,
            ..SmoothParams::default()
        };
        // The midpoint already sits on the chord; nothing moves.
        assert!(!smooth_drawing(&mut drawing, &IndexMask::all(1), params));
    }

    #[test]
    fn test_zero_influence_noop() {
        let mut drawing = spike();
        let params = SmoothParams {
            influence: 0.0,
            ..SmoothParams::default()
        };
        assert!(!smooth_drawing(&mut drawing, &IndexMask::all(1), params));
    }
}
