//! Subdivide: insert evenly spaced cuts along qualifying segments.
//!
//! A segment is the gap after point `p` and before its successor, including
//! the closing gap of a cyclic curve. In whole-curve mode every segment of a
//! selected curve subdivides; in point-selection mode only segments whose
//! both endpoints are selected do. Inserted points linearly interpolate all
//! point attributes, selection included.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strokes::{AttrData, AttrDomain, AttributeStore, CurvePartition, Drawing, IndexMask};
use tracing::debug;

/// Which segments receive cuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubdivideMode {
    /// Every segment of every masked curve
    WholeCurves,
    /// Only segments with both endpoints selected
    SelectedSegments,
}

/// Insert `cuts` new points in each qualifying segment. Returns `None` when
/// no segment qualifies or `cuts` is zero.
pub fn subdivide(
    src: &Drawing,
    curves: &IndexMask,
    cuts: usize,
    mode: SubdivideMode,
) -> Option<Drawing> {
    if cuts == 0 {
        return None;
    }
    let selection = src.selection(AttrDomain::Point);
    let cyclic = src.cyclic();

    // Pass one: cuts per segment. Segment i of a curve follows the curve's
    // i-th point; the last entry is the cyclic closing segment.
    let in_mask = curves.to_bools(src.curve_count());
    let mut segment_cuts = vec![0usize; src.point_count()];
    let mut counts = Vec::with_capacity(src.curve_count());
    let mut total_cuts = 0;
    for curve in src.partition().curves_range() {
        let range = src.partition().points_of(curve);
        let mut count = range.len();
        if in_mask[curve] && range.len() > 1 {
            let last = range.end - 1;
            for point in range.clone() {
                let successor = if point == last {
                    if !cyclic.get(curve) {
                        continue;
                    }
                    range.start
                } else {
                    point + 1
                };
                let qualifies = match mode {
                    SubdivideMode::WholeCurves => true,
                    SubdivideMode::SelectedSegments => {
                        selection.get(point) && selection.get(successor)
                    }
                };
                if qualifies {
                    segment_cuts[point] = cuts;
                    count += cuts;
                    total_cuts += cuts;
                }
            }
        }
        counts.push(count);
    }
    if total_cuts == 0 {
        return None;
    }

    // Pass two: build each point array directly, interpolating the cuts.
    let partition = CurvePartition::from_counts(&counts);
    let mut point_arrays: BTreeMap<String, AttrData> = BTreeMap::new();
    for (name, data) in src.attributes().iter(AttrDomain::Point) {
        let mut dst = AttrData::filled(data.value(0), 0);
        for curve in src.partition().curves_range() {
            let range = src.partition().points_of(curve);
            if range.is_empty() {
                continue;
            }
            let last = range.end - 1;
            for point in range.clone() {
                dst.push(data.value(point));
                let n = segment_cuts[point];
                if n == 0 {
                    continue;
                }
                let successor = if point == last { range.start } else { point + 1 };
                for cut in 1..=n {
                    let t = cut as f32 / (n + 1) as f32;
                    dst.push(data.lerp(point, successor, t));
                }
            }
        }
        point_arrays.insert(name.to_owned(), dst);
    }

    let dst_to_src_curve: Vec<usize> = src.partition().curves_range().collect();
    let mut attributes = AttributeStore::new();
    attributes.set_domain(AttrDomain::Point, point_arrays);
    attributes.set_domain(
        AttrDomain::Curve,
        src.attributes()
            .gather_domain(AttrDomain::Curve, &dst_to_src_curve, &[]),
    );

    debug!(cuts, inserted = total_cuts, "subdivided segments");
    Some(Drawing::from_parts(partition, attributes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::write_selection;
    use glam::Vec3;

    fn line(n: usize) -> Drawing {
        Drawing::new(
            CurvePartition::single(n),
            (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
        )
    }

    #[test]
    fn test_uniform_subdivision() {
        let src = line(3);
        let dst = subdivide(&src, &IndexMask::all(1), 2, SubdivideMode::WholeCurves).unwrap();
        // Two segments, two cuts each.
        assert_eq!(dst.point_count(), 7);
        let xs: Vec<f32> = dst.positions().iter().map(|p| p.x).collect();
        let expected = [0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0, 4.0 / 3.0, 5.0 / 3.0, 2.0];
        for (x, want) in xs.iter().zip(expected) {
            assert!((x - want).abs() < 1e-6, "{x} vs {want}");
        }
    }

    #[test]
    fn test_selected_segments_only() {
        let mut src = line(4);
        write_selection(
            &mut src,
            AttrDomain::Point,
            &[true, true, false, true],
        );
        let dst = subdivide(&src, &IndexMask::all(1), 1, SubdivideMode::SelectedSegments).unwrap();
        // Only the 0-1 segment has both endpoints selected.
        assert_eq!(dst.point_count(), 5);
        assert_eq!(dst.positions()[1], Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_cyclic_closing_segment() {
        let mut src = line(3);
        src.cyclic_mut()[0] = true;
        let dst = subdivide(&src, &IndexMask::all(1), 1, SubdivideMode::WholeCurves).unwrap();
        // Three segments including the closing one.
        assert_eq!(dst.point_count(), 6);
        // The last point interpolates back toward the first.
        assert_eq!(dst.positions()[5], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_interpolated_radius() {
        let mut src = line(2);
        src.radii_mut().copy_from_slice(&[0.1, 0.3]);
        let dst = subdivide(&src, &IndexMask::all(1), 1, SubdivideMode::WholeCurves).unwrap();
        let radii = dst.radii().materialize();
        assert!((radii[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_zero_cuts_noop() {
        let src = line(3);
        assert!(subdivide(&src, &IndexMask::all(1), 0, SubdivideMode::WholeCurves).is_none());
    }
}
