//! Merge by distance: collapse near-coincident points inside each curve.

use std::collections::BTreeMap;

use glam::Vec3;
use strokes::{AttrData, AttrDomain, AttrValue, AttributeStore, CurvePartition, Drawing, IndexMask};
use tracing::debug;

/// Average a group of source elements into one value. Floats and vectors
/// take the mean, booleans OR together, integers keep the first.
fn merge_value(data: &AttrData, group: &[usize]) -> AttrValue {
    match data {
        AttrData::Bool(v) => AttrValue::Bool(group.iter().any(|&i| v[i])),
        AttrData::Int(v) => AttrValue::Int(v[group[0]]),
        AttrData::Float(v) => {
            let sum: f32 = group.iter().map(|&i| v[i]).sum();
            AttrValue::Float(sum / group.len() as f32)
        }
        AttrData::Vec3(v) => {
            let sum: Vec3 = group.iter().map(|&i| v[i]).sum();
            AttrValue::Vec3(sum / group.len() as f32)
        }
    }
}

/// Merge masked points lying within `threshold` of their predecessor into
/// one averaged point, walking each curve front to back. Curves whose point
/// count drops below 2 are removed (1-point curves that started that way
/// are kept). Returns `None` when nothing merges.
pub fn merge_by_distance(src: &Drawing, points: &IndexMask, threshold: f32) -> Option<Drawing> {
    let masked = points.to_bools(src.point_count());
    let positions = src.positions();

    // Pass one: per-curve groups of consecutive merged source points.
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut counts = Vec::new();
    let mut dst_to_src_curve = Vec::new();
    let mut merged_any = false;
    for curve in src.partition().curves_range() {
        let range = src.partition().points_of(curve);
        let mut curve_groups: Vec<Vec<usize>> = Vec::new();
        for point in range.clone() {
            let mergeable = masked[point]
                && curve_groups
                    .last()
                    .and_then(|group| group.last())
                    .is_some_and(|&prev| {
                        masked[prev] && positions[prev].distance(positions[point]) < threshold
                    });
            if mergeable {
                if let Some(group) = curve_groups.last_mut() {
                    group.push(point);
                    merged_any = true;
                }
            } else {
                curve_groups.push(vec![point]);
            }
        }
        if curve_groups.len() < 2 && range.len() >= 2 {
            merged_any = true;
            continue;
        }
        counts.push(curve_groups.len());
        dst_to_src_curve.push(curve);
        groups.extend(curve_groups);
    }
    if !merged_any {
        return None;
    }

    // Pass two: averaged point arrays, gathered curve arrays.
    let partition = CurvePartition::from_counts(&counts);
    let mut point_arrays: BTreeMap<String, AttrData> = BTreeMap::new();
    for (name, data) in src.attributes().iter(AttrDomain::Point) {
        let mut dst = AttrData::filled(data.value(0), 0);
        for group in &groups {
            dst.push(merge_value(data, group));
        }
        point_arrays.insert(name.to_owned(), dst);
    }
    let mut attributes = AttributeStore::new();
    attributes.set_domain(AttrDomain::Point, point_arrays);
    attributes.set_domain(
        AttrDomain::Curve,
        src.attributes()
            .gather_domain(AttrDomain::Curve, &dst_to_src_curve, &[]),
    );

    debug!(
        threshold,
        points_before = src.point_count(),
        points_after = partition.point_count(),
        "merged points by distance"
    );
    Some(Drawing::from_parts(partition, attributes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawing(positions: Vec<Vec3>) -> Drawing {
        Drawing::new(CurvePartition::single(positions.len()), positions)
    }

    #[test]
    fn test_merges_close_points() {
        let src = drawing(vec![
            Vec3::ZERO,
            Vec3::new(0.001, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ]);
        let dst = merge_by_distance(&src, &IndexMask::all(3), 0.01).unwrap();
        assert_eq!(dst.point_count(), 2);
        assert!((dst.positions()[0].x - 0.0005).abs() < 1e-6);
    }

    #[test]
    fn test_distant_points_untouched() {
        let src = drawing(vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)]);
        assert!(merge_by_distance(&src, &IndexMask::all(2), 0.01).is_none());
    }

    #[test]
    fn test_unmasked_points_break_groups() {
        let src = drawing(vec![
            Vec3::ZERO,
            Vec3::new(0.001, 0.0, 0.0),
            Vec3::new(0.002, 0.0, 0.0),
        ]);
        // Middle point not in the mask; its neighbors cannot merge through it.
        let dst = merge_by_distance(&src, &IndexMask::from_indices(vec![0, 2]), 0.01);
        assert!(dst.is_none());
    }

    #[test]
    fn test_collapsed_curve_removed() {
        let src = {
            let mut d = Drawing::new(
                CurvePartition::from_counts(&[2, 2]),
                vec![
                    Vec3::ZERO,
                    Vec3::new(0.001, 0.0, 0.0),
                    Vec3::new(5.0, 0.0, 0.0),
                    Vec3::new(6.0, 0.0, 0.0),
                ],
            );
            d.radii_mut().copy_from_slice(&[0.1, 0.3, 0.1, 0.1]);
            d
        };
        let dst = merge_by_distance(&src, &IndexMask::all(4), 0.01).unwrap();
        // First curve collapses to one point and is dropped.
        assert_eq!(dst.curve_count(), 1);
        assert_eq!(dst.point_count(), 2);
        assert_eq!(dst.positions()[0], Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_threshold_monotonic() {
        let src = drawing(
            (0..6).map(|i| Vec3::new(i as f32 * 0.1, 0.0, 0.0)).collect(),
        );
        let coarse = merge_by_distance(&src, &IndexMask::all(6), 0.5)
            .map_or(6, |d| d.point_count());
        let fine = merge_by_distance(&src, &IndexMask::all(6), 0.05)
            .map_or(6, |d| d.point_count());
        assert!(coarse <= fine);
    }
}
