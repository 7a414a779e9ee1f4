//! Duplicate: append a copy of the selected elements as new curves.
//!
//! Originals are kept but deselected; the duplicates come out selected so a
//! follow-up transform moves the copy, not the source.

use strokes::{
    find_all_ranges, gather_curves, AttrData, AttrDomain, Drawing, IndexMask, ATTR_CYCLIC,
    ATTR_SELECTION,
};
use tracing::debug;

/// Append a full copy of the selected curves
pub fn duplicate_curves(src: &Drawing, curves: &IndexMask) -> Drawing {
    let mut counts = Vec::with_capacity(src.curve_count() + curves.len());
    let mut dst_to_src_point = Vec::new();
    let mut dst_to_src_curve = Vec::new();
    for curve in src.partition().curves_range() {
        counts.push(src.partition().size_of(curve));
        dst_to_src_point.extend(src.partition().points_of(curve));
        dst_to_src_curve.push(curve);
    }
    for curve in curves.iter() {
        counts.push(src.partition().size_of(curve));
        dst_to_src_point.extend(src.partition().points_of(curve));
        dst_to_src_curve.push(curve);
    }

    let mut dst = gather_curves(
        src,
        &counts,
        &dst_to_src_point,
        &dst_to_src_curve,
        &[ATTR_SELECTION],
    );
    let mut curve_selection = vec![false; dst.curve_count()];
    for i in src.curve_count()..dst.curve_count() {
        curve_selection[i] = true;
    }
    let mut point_selection = vec![false; dst.point_count()];
    for i in src.point_count()..dst.point_count() {
        point_selection[i] = true;
    }
    dst.attributes_mut()
        .insert(AttrDomain::Curve, ATTR_SELECTION, AttrData::Bool(curve_selection));
    dst.attributes_mut()
        .insert(AttrDomain::Point, ATTR_SELECTION, AttrData::Bool(point_selection));
    debug!(duplicated = curves.len(), "duplicated curves");
    dst
}

/// Append one new curve per maximal run of selected points. The new curves
/// are never cyclic.
pub fn duplicate_points(src: &Drawing, points: &IndexMask) -> Drawing {
    let selected = points.to_bools(src.point_count());

    let mut counts = Vec::with_capacity(src.curve_count());
    let mut dst_to_src_point = Vec::new();
    let mut dst_to_src_curve = Vec::new();
    let mut appended_curves = 0;
    for curve in src.partition().curves_range() {
        counts.push(src.partition().size_of(curve));
        dst_to_src_point.extend(src.partition().points_of(curve));
        dst_to_src_curve.push(curve);
    }
    let cyclic = src.cyclic();
    for curve in src.partition().curves_range() {
        let range = src.partition().points_of(curve);
        for run in find_all_ranges(&selected[range.clone()], true) {
            counts.push(run.len());
            dst_to_src_point.extend(run.map(|i| range.start + i));
            dst_to_src_curve.push(curve);
            appended_curves += 1;
        }
    }

    let mut dst = gather_curves(
        src,
        &counts,
        &dst_to_src_point,
        &dst_to_src_curve,
        &[ATTR_SELECTION, ATTR_CYCLIC],
    );

    let mut dst_cyclic: Vec<bool> = (0..src.curve_count()).map(|c| cyclic.get(c)).collect();
    dst_cyclic.extend(vec![false; appended_curves]);
    if dst_cyclic.iter().any(|&c| c) {
        dst.attributes_mut()
            .insert(AttrDomain::Curve, ATTR_CYCLIC, AttrData::Bool(dst_cyclic));
    }

    let mut point_selection = vec![false; dst.point_count()];
    for i in src.point_count()..dst.point_count() {
        point_selection[i] = true;
    }
    dst.attributes_mut()
        .insert(AttrDomain::Point, ATTR_SELECTION, AttrData::Bool(point_selection));
    dst.attributes_mut().remove(AttrDomain::Curve, ATTR_SELECTION);
    debug!(appended_curves, "duplicated point runs");
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{selected_curves, selected_points, write_selection};
    use glam::Vec3;
    use strokes::CurvePartition;

    fn drawing() -> Drawing {
        Drawing::new(
            CurvePartition::from_counts(&[3, 2]),
            (0..5).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
        )
    }

    #[test]
    fn test_duplicate_curves_appends() {
        let src = drawing();
        let dst = duplicate_curves(&src, &IndexMask::from_indices(vec![1]));
        assert_eq!(dst.curve_count(), 3);
        assert_eq!(dst.point_count(), 7);
        assert_eq!(dst.positions()[5], src.positions()[3]);
        // Only the copy is selected.
        assert_eq!(selected_curves(&dst).indices(), &[2]);
        assert_eq!(selected_points(&dst).indices(), &[5, 6]);
    }

    #[test]
    fn test_duplicate_point_run_becomes_curve() {
        let mut src = drawing();
        write_selection(
            &mut src,
            AttrDomain::Point,
            &[false, true, true, false, false],
        );
        let dst = duplicate_points(&src, &selected_points(&src));
        assert_eq!(dst.curve_count(), 3);
        assert_eq!(dst.point_count(), 7);
        assert_eq!(dst.positions()[5], Vec3::new(1.0, 0.0, 0.0));
        assert!(!dst.cyclic().get(2));
        assert_eq!(selected_points(&dst).indices(), &[5, 6]);
    }

    #[test]
    fn test_duplicate_points_two_runs() {
        let mut src = Drawing::new(
            CurvePartition::single(5),
            (0..5).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
        );
        write_selection(
            &mut src,
            AttrDomain::Point,
            &[true, false, true, true, false],
        );
        let dst = duplicate_points(&src, &selected_points(&src));
        assert_eq!(dst.curve_count(), 3);
        assert_eq!(dst.partition().offsets(), &[0, 5, 6, 8]);
    }
}
