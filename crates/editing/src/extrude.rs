//! Extrude: grow new editable geometry out of the selected points.
//!
//! A selected endpoint of an open curve gains a co-located neighbor inside
//! the same curve. Every other selected point (interior points, and all
//! points of cyclic curves) spawns a detached 2-point curve sitting on the
//! source point, with one end selected for the follow-up transform.

use strokes::{AttrData, AttrDomain, AttributeStore, CurvePartition, Drawing, IndexMask, ATTR_CYCLIC, ATTR_SELECTION};
use tracing::debug;

/// Extrude the masked points. Returns `None` when the mask is empty.
pub fn extrude_points(src: &Drawing, points: &IndexMask) -> Option<Drawing> {
    if points.is_empty() {
        return None;
    }
    let selected = points.to_bools(src.point_count());
    let cyclic = src.cyclic();

    // Pass one: sizes and maps. Existing curves keep their points, plus one
    // inserted copy per extruded endpoint; spawned curves are appended after.
    let mut counts = Vec::with_capacity(src.curve_count());
    let mut dst_to_src_point = Vec::new();
    let mut dst_to_src_curve: Vec<usize> = src.partition().curves_range().collect();
    let mut new_point_selection = Vec::new();
    let mut spawned: Vec<(usize, usize)> = Vec::new();

    for curve in src.partition().curves_range() {
        let range = src.partition().points_of(curve);
        if range.is_empty() {
            counts.push(0);
            continue;
        }
        let is_cyclic = cyclic.get(curve);
        let first = range.start;
        let last = range.end - 1;
        let mut count = range.len();

        for point in range.clone() {
            let is_endpoint = !is_cyclic && (point == first || point == last);
            if selected[point] && is_endpoint && point == first {
                dst_to_src_point.push(point);
                new_point_selection.push(true);
                count += 1;
            }
            dst_to_src_point.push(point);
            new_point_selection.push(false);
            if selected[point] && is_endpoint && point == last && last != first {
                dst_to_src_point.push(point);
                new_point_selection.push(true);
                count += 1;
            }
            if selected[point] && !is_endpoint {
                spawned.push((curve, point));
            }
        }
        counts.push(count);
    }

    if spawned.is_empty() && dst_to_src_point.len() == src.point_count() {
        return None;
    }

    for &(curve, point) in &spawned {
        counts.push(2);
        dst_to_src_point.push(point);
        new_point_selection.push(false);
        dst_to_src_point.push(point);
        new_point_selection.push(true);
        dst_to_src_curve.push(curve);
    }

    // Pass two: gather through the maps, then rebuild selection and the
    // cyclic flags of the spawned curves.
    let partition = CurvePartition::from_counts(&counts);
    let mut attributes = AttributeStore::new();
    attributes.set_domain(
        AttrDomain::Point,
        src.attributes()
            .gather_domain(AttrDomain::Point, &dst_to_src_point, &[ATTR_SELECTION]),
    );
    attributes.set_domain(
        AttrDomain::Curve,
        src.attributes().gather_domain(
            AttrDomain::Curve,
            &dst_to_src_curve,
            &[ATTR_SELECTION, ATTR_CYCLIC],
        ),
    );
    attributes.insert(
        AttrDomain::Point,
        ATTR_SELECTION,
        AttrData::Bool(new_point_selection),
    );
    let mut dst_cyclic: Vec<bool> = (0..src.curve_count()).map(|c| cyclic.get(c)).collect();
    dst_cyclic.extend(std::iter::repeat_n(false, spawned.len()));
    if dst_cyclic.iter().any(|&c| c) {
        attributes.insert(AttrDomain::Curve, ATTR_CYCLIC, AttrData::Bool(dst_cyclic));
    }

    debug!(
        extruded = points.len(),
        spawned = spawned.len(),
        "extruded points"
    );
    Some(Drawing::from_parts(partition, attributes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{selected_points, write_selection};
    use glam::Vec3;

    fn open_curve(n: usize) -> Drawing {
        Drawing::new(
            CurvePartition::single(n),
            (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
        )
    }

    #[test]
    fn test_extrude_last_point() {
        let mut src = open_curve(3);
        write_selection(&mut src, AttrDomain::Point, &[false, false, true]);
        let dst = extrude_points(&src, &selected_points(&src)).unwrap();
        assert_eq!(dst.curve_count(), 1);
        assert_eq!(dst.point_count(), 4);
        assert_eq!(dst.positions()[3], src.positions()[2]);
        assert_eq!(selected_points(&dst).indices(), &[3]);
    }

    #[test]
    fn test_extrude_first_point_prepends() {
        let mut src = open_curve(3);
        write_selection(&mut src, AttrDomain::Point, &[true, false, false]);
        let dst = extrude_points(&src, &selected_points(&src)).unwrap();
        assert_eq!(dst.point_count(), 4);
        assert_eq!(dst.positions()[0], dst.positions()[1]);
        assert_eq!(selected_points(&dst).indices(), &[0]);
    }

    #[test]
    fn test_extrude_interior_spawns_curve() {
        let mut src = open_curve(3);
        write_selection(&mut src, AttrDomain::Point, &[false, true, false]);
        let dst = extrude_points(&src, &selected_points(&src)).unwrap();
        assert_eq!(dst.curve_count(), 2);
        assert_eq!(dst.point_count(), 5);
        assert_eq!(dst.positions()[3], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(dst.positions()[4], Vec3::new(1.0, 0.0, 0.0));
        // Second copy selected, first stays put.
        assert_eq!(selected_points(&dst).indices(), &[4]);
        assert!(!dst.cyclic().get(1));
    }

    #[test]
    fn test_extrude_cyclic_endpoint_spawns_curve() {
        let mut src = open_curve(4);
        src.cyclic_mut()[0] = true;
        write_selection(&mut src, AttrDomain::Point, &[true, false, false, false]);
        let dst = extrude_points(&src, &selected_points(&src)).unwrap();
        // Cyclic curves have no true endpoints; the extrusion detaches.
        assert_eq!(dst.curve_count(), 2);
        assert_eq!(dst.partition().size_of(0), 4);
        assert!(dst.cyclic().get(0));
        assert!(!dst.cyclic().get(1));
    }

    #[test]
    fn test_extrude_empty_mask_noop() {
        let src = open_curve(3);
        assert!(extrude_points(&src, &IndexMask::empty()).is_none());
    }
}
