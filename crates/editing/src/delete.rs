//! Point and curve removal: the split-aware and gap-closing variants.
//!
//! Both removal paths follow the two-pass build discipline: walk the source
//! once to compute destination counts and dst-to-src maps, then gather every
//! attribute array through those maps in one pass.

use strokes::{
    find_all_ranges, gather_curves, AttrData, AttrDomain, Drawing, IndexMask, ATTR_CYCLIC,
};
use tracing::debug;

/// Drop whole curves. Points of removed curves go with them.
pub fn remove_curves(src: &Drawing, curves_to_delete: &IndexMask) -> Drawing {
    let kept = curves_to_delete.complement(src.curve_count());
    let mut counts = Vec::with_capacity(kept.len());
    let mut dst_to_src_point = Vec::new();
    let mut dst_to_src_curve = Vec::with_capacity(kept.len());
    for curve in kept.iter() {
        let points = src.partition().points_of(curve);
        counts.push(points.len());
        dst_to_src_point.extend(points);
        dst_to_src_curve.push(curve);
    }
    gather_curves(src, &counts, &dst_to_src_point, &dst_to_src_curve, &[])
}

/// Remove points and split the curves they leave behind.
///
/// Each curve decomposes into its maximal runs of kept points; every run
/// becomes one destination curve. A cyclic curve whose first and last points
/// are both kept joins the wrap-around runs into a single curve. The cyclic
/// flag of the output is recomputed: only a completely untouched cyclic
/// curve stays cyclic.
pub fn remove_points_and_split(src: &Drawing, points_to_delete: &IndexMask) -> Drawing {
    let deleted = points_to_delete.to_bools(src.point_count());
    let cyclic = src.cyclic();

    let mut counts = Vec::new();
    let mut dst_to_src_point = Vec::with_capacity(src.point_count() - points_to_delete.len());
    let mut dst_to_src_curve = Vec::new();
    let mut dst_cyclic = Vec::new();

    for curve in src.partition().curves_range() {
        let points = src.partition().points_of(curve);
        let mut runs = find_all_ranges(&deleted[points.clone()], false);
        if runs.is_empty() {
            continue;
        }

        let covers_all = runs.len() == 1 && runs[0].len() == points.len();
        let wraps = cyclic.get(curve)
            && runs.len() > 1
            && runs[0].start == 0
            && runs[runs.len() - 1].end == points.len();

        if wraps {
            // The run ending at the curve's last point continues through the
            // wrap into the run starting at the first point. Emit them as one
            // curve, tail first.
            let head = runs.remove(0);
            let tail = runs.pop().unwrap_or(0..0);
            counts.push(tail.len() + head.len());
            dst_to_src_point.extend(tail.map(|i| points.start + i));
            dst_to_src_point.extend(head.map(|i| points.start + i));
            dst_to_src_curve.push(curve);
            dst_cyclic.push(false);
        }
        for run in runs {
            counts.push(run.len());
            dst_to_src_point.extend(run.map(|i| points.start + i));
            dst_to_src_curve.push(curve);
            dst_cyclic.push(cyclic.get(curve) && covers_all);
        }
    }

    debug!(
        removed = points_to_delete.len(),
        curves_before = src.curve_count(),
        curves_after = counts.len(),
        "removed points with split"
    );

    let mut dst = gather_curves(
        src,
        &counts,
        &dst_to_src_point,
        &dst_to_src_curve,
        &[ATTR_CYCLIC],
    );
    if dst_cyclic.iter().any(|&c| c) {
        dst.attributes_mut()
            .insert(AttrDomain::Curve, ATTR_CYCLIC, AttrData::Bool(dst_cyclic));
    }
    dst
}

/// Remove points without splitting: each curve is shortened around the gaps
/// and keeps its identity and cyclic flag. Curves left with zero points
/// vanish.
pub fn remove_points(src: &Drawing, points_to_delete: &IndexMask) -> Drawing {
    let deleted = points_to_delete.to_bools(src.point_count());

    let mut counts = Vec::new();
    let mut dst_to_src_point = Vec::with_capacity(src.point_count() - points_to_delete.len());
    let mut dst_to_src_curve = Vec::new();

    for curve in src.partition().curves_range() {
        let points = src.partition().points_of(curve);
        let kept: Vec<usize> = points.filter(|&p| !deleted[p]).collect();
        if kept.is_empty() {
            continue;
        }
        counts.push(kept.len());
        dst_to_src_point.extend(kept);
        dst_to_src_curve.push(curve);
    }

    gather_curves(src, &counts, &dst_to_src_point, &dst_to_src_curve, &[])
}
