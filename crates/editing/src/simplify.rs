//! Ramer-Douglas-Peucker stroke simplification.
//!
//! Runs over maximal selected point runs inside each selected curve;
//! unselected points are never deletion candidates. The distance function is
//! swappable so simplification can preserve radius fidelity as well as shape.

use glam::Vec3;
use rayon::prelude::*;
use strokes::{find_all_ranges, AttrArray, Drawing, IndexMask};
use tracing::debug;

use crate::delete::remove_points;
use crate::selection::point_selection_within;

/// Deviation of `candidate` from the chord `first`..`last`, by absolute
/// point index
pub trait SimplifyDistance: Sync {
    fn dist(&self, first: usize, last: usize, candidate: usize) -> f32;
}

/// Perpendicular distance from the candidate position to the chord segment
pub struct PositionDistance<'a> {
    pub positions: &'a [Vec3],
}

impl SimplifyDistance for PositionDistance<'_> {
    fn dist(&self, first: usize, last: usize, candidate: usize) -> f32 {
        dist_to_segment(
            self.positions[candidate],
            self.positions[first],
            self.positions[last],
        )
    }
}

/// Position deviation combined with how far the candidate's radius strays
/// from linear interpolation between the chord endpoints' radii. Points are
/// only dropped when the straight segment approximates both.
pub struct PositionRadiusDistance<'a> {
    pub positions: &'a [Vec3],
    pub radii: &'a [f32],
}

impl SimplifyDistance for PositionRadiusDistance<'_> {
    fn dist(&self, first: usize, last: usize, candidate: usize) -> f32 {
        let position_dist = dist_to_segment(
            self.positions[candidate],
            self.positions[first],
            self.positions[last],
        );
        let t = segment_parameter(
            self.positions[candidate],
            self.positions[first],
            self.positions[last],
        );
        let interpolated = self.radii[first] + (self.radii[last] - self.radii[first]) * t;
        position_dist.max((self.radii[candidate] - interpolated).abs())
    }
}

fn dist_to_segment(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Normalized projection parameter of `p` onto the segment `a`..`b`
fn segment_parameter(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return 0.0;
    }
    ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
}

/// Mark the interior points of `first..=last` that the chord approximates
/// within `epsilon`. Endpoints are always kept. `marks` covers the run with
/// `marks[0]` corresponding to `first`; entries are set true for deletion.
fn mark_rdp(
    first: usize,
    last: usize,
    epsilon: f32,
    dist: &dyn SimplifyDistance,
    marks: &mut [bool],
    base: usize,
) {
    if last <= first + 1 {
        return;
    }
    for i in (first + 1)..last {
        marks[i - base] = true;
    }
    let mut stack = vec![(first, last)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let mut max_dist = -1.0;
        let mut max_index = lo;
        for candidate in (lo + 1)..hi {
            let d = dist.dist(lo, hi, candidate);
            if d > max_dist {
                max_dist = d;
                max_index = candidate;
            }
        }
        if max_dist > epsilon {
            marks[max_index - base] = false;
            stack.push((lo, max_index));
            stack.push((max_index, hi));
        }
    }
}

/// Mark points of the drawing for deletion, RDP-simplifying each maximal
/// selected run of each curve in `curves`. Returns the per-point deletion
/// flags and the marked count.
pub fn simplify_marks(
    drawing: &Drawing,
    curves: &IndexMask,
    epsilon: f32,
    dist: &dyn SimplifyDistance,
) -> (Vec<bool>, usize) {
    let selected = point_selection_within(drawing, curves);
    let cyclic = drawing.cyclic();

    struct Run {
        start: usize,
        end: usize,
        close_wrap: Option<(usize, usize, usize)>,
    }

    let mut runs = Vec::new();
    for curve in curves.iter() {
        let points = drawing.partition().points_of(curve);
        if points.len() <= 2 {
            continue;
        }
        for run in find_all_ranges(&selected[points.clone()], true) {
            runs.push(Run {
                start: points.start + run.start,
                end: points.start + run.end,
                close_wrap: None,
            });
        }
        // A cyclic curve selected across the wrap also tests its last point
        // against the chord from the second-to-last point to the first.
        let first = points.start;
        let last = points.end - 1;
        if cyclic.get(curve) && selected[first] && selected[last] {
            runs.push(Run {
                start: last,
                end: last,
                close_wrap: Some((last - 1, first, last)),
            });
        }
    }

    let marked: Vec<(usize, Vec<bool>)> = runs
        .par_iter()
        .map(|run| {
            if let Some((chord_first, chord_last, candidate)) = run.close_wrap {
                let delete = dist.dist(chord_first, chord_last, candidate) <= epsilon;
                return (run.start, vec![delete]);
            }
            let mut local = vec![false; run.end - run.start];
            mark_rdp(run.start, run.end - 1, epsilon, dist, &mut local, run.start);
            (run.start, local)
        })
        .collect();

    let mut marks = vec![false; drawing.point_count()];
    let mut total = 0;
    for (start, local) in marked {
        for (offset, &delete) in local.iter().enumerate() {
            if delete && !marks[start + offset] {
                marks[start + offset] = true;
                total += 1;
            }
        }
    }
    (marks, total)
}

/// Simplify the selected runs of `curves` and excise the marked points.
/// Returns `None` when nothing fell under tolerance.
pub fn simplify_drawing(drawing: &Drawing, curves: &IndexMask, epsilon: f32) -> Option<Drawing> {
    let positions = drawing.positions();
    let radii = drawing.radii();

    let (marks, total) = match radii {
        AttrArray::Span(radii) => simplify_marks(
            drawing,
            curves,
            epsilon,
            &PositionRadiusDistance { positions, radii },
        ),
        AttrArray::Single(..) => {
            simplify_marks(drawing, curves, epsilon, &PositionDistance { positions })
        }
    };
    if total == 0 {
        return None;
    }
    debug!(marked = total, epsilon, "simplify removing points");
    Some(remove_points(drawing, &IndexMask::from_bools(&marks)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strokes::CurvePartition;

    fn zigzag(n: usize, amplitude: f32) -> Drawing {
        let positions = (0..n)
            .map(|i| {
                let y = if i % 2 == 0 { 0.0 } else { amplitude };
                Vec3::new(i as f32, y, 0.0)
            })
            .collect();
        Drawing::new(CurvePartition::single(n), positions)
    }

    #[test]
    fn test_collinear_points_removed() {
        let drawing = Drawing::new(
            CurvePartition::single(5),
            (0..5).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
        );
        let curves = IndexMask::all(1);
        let simplified = simplify_drawing(&drawing, &curves, 0.01).unwrap();
        assert_eq!(simplified.point_count(), 2);
        assert_eq!(simplified.positions()[1], Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_zigzag_above_tolerance_survives() {
        let drawing = zigzag(7, 1.0);
        let curves = IndexMask::all(1);
        assert!(simplify_drawing(&drawing, &curves, 0.1).is_none());
    }

    #[test]
    fn test_idempotent() {
        let drawing = zigzag(9, 0.05);
        let curves = IndexMask::all(1);
        let once = simplify_drawing(&drawing, &curves, 0.2).unwrap();
        assert!(simplify_drawing(&once, &IndexMask::all(once.curve_count()), 0.2).is_none());
    }

    #[test]
    fn test_tolerance_monotonic() {
        let drawing = zigzag(15, 0.3);
        let curves = IndexMask::all(1);
        let coarse = simplify_drawing(&drawing, &curves, 1.0)
            .map(|d| d.point_count())
            .unwrap_or(drawing.point_count());
        let fine = simplify_drawing(&drawing, &curves, 0.1)
            .map(|d| d.point_count())
            .unwrap_or(drawing.point_count());
        assert!(coarse <= fine);
    }

    #[test]
    fn test_unselected_points_protected() {
        use crate::selection::write_selection;
        use strokes::AttrDomain;

        let mut drawing = Drawing::new(
            CurvePartition::single(6),
            (0..6).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
        );
        // Only the first half is a candidate run.
        write_selection(
            &mut drawing,
            AttrDomain::Point,
            &[true, true, true, false, false, false],
        );
        let simplified = simplify_drawing(&drawing, &IndexMask::all(1), 0.01).unwrap();
        // Point 1 deleted; unselected 3 and 4 survive despite collinearity.
        assert_eq!(simplified.point_count(), 5);
    }

    #[test]
    fn test_cyclic_wrap_candidate() {
        // Square with a redundant point on the closing edge between the last
        // and first corners.
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
        ];
        let mut drawing = Drawing::new(CurvePartition::single(5), positions);
        drawing.cyclic_mut()[0] = true;
        let simplified = simplify_drawing(&drawing, &IndexMask::all(1), 0.01).unwrap();
        assert_eq!(simplified.point_count(), 4);
        assert!(simplified.cyclic().get(0));
    }
}
