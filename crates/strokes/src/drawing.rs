//! A drawing: one curve partition plus its attribute store.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::attributes::{
    attr_default, AttrArray, AttrData, AttrDomain, AttrKind, AttributeStore, ATTR_CYCLIC,
    ATTR_END_CAP, ATTR_MATERIAL, ATTR_OPACITY, ATTR_POSITION, ATTR_RADIUS, ATTR_SELECTION,
    ATTR_START_CAP, DEFAULT_OPACITY, DEFAULT_RADIUS,
};
use crate::mask::IndexMask;
use crate::partition::CurvePartition;

/// Cap style at a stroke end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum CapStyle {
    #[default]
    Round = 0,
    Flat = 1,
}

impl CapStyle {
    pub fn from_i32(value: i32) -> Self {
        if value == CapStyle::Flat as i32 {
            Self::Flat
        } else {
            Self::Round
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Round => Self::Flat,
            Self::Flat => Self::Round,
        }
    }
}

/// One frame's worth of curve geometry for a layer.
///
/// Owns a [`CurvePartition`] and an [`AttributeStore`]; structural edit
/// algorithms consume the pair and produce a replacement, which the caller
/// swaps in via [`Drawing::replace`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    partition: CurvePartition,
    attributes: AttributeStore,
    #[serde(skip)]
    topology_changed: bool,
}

impl Drawing {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a drawing from a partition and matching point positions
    pub fn new(partition: CurvePartition, positions: Vec<Vec3>) -> Self {
        debug_assert_eq!(partition.point_count(), positions.len());
        let mut attributes = AttributeStore::new();
        attributes.insert(AttrDomain::Point, ATTR_POSITION, AttrData::Vec3(positions));
        Self {
            partition,
            attributes,
            topology_changed: false,
        }
    }

    /// Assemble from already-built parts (used by structural rewrites)
    pub fn from_parts(partition: CurvePartition, attributes: AttributeStore) -> Self {
        debug_assert!(
            attributes.lengths_match(partition.point_count(), partition.curve_count()),
            "attribute array lengths must match the partition"
        );
        Self {
            partition,
            attributes,
            topology_changed: false,
        }
    }

    pub fn point_count(&self) -> usize {
        self.partition.point_count()
    }

    pub fn curve_count(&self) -> usize {
        self.partition.curve_count()
    }

    pub fn partition(&self) -> &CurvePartition {
        &self.partition
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeStore {
        &mut self.attributes
    }

    /// Element count of one attribute domain
    pub fn domain_len(&self, domain: AttrDomain) -> usize {
        match domain {
            AttrDomain::Point => self.point_count(),
            AttrDomain::Curve => self.curve_count(),
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        match self.attributes.lookup(AttrDomain::Point, ATTR_POSITION) {
            Some(AttrData::Vec3(v)) => v,
            _ => &[],
        }
    }

    pub fn positions_mut(&mut self) -> &mut Vec<Vec3> {
        let len = self.point_count();
        self.attributes
            .vec3s_for_write(AttrDomain::Point, ATTR_POSITION, Vec3::ZERO, len)
    }

    pub fn radii(&self) -> AttrArray<'_, f32> {
        self.attributes
            .floats(AttrDomain::Point, ATTR_RADIUS, DEFAULT_RADIUS, self.point_count())
    }

    pub fn radii_mut(&mut self) -> &mut Vec<f32> {
        let len = self.point_count();
        self.attributes
            .floats_for_write(AttrDomain::Point, ATTR_RADIUS, DEFAULT_RADIUS, len)
    }

    pub fn opacities(&self) -> AttrArray<'_, f32> {
        self.attributes
            .floats(AttrDomain::Point, ATTR_OPACITY, DEFAULT_OPACITY, self.point_count())
    }

    pub fn opacities_mut(&mut self) -> &mut Vec<f32> {
        let len = self.point_count();
        self.attributes
            .floats_for_write(AttrDomain::Point, ATTR_OPACITY, DEFAULT_OPACITY, len)
    }

    pub fn cyclic(&self) -> AttrArray<'_, bool> {
        self.attributes
            .bools(AttrDomain::Curve, ATTR_CYCLIC, false, self.curve_count())
    }

    pub fn cyclic_mut(&mut self) -> &mut Vec<bool> {
        let len = self.curve_count();
        self.attributes
            .bools_for_write(AttrDomain::Curve, ATTR_CYCLIC, false, len)
    }

    pub fn material_indices(&self) -> AttrArray<'_, i32> {
        self.attributes
            .ints(AttrDomain::Curve, ATTR_MATERIAL, 0, self.curve_count())
    }

    pub fn material_indices_mut(&mut self) -> &mut Vec<i32> {
        let len = self.curve_count();
        self.attributes
            .ints_for_write(AttrDomain::Curve, ATTR_MATERIAL, 0, len)
    }

    /// Selection over one domain; all-true until materialized
    pub fn selection(&self, domain: AttrDomain) -> AttrArray<'_, bool> {
        self.attributes
            .bools(domain, ATTR_SELECTION, true, self.domain_len(domain))
    }

    pub fn selection_mut(&mut self, domain: AttrDomain) -> &mut Vec<bool> {
        let len = self.domain_len(domain);
        self.attributes
            .bools_for_write(domain, ATTR_SELECTION, true, len)
    }

    /// Mark that a structural rewrite replaced the partition
    pub fn tag_topology_changed(&mut self) {
        self.topology_changed = true;
    }

    pub fn topology_changed(&self) -> bool {
        self.topology_changed
    }

    pub fn clear_topology_changed(&mut self) {
        self.topology_changed = false;
    }

    /// Swap in the result of a structural rewrite and tag the change
    pub fn replace(&mut self, other: Drawing) {
        trace!(
            points = other.point_count(),
            curves = other.curve_count(),
            "replacing drawing geometry"
        );
        self.partition = other.partition;
        self.attributes = other.attributes;
        self.tag_topology_changed();
    }

    /// Reverse the point order of each masked curve in place, swapping cap
    /// styles so the visual ends keep their shapes.
    pub fn reverse_curves(&mut self, curves: &IndexMask) {
        let ranges: Vec<_> = curves.iter().map(|c| self.partition.points_of(c)).collect();
        let point_names: Vec<String> = self
            .attributes
            .names(AttrDomain::Point)
            .map(str::to_owned)
            .collect();
        // Only materialized arrays need reversing; virtual defaults are
        // uniform and stay as they are.
        for name in &point_names {
            if let Some(data) = self.attributes.lookup(AttrDomain::Point, name) {
                let mut data = data.clone();
                for range in &ranges {
                    data.reverse_range(range.clone());
                }
                self.attributes.insert(AttrDomain::Point, name, data);
            }
        }

        let has_start = self.attributes.contains(AttrDomain::Curve, ATTR_START_CAP);
        let has_end = self.attributes.contains(AttrDomain::Curve, ATTR_END_CAP);
        if has_start || has_end {
            let count = self.curve_count();
            let start = self
                .attributes
                .ints(AttrDomain::Curve, ATTR_START_CAP, CapStyle::Round as i32, count)
                .materialize();
            let end = self
                .attributes
                .ints(AttrDomain::Curve, ATTR_END_CAP, CapStyle::Round as i32, count)
                .materialize();
            let start_caps = self
                .attributes
                .ints_for_write(AttrDomain::Curve, ATTR_START_CAP, CapStyle::Round as i32, count);
            for &curve in curves.indices() {
                start_caps[curve] = end[curve];
            }
            let end_caps = self
                .attributes
                .ints_for_write(AttrDomain::Curve, ATTR_END_CAP, CapStyle::Round as i32, count);
            for &curve in curves.indices() {
                end_caps[curve] = start[curve];
            }
        }
    }

    /// Check the partition and attribute-length invariants
    pub fn validate(&self) -> Result<(), crate::partition::PartitionError> {
        self.partition.validate()?;
        debug_assert!(self
            .attributes
            .lengths_match(self.point_count(), self.curve_count()));
        Ok(())
    }
}

/// Gather a new drawing from `src` through explicit index maps.
///
/// `counts` are the destination per-curve point counts, `dst_to_src_point`
/// and `dst_to_src_curve` are the destination-to-source element maps, and
/// attributes named in `skip_curve` are left out of the curve-domain gather
/// (callers rebuild those directly, e.g. recomputed cyclic flags).
pub fn gather_curves(
    src: &Drawing,
    counts: &[usize],
    dst_to_src_point: &[usize],
    dst_to_src_curve: &[usize],
    skip_curve: &[&str],
) -> Drawing {
    debug_assert_eq!(counts.len(), dst_to_src_curve.len());
    let partition = CurvePartition::from_counts(counts);
    debug_assert_eq!(partition.point_count(), dst_to_src_point.len());

    let mut attributes = AttributeStore::new();
    attributes.set_domain(
        AttrDomain::Point,
        src.attributes().gather_domain(AttrDomain::Point, dst_to_src_point, &[]),
    );
    attributes.set_domain(
        AttrDomain::Curve,
        src.attributes().gather_domain(AttrDomain::Curve, dst_to_src_curve, skip_curve),
    );
    Drawing::from_parts(partition, attributes)
}

/// Concatenate drawings into one, unifying their attribute sets.
///
/// Attributes missing from a part are filled with that attribute's default
/// for the part's element range, so array lengths always match the joined
/// domain counts.
pub fn join_drawings(parts: &[Drawing]) -> Drawing {
    let mut counts = Vec::new();
    for part in parts {
        for curve in part.partition().curves_range() {
            counts.push(part.partition().size_of(curve));
        }
    }
    let partition = CurvePartition::from_counts(&counts);

    let mut attributes = AttributeStore::new();
    for domain in [AttrDomain::Point, AttrDomain::Curve] {
        let mut names: BTreeMap<String, AttrKind> = BTreeMap::new();
        for part in parts {
            for (name, data) in part.attributes().iter(domain) {
                names.entry(name.to_owned()).or_insert_with(|| data.kind());
            }
        }
        let mut arrays = BTreeMap::new();
        for (name, kind) in names {
            let default = attr_default(&name, kind);
            let mut joined = AttrData::filled(default, 0);
            for part in parts {
                match part.attributes().lookup(domain, &name) {
                    Some(data) if data.kind() == kind => joined.extend_from(data),
                    _ => joined.extend_fill(default, part.domain_len(domain)),
                }
            }
            arrays.insert(name, joined);
        }
        attributes.set_domain(domain, arrays);
    }

    Drawing::from_parts(partition, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_curve_drawing() -> Drawing {
        let partition = CurvePartition::from_counts(&[3, 2]);
        let positions = vec![
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        Drawing::new(partition, positions)
    }

    #[test]
    fn test_new_drawing() {
        let drawing = two_curve_drawing();
        assert_eq!(drawing.point_count(), 5);
        assert_eq!(drawing.curve_count(), 2);
        assert!(drawing.validate().is_ok());
        assert!(drawing.selection(AttrDomain::Point).is_single());
    }

    #[test]
    fn test_gather_curves() {
        let mut src = two_curve_drawing();
        src.radii_mut().copy_from_slice(&[0.1, 0.2, 0.3, 0.4, 0.5]);

        // Keep only the second curve.
        let dst = gather_curves(&src, &[2], &[3, 4], &[1], &[]);
        assert_eq!(dst.point_count(), 2);
        assert_eq!(dst.curve_count(), 1);
        assert_eq!(dst.radii().materialize(), vec![0.4, 0.5]);
        assert_eq!(dst.positions()[0], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_join_drawings_fills_defaults() {
        let mut a = two_curve_drawing();
        a.radii_mut().copy_from_slice(&[0.5; 5]);
        let b = Drawing::new(CurvePartition::single(2), vec![Vec3::ONE, Vec3::ONE]);

        let joined = join_drawings(&[a, b]);
        assert_eq!(joined.curve_count(), 3);
        assert_eq!(joined.point_count(), 7);
        let radii = joined.radii().materialize();
        assert_eq!(radii[..5], [0.5; 5]);
        assert_eq!(radii[5..], [DEFAULT_RADIUS; 2]);
        assert!(joined.validate().is_ok());
    }

    #[test]
    fn test_reverse_curves_swaps_caps() {
        let mut drawing = two_curve_drawing();
        let count = drawing.curve_count();
        drawing
            .attributes_mut()
            .ints_for_write(AttrDomain::Curve, ATTR_START_CAP, 0, count)
            .copy_from_slice(&[CapStyle::Flat as i32, CapStyle::Round as i32]);

        drawing.reverse_curves(&IndexMask::from_indices(vec![0]));
        assert_eq!(drawing.positions()[0], Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(drawing.positions()[2], Vec3::ZERO);
        // Second curve untouched.
        assert_eq!(drawing.positions()[3], Vec3::new(0.0, 1.0, 0.0));

        let start = drawing
            .attributes()
            .ints(AttrDomain::Curve, ATTR_START_CAP, 0, count)
            .materialize();
        let end = drawing
            .attributes()
            .ints(AttrDomain::Curve, ATTR_END_CAP, 0, count)
            .materialize();
        assert_eq!(start[0], CapStyle::Round as i32);
        assert_eq!(end[0], CapStyle::Flat as i32);
    }

    #[test]
    fn test_replace_tags_topology() {
        let mut drawing = two_curve_drawing();
        assert!(!drawing.topology_changed());
        drawing.replace(Drawing::empty());
        assert!(drawing.topology_changed());
        assert_eq!(drawing.point_count(), 0);
    }
}
