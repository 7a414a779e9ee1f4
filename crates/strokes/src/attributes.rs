//! Per-domain named attribute arrays with default fill and gather support.
//!
//! Attributes are stored as a closed set of primitive array types rather
//! than trait objects, so structural rewrites can gather every array through
//! one generic dst-to-src index map without dynamic dispatch.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Point position, always present on a drawing
pub const ATTR_POSITION: &str = "position";
/// Per-point radius (half the stroke thickness)
pub const ATTR_RADIUS: &str = "radius";
/// Per-point opacity
pub const ATTR_OPACITY: &str = "opacity";
/// Per-curve material slot index
pub const ATTR_MATERIAL: &str = "material_index";
/// Per-curve closed-loop flag
pub const ATTR_CYCLIC: &str = "cyclic";
/// Per-curve start cap style
pub const ATTR_START_CAP: &str = "start_cap";
/// Per-curve end cap style
pub const ATTR_END_CAP: &str = "end_cap";
/// Boolean selection state; treated as all-true until materialized
pub const ATTR_SELECTION: &str = ".selection";

/// Default point radius when the attribute is absent
pub const DEFAULT_RADIUS: f32 = 0.01;
/// Default point opacity when the attribute is absent
pub const DEFAULT_OPACITY: f32 = 1.0;

/// Which element count an attribute array is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrDomain {
    Point,
    Curve,
}

/// Element type of an attribute array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrKind {
    Bool,
    Int,
    Float,
    Vec3,
}

/// A single attribute element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3(Vec3),
}

impl AttrValue {
    pub fn kind(&self) -> AttrKind {
        match self {
            Self::Bool(_) => AttrKind::Bool,
            Self::Int(_) => AttrKind::Int,
            Self::Float(_) => AttrKind::Float,
            Self::Vec3(_) => AttrKind::Vec3,
        }
    }
}

/// The default element for an attribute, by well-known name.
///
/// Selection defaults to true (everything selected until a selection is
/// materialized); opacity defaults to fully opaque; radius to the stock
/// stroke radius. Everything else zero-fills.
pub fn attr_default(name: &str, kind: AttrKind) -> AttrValue {
    match (name, kind) {
        (ATTR_SELECTION, AttrKind::Bool) => AttrValue::Bool(true),
        (ATTR_OPACITY, AttrKind::Float) => AttrValue::Float(DEFAULT_OPACITY),
        (ATTR_RADIUS, AttrKind::Float) => AttrValue::Float(DEFAULT_RADIUS),
        (_, AttrKind::Bool) => AttrValue::Bool(false),
        (_, AttrKind::Int) => AttrValue::Int(0),
        (_, AttrKind::Float) => AttrValue::Float(0.0),
        (_, AttrKind::Vec3) => AttrValue::Vec3(Vec3::ZERO),
    }
}

/// One attribute array, tagged by element type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrData {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Vec3(Vec<Vec3>),
}

impl AttrData {
    pub fn kind(&self) -> AttrKind {
        match self {
            Self::Bool(_) => AttrKind::Bool,
            Self::Int(_) => AttrKind::Int,
            Self::Float(_) => AttrKind::Float,
            Self::Vec3(_) => AttrKind::Vec3,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Vec3(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An array of `len` copies of `value`
    pub fn filled(value: AttrValue, len: usize) -> Self {
        match value {
            AttrValue::Bool(v) => Self::Bool(vec![v; len]),
            AttrValue::Int(v) => Self::Int(vec![v; len]),
            AttrValue::Float(v) => Self::Float(vec![v; len]),
            AttrValue::Vec3(v) => Self::Vec3(vec![v; len]),
        }
    }

    pub fn value(&self, index: usize) -> AttrValue {
        match self {
            Self::Bool(v) => AttrValue::Bool(v[index]),
            Self::Int(v) => AttrValue::Int(v[index]),
            Self::Float(v) => AttrValue::Float(v[index]),
            Self::Vec3(v) => AttrValue::Vec3(v[index]),
        }
    }

    pub fn push(&mut self, value: AttrValue) {
        match (self, value) {
            (Self::Bool(v), AttrValue::Bool(x)) => v.push(x),
            (Self::Int(v), AttrValue::Int(x)) => v.push(x),
            (Self::Float(v), AttrValue::Float(x)) => v.push(x),
            (Self::Vec3(v), AttrValue::Vec3(x)) => v.push(x),
            _ => debug_assert!(false, "attribute value kind mismatch"),
        }
    }

    /// Gather through an explicit dst-to-src index map, producing an array of
    /// `dst_to_src.len()` elements.
    pub fn gather(&self, dst_to_src: &[usize]) -> Self {
        match self {
            Self::Bool(v) => Self::Bool(dst_to_src.iter().map(|&i| v[i]).collect()),
            Self::Int(v) => Self::Int(dst_to_src.iter().map(|&i| v[i]).collect()),
            Self::Float(v) => Self::Float(dst_to_src.iter().map(|&i| v[i]).collect()),
            Self::Vec3(v) => Self::Vec3(dst_to_src.iter().map(|&i| v[i]).collect()),
        }
    }

    /// Interpolate between elements `a` and `b` at parameter `t` in `[0, 1]`.
    ///
    /// Floats and vectors interpolate linearly. Booleans take the logical AND
    /// of the endpoints, integers snap to the nearer endpoint.
    pub fn lerp(&self, a: usize, b: usize, t: f32) -> AttrValue {
        match self {
            Self::Bool(v) => AttrValue::Bool(v[a] && v[b]),
            Self::Int(v) => AttrValue::Int(if t < 0.5 { v[a] } else { v[b] }),
            Self::Float(v) => AttrValue::Float(v[a] + (v[b] - v[a]) * t),
            Self::Vec3(v) => AttrValue::Vec3(v[a].lerp(v[b], t)),
        }
    }

    /// Append all elements of `other`, which must have the same kind
    pub fn extend_from(&mut self, other: &Self) {
        match (self, other) {
            (Self::Bool(v), Self::Bool(o)) => v.extend_from_slice(o),
            (Self::Int(v), Self::Int(o)) => v.extend_from_slice(o),
            (Self::Float(v), Self::Float(o)) => v.extend_from_slice(o),
            (Self::Vec3(v), Self::Vec3(o)) => v.extend_from_slice(o),
            _ => debug_assert!(false, "attribute kind mismatch"),
        }
    }

    /// Append `count` copies of `value`
    pub fn extend_fill(&mut self, value: AttrValue, count: usize) {
        match (self, value) {
            (Self::Bool(v), AttrValue::Bool(x)) => v.extend(std::iter::repeat_n(x, count)),
            (Self::Int(v), AttrValue::Int(x)) => v.extend(std::iter::repeat_n(x, count)),
            (Self::Float(v), AttrValue::Float(x)) => v.extend(std::iter::repeat_n(x, count)),
            (Self::Vec3(v), AttrValue::Vec3(x)) => v.extend(std::iter::repeat_n(x, count)),
            _ => debug_assert!(false, "attribute kind mismatch"),
        }
    }

    /// Reverse the elements inside `range` in place
    pub fn reverse_range(&mut self, range: std::ops::Range<usize>) {
        match self {
            Self::Bool(v) => v[range].reverse(),
            Self::Int(v) => v[range].reverse(),
            Self::Float(v) => v[range].reverse(),
            Self::Vec3(v) => v[range].reverse(),
        }
    }
}

/// A possibly-virtual read view over an attribute: either a dense span or a
/// single repeated default that was never materialized.
#[derive(Debug, Clone, Copy)]
pub enum AttrArray<'a, T: Copy> {
    Single(T, usize),
    Span(&'a [T]),
}

impl<'a, T: Copy> AttrArray<'a, T> {
    pub fn get(&self, index: usize) -> T {
        match self {
            Self::Single(value, _) => *value,
            Self::Span(span) => span[index],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_, len) => *len,
            Self::Span(span) => span.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Self::Single(..))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn materialize(&self) -> Vec<T> {
        self.iter().collect()
    }
}

/// Named attribute arrays for the point and curve domains.
///
/// Invariant: after any structural rewrite, every array's length equals its
/// domain's element count. The store itself does not know the counts; the
/// owning [`crate::Drawing`](crate::drawing::Drawing) enforces this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeStore {
    point: BTreeMap<String, AttrData>,
    curve: BTreeMap<String, AttrData>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, domain: AttrDomain) -> &BTreeMap<String, AttrData> {
        match domain {
            AttrDomain::Point => &self.point,
            AttrDomain::Curve => &self.curve,
        }
    }

    fn map_mut(&mut self, domain: AttrDomain) -> &mut BTreeMap<String, AttrData> {
        match domain {
            AttrDomain::Point => &mut self.point,
            AttrDomain::Curve => &mut self.curve,
        }
    }

    pub fn contains(&self, domain: AttrDomain, name: &str) -> bool {
        self.map(domain).contains_key(name)
    }

    pub fn lookup(&self, domain: AttrDomain, name: &str) -> Option<&AttrData> {
        self.map(domain).get(name)
    }

    pub fn insert(&mut self, domain: AttrDomain, name: &str, data: AttrData) {
        self.map_mut(domain).insert(name.to_owned(), data);
    }

    pub fn remove(&mut self, domain: AttrDomain, name: &str) -> bool {
        self.map_mut(domain).remove(name).is_some()
    }

    /// Attribute names in one domain, in sorted order
    pub fn names(&self, domain: AttrDomain) -> impl Iterator<Item = &str> {
        self.map(domain).keys().map(String::as_str)
    }

    pub fn iter(&self, domain: AttrDomain) -> impl Iterator<Item = (&str, &AttrData)> {
        self.map(domain).iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Typed read with a virtual default when the array was never written.
    /// `len` is the current element count of the domain.
    pub fn bools(&self, domain: AttrDomain, name: &str, default: bool, len: usize) -> AttrArray<'_, bool> {
        match self.lookup(domain, name) {
            Some(AttrData::Bool(v)) => AttrArray::Span(v),
            _ => AttrArray::Single(default, len),
        }
    }

    pub fn ints(&self, domain: AttrDomain, name: &str, default: i32, len: usize) -> AttrArray<'_, i32> {
        match self.lookup(domain, name) {
            Some(AttrData::Int(v)) => AttrArray::Span(v),
            _ => AttrArray::Single(default, len),
        }
    }

    pub fn floats(&self, domain: AttrDomain, name: &str, default: f32, len: usize) -> AttrArray<'_, f32> {
        match self.lookup(domain, name) {
            Some(AttrData::Float(v)) => AttrArray::Span(v),
            _ => AttrArray::Single(default, len),
        }
    }

    pub fn vec3s(&self, domain: AttrDomain, name: &str, default: Vec3, len: usize) -> AttrArray<'_, Vec3> {
        match self.lookup(domain, name) {
            Some(AttrData::Vec3(v)) => AttrArray::Span(v),
            _ => AttrArray::Single(default, len),
        }
    }

    /// Get a dense mutable array, densifying from the default on first write.
    /// If an array exists under this name with a different element type it is
    /// replaced by the default fill.
    pub fn bools_for_write(&mut self, domain: AttrDomain, name: &str, default: bool, len: usize) -> &mut Vec<bool> {
        let entry = self
            .map_mut(domain)
            .entry(name.to_owned())
            .or_insert_with(|| AttrData::Bool(vec![default; len]));
        if !matches!(entry, AttrData::Bool(_)) {
            *entry = AttrData::Bool(vec![default; len]);
        }
        match entry {
            AttrData::Bool(v) => v,
            _ => unreachable!(),
        }
    }

    pub fn ints_for_write(&mut self, domain: AttrDomain, name: &str, default: i32, len: usize) -> &mut Vec<i32> {
        let entry = self
            .map_mut(domain)
            .entry(name.to_owned())
            .or_insert_with(|| AttrData::Int(vec![default; len]));
        if !matches!(entry, AttrData::Int(_)) {
            *entry = AttrData::Int(vec![default; len]);
        }
        match entry {
            AttrData::Int(v) => v,
            _ => unreachable!(),
        }
    }

    pub fn floats_for_write(&mut self, domain: AttrDomain, name: &str, default: f32, len: usize) -> &mut Vec<f32> {
        let entry = self
            .map_mut(domain)
            .entry(name.to_owned())
            .or_insert_with(|| AttrData::Float(vec![default; len]));
        if !matches!(entry, AttrData::Float(_)) {
            *entry = AttrData::Float(vec![default; len]);
        }
        match entry {
            AttrData::Float(v) => v,
            _ => unreachable!(),
        }
    }

    pub fn vec3s_for_write(&mut self, domain: AttrDomain, name: &str, default: Vec3, len: usize) -> &mut Vec<Vec3> {
        let entry = self
            .map_mut(domain)
            .entry(name.to_owned())
            .or_insert_with(|| AttrData::Vec3(vec![default; len]));
        if !matches!(entry, AttrData::Vec3(_)) {
            *entry = AttrData::Vec3(vec![default; len]);
        }
        match entry {
            AttrData::Vec3(v) => v,
            _ => unreachable!(),
        }
    }

    /// Gather every attribute of `domain` through the dst-to-src map,
    /// skipping the named attributes (callers rebuild those directly).
    pub fn gather_domain(
        &self,
        domain: AttrDomain,
        dst_to_src: &[usize],
        skip: &[&str],
    ) -> BTreeMap<String, AttrData> {
        self.map(domain)
            .iter()
            .filter(|(name, _)| !skip.contains(&name.as_str()))
            .map(|(name, data)| (name.clone(), data.gather(dst_to_src)))
            .collect()
    }

    /// Replace one domain's arrays wholesale
    pub fn set_domain(&mut self, domain: AttrDomain, arrays: BTreeMap<String, AttrData>) {
        *self.map_mut(domain) = arrays;
    }

    /// True when every array length matches its domain count
    pub fn lengths_match(&self, point_count: usize, curve_count: usize) -> bool {
        self.point.values().all(|d| d.len() == point_count)
            && self.curve.values().all(|d| d.len() == curve_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_default_until_written() {
        let mut store = AttributeStore::new();
        let selection = store.bools(AttrDomain::Point, ATTR_SELECTION, true, 4);
        assert!(selection.is_single());
        assert_eq!(selection.len(), 4);
        assert!(selection.get(3));

        store.bools_for_write(AttrDomain::Point, ATTR_SELECTION, true, 4)[2] = false;
        let selection = store.bools(AttrDomain::Point, ATTR_SELECTION, true, 4);
        assert!(!selection.is_single());
        assert!(!selection.get(2));
        assert!(selection.get(0));
    }

    #[test]
    fn test_gather() {
        let data = AttrData::Float(vec![1.0, 2.0, 3.0, 4.0]);
        let gathered = data.gather(&[3, 0, 0]);
        assert_eq!(gathered, AttrData::Float(vec![4.0, 1.0, 1.0]));
    }

    #[test]
    fn test_gather_domain_skips() {
        let mut store = AttributeStore::new();
        store.insert(AttrDomain::Curve, ATTR_CYCLIC, AttrData::Bool(vec![true, false]));
        store.insert(AttrDomain::Curve, ATTR_MATERIAL, AttrData::Int(vec![2, 5]));

        let gathered = store.gather_domain(AttrDomain::Curve, &[1, 1, 0], &[ATTR_CYCLIC]);
        assert!(!gathered.contains_key(ATTR_CYCLIC));
        assert_eq!(gathered[ATTR_MATERIAL], AttrData::Int(vec![5, 5, 2]));
    }

    #[test]
    fn test_lerp() {
        let floats = AttrData::Float(vec![0.0, 1.0]);
        assert_eq!(floats.lerp(0, 1, 0.25), AttrValue::Float(0.25));

        let bools = AttrData::Bool(vec![true, false]);
        assert_eq!(bools.lerp(0, 1, 0.5), AttrValue::Bool(false));

        let ints = AttrData::Int(vec![10, 20]);
        assert_eq!(ints.lerp(0, 1, 0.75), AttrValue::Int(20));
    }

    #[test]
    fn test_selection_default() {
        assert_eq!(attr_default(ATTR_SELECTION, AttrKind::Bool), AttrValue::Bool(true));
        assert_eq!(attr_default(ATTR_RADIUS, AttrKind::Float), AttrValue::Float(DEFAULT_RADIUS));
        assert_eq!(attr_default("custom", AttrKind::Int), AttrValue::Int(0));
    }

    #[test]
    fn test_lengths_match() {
        let mut store = AttributeStore::new();
        store.insert(AttrDomain::Point, ATTR_RADIUS, AttrData::Float(vec![0.1; 3]));
        store.insert(AttrDomain::Curve, ATTR_CYCLIC, AttrData::Bool(vec![false]));
        assert!(store.lengths_match(3, 1));
        assert!(!store.lengths_match(2, 1));
    }
}
