//! Index masks and boolean-run utilities.
//!
//! An [`IndexMask`] is an immutable, ordered, deduplicated set of element
//! indices into one domain. Masks are valid only against the element count
//! they were computed for; any structural rewrite of the domain invalidates
//! them.

use std::ops::Range;

/// An ordered, deduplicated set of indices into one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMask {
    indices: Vec<usize>,
}

impl IndexMask {
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
        }
    }

    /// Mask selecting every index in `0..universe`
    pub fn all(universe: usize) -> Self {
        Self {
            indices: (0..universe).collect(),
        }
    }

    /// Indices of all `true` entries
    pub fn from_bools(values: &[bool]) -> Self {
        Self {
            indices: values
                .iter()
                .enumerate()
                .filter_map(|(i, &v)| v.then_some(i))
                .collect(),
        }
    }

    /// Indices in `universe` for which the predicate holds
    pub fn from_predicate(universe: Range<usize>, mut predicate: impl FnMut(usize) -> bool) -> Self {
        Self {
            indices: universe.filter(|&i| predicate(i)).collect(),
        }
    }

    /// Build from explicit indices; sorts and deduplicates.
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn first(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// All indices in `0..universe` not present in this mask
    pub fn complement(&self, universe: usize) -> Self {
        let mut indices = Vec::with_capacity(universe - self.indices.len());
        let mut next = self.indices.iter().copied().peekable();
        for i in 0..universe {
            if next.peek() == Some(&i) {
                next.next();
            } else {
                indices.push(i);
            }
        }
        Self { indices }
    }

    /// The subset of this mask falling inside `range`, used for per-curve
    /// slicing. Indices keep their absolute values.
    pub fn slice_content(&self, range: Range<usize>) -> Self {
        let start = self.indices.partition_point(|&i| i < range.start);
        let end = self.indices.partition_point(|&i| i < range.end);
        Self {
            indices: self.indices[start..end].to_vec(),
        }
    }

    /// Materialize as a boolean array of length `universe`
    pub fn to_bools(&self, universe: usize) -> Vec<bool> {
        let mut bools = vec![false; universe];
        for &i in &self.indices {
            bools[i] = true;
        }
        bools
    }
}

impl<'a> IntoIterator for &'a IndexMask {
    type Item = usize;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter().copied()
    }
}

/// Find all maximal runs of `target` in `values`.
///
/// Returned ranges are ordered by start, non-overlapping and non-empty.
pub fn find_all_ranges(values: &[bool], target: bool) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = None;
    for (i, &value) in values.iter().enumerate() {
        match (value == target, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                ranges.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        ranges.push(s..values.len());
    }
    ranges
}

/// Write `value` at every masked index
pub fn masked_fill<T: Copy>(dst: &mut [T], value: T, mask: &IndexMask) {
    for i in mask.iter() {
        dst[i] = value;
    }
}

/// Flip every boolean in place
pub fn invert_booleans(values: &mut [bool]) {
    for v in values.iter_mut() {
        *v = !*v;
    }
}
