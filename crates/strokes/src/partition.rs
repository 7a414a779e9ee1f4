//! The curve partition: an offsets table mapping curves to point ranges.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Errors raised when a partition fails validation
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    #[error("offsets table is empty")]
    NoOffsets,
    #[error("offsets must start at zero, found {0}")]
    NonZeroStart(usize),
    #[error("offsets must be non-decreasing, offsets[{index}] = {value} < {previous}")]
    Decreasing {
        index: usize,
        value: usize,
        previous: usize,
    },
}

/// Maps each curve to a contiguous range of point indices.
///
/// Curve `i` owns the points `[offsets[i], offsets[i + 1])`. The table always
/// holds `curve_count + 1` entries with `offsets[0] == 0` and the final entry
/// equal to the total point count, so every point belongs to exactly one
/// curve. Curve order is draw order (later curves render in front).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePartition {
    offsets: Vec<usize>,
}

impl Default for CurvePartition {
    fn default() -> Self {
        Self::empty()
    }
}

impl CurvePartition {
    /// A partition with no curves and no points
    pub fn empty() -> Self {
        Self { offsets: vec![0] }
    }

    /// A partition holding one curve with `point_count` points
    pub fn single(point_count: usize) -> Self {
        Self {
            offsets: vec![0, point_count],
        }
    }

    /// Build a partition from per-curve point counts.
    ///
    /// This is the second half of the two-pass build: callers first compute
    /// exact destination sizes, then accumulate them into offsets here.
    pub fn from_counts(counts: &[usize]) -> Self {
        let mut offsets = Vec::with_capacity(counts.len() + 1);
        let mut total = 0;
        offsets.push(0);
        for &count in counts {
            total += count;
            offsets.push(total);
        }
        Self { offsets }
    }

    /// Build directly from a raw offsets table.
    pub fn from_offsets(offsets: Vec<usize>) -> Result<Self, PartitionError> {
        let partition = Self { offsets };
        partition.validate()?;
        Ok(partition)
    }

    pub fn curve_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn point_count(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    pub fn is_empty(&self) -> bool {
        self.curve_count() == 0
    }

    /// The point index range owned by `curve`
    pub fn points_of(&self, curve: usize) -> Range<usize> {
        self.offsets[curve]..self.offsets[curve + 1]
    }

    /// Number of points in `curve`
    pub fn size_of(&self, curve: usize) -> usize {
        self.offsets[curve + 1] - self.offsets[curve]
    }

    /// Range over all curve indices
    pub fn curves_range(&self) -> Range<usize> {
        0..self.curve_count()
    }

    /// The curve containing `point`, by binary search
    pub fn curve_of_point(&self, point: usize) -> Option<usize> {
        if point >= self.point_count() {
            return None;
        }
        // partition_point finds the first offset greater than `point`.
        let upper = self.offsets.partition_point(|&o| o <= point);
        Some(upper - 1)
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Check the partition invariant: `offsets[0] == 0`, non-decreasing.
    pub fn validate(&self) -> Result<(), PartitionError> {
        if self.offsets.is_empty() {
            return Err(PartitionError::NoOffsets);
        }
        if self.offsets[0] != 0 {
            return Err(PartitionError::NonZeroStart(self.offsets[0]));
        }
        for i in 1..self.offsets.len() {
            if self.offsets[i] < self.offsets[i - 1] {
                return Err(PartitionError::Decreasing {
                    index: i,
                    value: self.offsets[i],
                    previous: self.offsets[i - 1],
                });
            }
        }
        Ok(())
    }
}
