//! Snapping: grid and cursor snaps in world space.
//!
//! Drawings store positions in layer space; every snap maps through the
//! layer transform, snaps in world space, and maps back.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use strokes::{masked_fill, AttrDomain, Drawing, IndexMask};
use tracing::debug;

/// Snap the selected points to the nearest multiple of `grid_size`.
/// Returns whether any point moved.
pub fn snap_to_grid(
    drawing: &mut Drawing,
    layer_to_world: Mat4,
    points: &IndexMask,
    grid_size: f32,
) -> bool {
    if points.is_empty() || grid_size <= 0.0 {
        return false;
    }
    let world_to_layer = layer_to_world.inverse();
    let mut changed = false;
    let positions = drawing.positions_mut();
    for point in points.iter() {
        let world = layer_to_world.transform_point3(positions[point]);
        let snapped = (world / grid_size).round() * grid_size;
        if snapped != world {
            positions[point] = world_to_layer.transform_point3(snapped);
            changed = true;
        }
    }
    if changed {
        debug!(grid_size, "snapped points to grid");
    }
    changed
}

/// How snap-to-cursor moves the geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorSnapMode {
    /// Every selected point lands exactly on the cursor
    Points,
    /// Each selected curve translates rigidly so its first selected point
    /// lands on the cursor
    Offset,
}

/// Snap the selected points (or curves, in offset mode) to the world-space
/// cursor position.
pub fn snap_to_cursor(
    drawing: &mut Drawing,
    layer_to_world: Mat4,
    points: &IndexMask,
    cursor_world: Vec3,
    mode: CursorSnapMode,
) -> bool {
    if points.is_empty() {
        return false;
    }
    let cursor_local = layer_to_world.inverse().transform_point3(cursor_world);
    match mode {
        CursorSnapMode::Points => {
            let positions = drawing.positions_mut();
            let changed = points.iter().any(|point| positions[point] != cursor_local);
            if changed {
                masked_fill(positions, cursor_local, points);
            }
            changed
        }
        CursorSnapMode::Offset => {
            let mut offsets: Vec<(std::ops::Range<usize>, Vec3)> = Vec::new();
            for curve in drawing.partition().curves_range() {
                let range = drawing.partition().points_of(curve);
                let anchor = points.slice_content(range.clone()).first();
                if let Some(anchor) = anchor {
                    let delta = cursor_local - drawing.positions()[anchor];
                    if delta != Vec3::ZERO {
                        offsets.push((range, delta));
                    }
                }
            }
            let changed = !offsets.is_empty();
            let positions = drawing.positions_mut();
            for (range, delta) in offsets {
                for position in &mut positions[range] {
                    *position += delta;
                }
            }
            changed
        }
    }
}

/// Which point of the selection the cursor lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedPivot {
    /// Arithmetic mean of the selected positions
    Median,
    /// Center of the selection's bounding box
    BoundsCenter,
}

/// Running world-space aggregate of selected positions, foldable over any
/// number of drawings.
#[derive(Debug, Clone, Copy)]
pub struct PivotAccumulator {
    sum: Vec3,
    min: Vec3,
    max: Vec3,
    count: usize,
}

impl PivotAccumulator {
    pub fn new() -> Self {
        Self {
            sum: Vec3::ZERO,
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
            count: 0,
        }
    }

    /// Fold in the selected points of one drawing
    pub fn add_selected(&mut self, drawing: &Drawing, layer_to_world: Mat4) {
        let selection = drawing.selection(AttrDomain::Point);
        for (point, position) in drawing.positions().iter().enumerate() {
            if !selection.get(point) {
                continue;
            }
            let world = layer_to_world.transform_point3(*position);
            self.sum += world;
            self.min = self.min.min(world);
            self.max = self.max.max(world);
            self.count += 1;
        }
    }

    /// The accumulated pivot; `None` when nothing was selected
    pub fn resolve(&self, pivot: SeedPivot) -> Option<Vec3> {
        if self.count == 0 {
            return None;
        }
        Some(match pivot {
            SeedPivot::Median => self.sum / self.count as f32,
            SeedPivot::BoundsCenter => (self.min + self.max) * 0.5,
        })
    }
}

impl Default for PivotAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// World-space pivot of the selected points, for moving the cursor to the
/// selection. `None` when nothing is selected.
pub fn selection_pivot(drawing: &Drawing, layer_to_world: Mat4, pivot: SeedPivot) -> Option<Vec3> {
    let mut accumulator = PivotAccumulator::new();
    accumulator.add_selected(drawing, layer_to_world);
    accumulator.resolve(pivot)
}
