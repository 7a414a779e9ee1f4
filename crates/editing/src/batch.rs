//! The drawing-batch driver: one entry point per user-facing operation.
//!
//! Every entry point walks the object's editable layers in parallel, one
//! task per layer with exclusive ownership of its drawing, aggregates a
//! shared atomic changed flag, and fires the change sink exactly once after
//! the whole batch when anything changed.

use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use rayon::prelude::*;
use strokes::{IndexMask, Layer, StrokeObject};
use tracing::trace;

use crate::clipboard::{self, Clipboard};
use crate::delete::{remove_curves, remove_points_and_split};
use crate::dissolve::{dissolve_points, DissolveMode};
use crate::duplicate::{duplicate_curves, duplicate_points};
use crate::error::{EditError, EditResult, OpStatus};
use crate::extrude::extrude_points;
use crate::merge::merge_by_distance;
use crate::ops::{self, CapsMode, CyclicMode};
use crate::reorder::{reorder_curves, ReorderDirection};
use crate::selection::{selected_curves, selected_points, SelectionDomain};
use crate::separate::{self, SeparateMode};
use crate::simplify::simplify_drawing;
use crate::smooth::{smooth_drawing, SmoothParams};
use crate::snap::{self, CursorSnapMode, SeedPivot};
use crate::subdivide::{subdivide, SubdivideMode};

/// Receives exactly one call per batch that changed geometry
pub trait ChangeSink: Sync {
    fn geometry_changed(&self);
}

/// Sink for callers that do their own invalidation
pub struct NullSink;

impl ChangeSink for NullSink {
    fn geometry_changed(&self) {}
}

/// Run `edit` over every editable layer in parallel and fire the sink once
/// when any layer changed.
fn edit_layers<F>(object: &mut StrokeObject, sink: &dyn ChangeSink, edit: F) -> OpStatus
where
    F: Fn(&mut Layer) -> bool + Sync,
{
    let changed = AtomicBool::new(false);
    object
        .layers_mut()
        .par_iter_mut()
        .filter(|layer| layer.is_editable())
        .for_each(|layer| {
            if layer.drawing.point_count() == 0 {
                return;
            }
            if edit(layer) {
                changed.fetch_or(true, Ordering::Relaxed);
            }
        });
    let changed = changed.into_inner();
    trace!(changed, "batch complete");
    if changed {
        sink.geometry_changed();
    }
    OpStatus::from_flag(changed)
}

pub fn smooth_strokes(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    params: SmoothParams,
) -> EditResult {
    if !(params.smooth_position || params.smooth_radius || params.smooth_opacity) {
        return Ok(OpStatus::Unchanged);
    }
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        smooth_drawing(&mut layer.drawing, &curves, params)
    }))
}

pub fn simplify_strokes(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    epsilon: f32,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        match simplify_drawing(&layer.drawing, &curves, epsilon) {
            Some(simplified) => {
                layer.drawing.replace(simplified);
                true
            }
            None => false,
        }
    }))
}

pub fn delete_selection(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    domain: SelectionDomain,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let removed = match domain {
            SelectionDomain::Point => {
                let points = selected_points(&layer.drawing);
                if points.is_empty() {
                    return false;
                }
                remove_points_and_split(&layer.drawing, &points)
            }
            SelectionDomain::Curve => {
                let curves = selected_curves(&layer.drawing);
                if curves.is_empty() {
                    return false;
                }
                remove_curves(&layer.drawing, &curves)
            }
        };
        layer.drawing.replace(removed);
        true
    }))
}

pub fn dissolve_selection(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    mode: DissolveMode,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        match dissolve_points(&layer.drawing, &curves, mode) {
            Some(dissolved) => {
                layer.drawing.replace(dissolved);
                true
            }
            None => false,
        }
    }))
}

pub fn duplicate_selection(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    domain: SelectionDomain,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let duplicated = match domain {
            SelectionDomain::Point => {
                let points = selected_points(&layer.drawing);
                if points.is_empty() {
                    return false;
                }
                duplicate_points(&layer.drawing, &points)
            }
            SelectionDomain::Curve => {
                let curves = selected_curves(&layer.drawing);
                if curves.is_empty() {
                    return false;
                }
                duplicate_curves(&layer.drawing, &curves)
            }
        };
        layer.drawing.replace(duplicated);
        true
    }))
}

pub fn extrude_selection(object: &mut StrokeObject, sink: &dyn ChangeSink) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let points = selected_points(&layer.drawing);
        match extrude_points(&layer.drawing, &points) {
            Some(extruded) => {
                layer.drawing.replace(extruded);
                true
            }
            None => false,
        }
    }))
}

pub fn reorder_strokes(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    direction: ReorderDirection,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        if curves.is_empty() || curves.len() == layer.drawing.curve_count() {
            return false;
        }
        match reorder_curves(&layer.drawing, &curves, direction) {
            Some(reordered) => {
                layer.drawing.replace(reordered);
                true
            }
            None => false,
        }
    }))
}

pub fn subdivide_strokes(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    cuts: usize,
    mode: SubdivideMode,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        match subdivide(&layer.drawing, &curves, cuts, mode) {
            Some(subdivided) => {
                layer.drawing.replace(subdivided);
                true
            }
            None => false,
        }
    }))
}

/// Merge points closer than `threshold`. `use_unselected` widens the mask
/// from the selected points to every point of the editable layers.
pub fn merge_points_by_distance(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    threshold: f32,
    use_unselected: bool,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let points = if use_unselected {
            IndexMask::all(layer.drawing.point_count())
        } else {
            selected_points(&layer.drawing)
        };
        match merge_by_distance(&layer.drawing, &points, threshold) {
            Some(merged) => {
                layer.drawing.replace(merged);
                true
            }
            None => false,
        }
    }))
}

/// Separate geometry into new sibling objects; the caller owns them.
pub fn separate_strokes(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    mode: SeparateMode,
) -> Result<Vec<StrokeObject>, EditError> {
    let siblings = separate::separate(object, mode)?;
    if !siblings.is_empty() {
        sink.geometry_changed();
    }
    Ok(siblings)
}

pub fn copy_to_clipboard(
    object: &StrokeObject,
    clipboard: &mut Clipboard,
    domain: SelectionDomain,
) -> EditResult {
    Ok(clipboard::copy_selection(object, clipboard, domain))
}

pub fn paste_from_clipboard(
    object: &mut StrokeObject,
    clipboard: &Clipboard,
    sink: &dyn ChangeSink,
    behind: bool,
) -> EditResult {
    let status = clipboard::paste(object, clipboard, behind)?;
    if status.changed() {
        sink.geometry_changed();
    }
    Ok(status)
}

pub fn set_stroke_thickness(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    radius: f32,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        ops::set_uniform_thickness(&mut layer.drawing, &curves, radius)
    }))
}

pub fn set_stroke_opacity(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    opacity: f32,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        ops::set_uniform_opacity(&mut layer.drawing, &curves, opacity)
    }))
}

pub fn set_stroke_caps(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    mode: CapsMode,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        ops::set_caps(&mut layer.drawing, &curves, mode)
    }))
}

pub fn set_stroke_cyclic(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    mode: CyclicMode,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        ops::set_cyclic(&mut layer.drawing, &curves, mode)
    }))
}

/// Assign the named material (or the active slot when `name` is `None`) to
/// the selected curves.
pub fn set_stroke_material(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    name: Option<&str>,
) -> EditResult {
    let index = match name {
        Some(name) => object
            .materials()
            .index_of_name(name)
            .ok_or_else(|| EditError::MaterialNotFound(name.to_owned()))?,
        None => object.active_material(),
    };
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        ops::set_material_index(&mut layer.drawing, &curves, index)
    }))
}

/// Make the named layer the paste target and edit focus
pub fn set_active_layer(object: &mut StrokeObject, name: &str) -> EditResult {
    let index = object
        .find_layer(name)
        .ok_or_else(|| EditError::LayerNotFound(name.to_owned()))?;
    if object.active_layer() == Some(index) {
        return Ok(OpStatus::Unchanged);
    }
    object.set_active_layer(Some(index));
    Ok(OpStatus::Changed)
}

/// Make the first selected curve's material the object's active slot
pub fn set_active_material_from_selection(object: &mut StrokeObject) -> EditResult {
    for layer_index in object.editable_layers().collect::<Vec<_>>() {
        let Some(layer) = object.layer(layer_index) else {
            continue;
        };
        let curves = selected_curves(&layer.drawing);
        let Some(curve) = curves.first() else {
            continue;
        };
        let index = layer.drawing.material_indices().get(curve).max(0) as usize;
        if index >= object.materials().len() || index == object.active_material() {
            return Ok(OpStatus::Unchanged);
        }
        object.set_active_material(index);
        return Ok(OpStatus::Changed);
    }
    Ok(OpStatus::Unchanged)
}

/// Reverse the point order of the selected curves
pub fn switch_stroke_direction(object: &mut StrokeObject, sink: &dyn ChangeSink) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let curves = selected_curves(&layer.drawing);
        if curves.is_empty() {
            return false;
        }
        layer.drawing.reverse_curves(&curves);
        true
    }))
}

/// Delete editable curves holding at most `limit` points
pub fn clean_loose_points(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    limit: usize,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let all = IndexMask::all(layer.drawing.curve_count());
        match ops::clean_loose(&layer.drawing, &all, limit) {
            Some(cleaned) => {
                layer.drawing.replace(cleaned);
                true
            }
            None => false,
        }
    }))
}

pub fn snap_to_grid(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    grid_size: f32,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let points = selected_points(&layer.drawing);
        snap::snap_to_grid(&mut layer.drawing, layer.transform, &points, grid_size)
    }))
}

pub fn snap_to_cursor(
    object: &mut StrokeObject,
    sink: &dyn ChangeSink,
    cursor_world: Vec3,
    mode: CursorSnapMode,
) -> EditResult {
    Ok(edit_layers(object, sink, |layer| {
        let points = selected_points(&layer.drawing);
        snap::snap_to_cursor(&mut layer.drawing, layer.transform, &points, cursor_world, mode)
    }))
}

/// World-space pivot of the current selection across editable layers, for
/// moving the cursor onto it. `None` when nothing is selected.
pub fn snap_cursor_to_selection(object: &StrokeObject, pivot: SeedPivot) -> Option<Vec3> {
    let mut accumulator = snap::PivotAccumulator::new();
    for layer_index in object.editable_layers() {
        let Some(layer) = object.layer(layer_index) else {
            continue;
        };
        accumulator.add_selected(&layer.drawing, layer.transform);
    }
    accumulator.resolve(pivot)
}
