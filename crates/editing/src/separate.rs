//! Separate: move geometry out of an object into new sibling objects.

use serde::{Deserialize, Serialize};
use strokes::{gather_curves, Drawing, IndexMask, Layer, StrokeObject};
use tracing::info;

use crate::delete::{remove_curves, remove_points_and_split};
use crate::error::EditError;
use crate::selection::{has_selection, selected_points};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeparateMode {
    /// Move the selected geometry, splitting curves at selection borders,
    /// into one new object
    Selected,
    /// One new object per used material slot past the first
    ByMaterial,
    /// One new object per unselected, unlocked layer
    ByLayer,
}

/// Gathered copy of whole curves
fn extract_curves(src: &Drawing, curves: &IndexMask) -> Drawing {
    let mut counts = Vec::with_capacity(curves.len());
    let mut dst_to_src_point = Vec::new();
    let mut dst_to_src_curve = Vec::with_capacity(curves.len());
    for curve in curves.iter() {
        let points = src.partition().points_of(curve);
        counts.push(points.len());
        dst_to_src_point.extend(points);
        dst_to_src_curve.push(curve);
    }
    gather_curves(src, &counts, &dst_to_src_point, &dst_to_src_curve, &[])
}

/// An empty sibling carrying the source's full material table; unused slots
/// are pruned once the geometry has moved.
fn sibling_object(source: &StrokeObject, suffix: &str) -> StrokeObject {
    let mut object = StrokeObject::new(format!("{}.{}", source.name, suffix));
    *object.materials_mut() = source.materials().clone();
    object
}

/// The destination layer matching `source` by name, created on demand with
/// the source layer's transform.
fn find_or_create_layer<'a>(object: &'a mut StrokeObject, source: &Layer) -> &'a mut Layer {
    let index = match object.find_layer(&source.name) {
        Some(index) => index,
        None => {
            let mut layer = Layer::new(source.name.clone());
            layer.transform = source.transform;
            object.add_layer(layer)
        }
    };
    // The index came from find_layer or add_layer just above.
    &mut object.layers_mut()[index]
}

fn separate_selected(object: &mut StrokeObject) -> Result<Vec<StrokeObject>, EditError> {
    let editable: Vec<usize> = object.editable_layers().collect();
    let any_selected = editable
        .iter()
        .any(|&i| object.layer(i).is_some_and(|layer| has_selection(&layer.drawing)));
    if !any_selected {
        return Err(EditError::NothingSelected);
    }

    let mut dest = sibling_object(object, "001");
    let mut moved = false;
    for layer_index in editable {
        let Some(layer) = object.layer(layer_index) else {
            continue;
        };
        let selected = selected_points(&layer.drawing);
        if selected.is_empty() || layer.drawing.point_count() == 0 {
            continue;
        }
        let kept_mask = selected.complement(layer.drawing.point_count());
        let copied = remove_points_and_split(&layer.drawing, &kept_mask);
        let remaining = remove_points_and_split(&layer.drawing, &selected);

        let source_layer = layer.clone();
        let dest_layer = find_or_create_layer(&mut dest, &source_layer);
        dest_layer.drawing.replace(copied);

        if let Some(layer) = object.layer_mut(layer_index) {
            layer.drawing.replace(remaining);
        }
        moved = true;
    }
    if !moved {
        return Ok(Vec::new());
    }
    dest.set_active_layer(None);
    dest.remove_unused_materials();
    Ok(vec![dest])
}

fn separate_by_material(object: &mut StrokeObject) -> Result<Vec<StrokeObject>, EditError> {
    if object.materials().len() <= 1 {
        return Err(EditError::SingleMaterial);
    }
    let editable: Vec<usize> = object.editable_layers().collect();
    let mut siblings = Vec::new();
    for slot_index in 1..object.materials().len() {
        let slot_name = match object.materials().slot(slot_index) {
            Some(slot) => slot.name.clone(),
            None => continue,
        };
        let mut dest = sibling_object(object, &slot_name);
        let mut moved = false;
        for &layer_index in &editable {
            let Some(layer) = object.layer(layer_index) else {
                continue;
            };
            let materials = layer.drawing.material_indices();
            let strokes = IndexMask::from_predicate(0..layer.drawing.curve_count(), |curve| {
                materials.get(curve) == slot_index as i32
            });
            if strokes.is_empty() {
                continue;
            }
            let copied = extract_curves(&layer.drawing, &strokes);
            let remaining = remove_curves(&layer.drawing, &strokes);

            let source_layer = layer.clone();
            let dest_layer = find_or_create_layer(&mut dest, &source_layer);
            dest_layer.drawing.replace(copied);

            if let Some(layer) = object.layer_mut(layer_index) {
                layer.drawing.replace(remaining);
            }
            moved = true;
        }
        if moved {
            dest.remove_unused_materials();
            siblings.push(dest);
        }
    }
    if !siblings.is_empty() {
        object.remove_unused_materials();
    }
    Ok(siblings)
}

fn separate_by_layer(object: &mut StrokeObject) -> Result<Vec<StrokeObject>, EditError> {
    if object.layers().len() <= 1 {
        return Err(EditError::SingleLayer);
    }
    let mut siblings = Vec::new();
    for layer_index in 0..object.layers().len() {
        let Some(layer) = object.layer(layer_index) else {
            continue;
        };
        if layer.selected || layer.locked {
            continue;
        }
        let strokes = IndexMask::all(layer.drawing.curve_count());
        if strokes.is_empty() {
            continue;
        }
        let mut dest = sibling_object(object, &layer.name.clone());
        let copied = extract_curves(&layer.drawing, &strokes);
        let remaining = remove_curves(&layer.drawing, &strokes);

        let source_layer = layer.clone();
        let dest_layer = find_or_create_layer(&mut dest, &source_layer);
        dest_layer.drawing.replace(copied);

        if let Some(layer) = object.layer_mut(layer_index) {
            layer.drawing.replace(remaining);
        }
        dest.remove_unused_materials();
        siblings.push(dest);
    }
    Ok(siblings)
}

/// Separate geometry out of `object` into new sibling objects, returned to
/// the caller for insertion into the scene. An empty vector means nothing
/// moved.
pub fn separate(
    object: &mut StrokeObject,
    mode: SeparateMode,
) -> Result<Vec<StrokeObject>, EditError> {
    let siblings = match mode {
        SeparateMode::Selected => separate_selected(object)?,
        SeparateMode::ByMaterial => separate_by_material(object)?,
        SeparateMode::ByLayer => separate_by_layer(object)?,
    };
    if !siblings.is_empty() {
        info!(mode = ?mode, siblings = siblings.len(), "separated geometry");
    }
    Ok(siblings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::write_selection;
    use glam::Vec3;
    use strokes::{AttrDomain, CurvePartition};

    fn source_object() -> StrokeObject {
        let mut object = StrokeObject::new("sketch");
        object.materials_mut().add("ink");
        object.materials_mut().add("fill");
        let mut layer = Layer::new("lines");
        layer.drawing = Drawing::new(
            CurvePartition::from_counts(&[2, 2]),
            (0..4).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
        );
        layer.drawing.material_indices_mut().copy_from_slice(&[0, 1]);
        object.add_layer(layer);
        object
    }

    #[test]
    fn test_separate_selected_moves_points() {
        let mut object = source_object();
        write_selection(
            &mut object.layer_mut(0).unwrap().drawing,
            AttrDomain::Point,
            &[false, false, true, true],
        );
        let siblings = separate(&mut object, SeparateMode::Selected).unwrap();
        assert_eq!(siblings.len(), 1);

        let moved = &siblings[0].layer(0).unwrap().drawing;
        assert_eq!(moved.curve_count(), 1);
        assert_eq!(moved.positions()[0], Vec3::new(2.0, 0.0, 0.0));
        // Unused "ink" slot pruned from the destination.
        assert_eq!(siblings[0].materials().len(), 1);
        assert_eq!(siblings[0].materials().slot(0).unwrap().name, "fill");
        assert_eq!(moved.material_indices().materialize(), vec![0]);

        let remaining = &object.layer(0).unwrap().drawing;
        assert_eq!(remaining.curve_count(), 1);
        assert_eq!(remaining.positions()[0], Vec3::ZERO);
    }

    #[test]
    fn test_separate_selected_requires_selection() {
        let mut object = source_object();
        write_selection(
            &mut object.layer_mut(0).unwrap().drawing,
            AttrDomain::Point,
            &[false, false, false, false],
        );
        assert_eq!(
            separate(&mut object, SeparateMode::Selected),
            Err(EditError::NothingSelected)
        );
    }

    #[test]
    fn test_separate_by_material() {
        let mut object = source_object();
        let siblings = separate(&mut object, SeparateMode::ByMaterial).unwrap();
        assert_eq!(siblings.len(), 1);
        assert_eq!(siblings[0].name, "sketch.fill");

        let moved = &siblings[0].layer(0).unwrap().drawing;
        assert_eq!(moved.curve_count(), 1);
        assert_eq!(moved.positions()[0], Vec3::new(2.0, 0.0, 0.0));

        // Source loses the curve and prunes the now-unused slot.
        assert_eq!(object.layer(0).unwrap().drawing.curve_count(), 1);
        assert_eq!(object.materials().len(), 1);
    }

    #[test]
    fn test_separate_by_material_single_slot_errors() {
        let mut object = StrokeObject::new("sketch");
        object.materials_mut().add("ink");
        object.add_layer(Layer::new("lines"));
        assert_eq!(
            separate(&mut object, SeparateMode::ByMaterial),
            Err(EditError::SingleMaterial)
        );
    }

    #[test]
    fn test_separate_by_layer() {
        let mut object = source_object();
        let mut second = Layer::new("shading");
        second.drawing = Drawing::new(CurvePartition::single(2), vec![Vec3::ONE; 2]);
        object.add_layer(second);

        let siblings = separate(&mut object, SeparateMode::ByLayer).unwrap();
        assert_eq!(siblings.len(), 2);
        assert_eq!(siblings[0].name, "sketch.lines");
        assert_eq!(siblings[1].name, "sketch.shading");
        assert_eq!(siblings[0].layer(0).unwrap().drawing.curve_count(), 2);
        assert_eq!(object.layer(0).unwrap().drawing.curve_count(), 0);
    }

    #[test]
    fn test_separate_by_layer_skips_locked() {
        let mut object = source_object();
        let mut second = Layer::new("shading");
        second.locked = true;
        second.drawing = Drawing::new(CurvePartition::single(2), vec![Vec3::ONE; 2]);
        object.add_layer(second);

        let siblings = separate(&mut object, SeparateMode::ByLayer).unwrap();
        assert_eq!(siblings.len(), 1);
        assert_eq!(siblings[0].name, "sketch.lines");
        assert_eq!(object.layer(1).unwrap().drawing.curve_count(), 1);
    }
}
