//! The stroke clipboard: detached geometry plus material identities.
//!
//! Owned state passed `&mut` into copy and paste; callers create it at
//! startup and drop it at teardown. Replaced wholesale on every copy. The
//! `&mut` receiver keeps copy/paste on the single-threaded dispatch path.

use strokes::{
    join_drawings, AttrData, AttrDomain, Drawing, IndexMask, MaterialSlot, StrokeObject,
    ATTR_SELECTION,
};
use tracing::{debug, info};

use crate::delete::{remove_curves, remove_points_and_split};
use crate::error::{EditError, EditResult, OpStatus};
use crate::selection::{deselect_all, selected_curves, selected_points, SelectionDomain};

/// Detached copy of a selection
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    drawing: Drawing,
    /// Referenced materials as (slot recorded at copy time, index local to
    /// the clipboard drawing's `material_index` values)
    materials: Vec<(MaterialSlot, usize)>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.drawing.curve_count() == 0
    }

    pub fn curve_count(&self) -> usize {
        self.drawing.curve_count()
    }

    pub fn point_count(&self) -> usize {
        self.drawing.point_count()
    }
}

/// Copy the selected geometry of every editable layer into the clipboard,
/// replacing its previous contents. The curve domain copies whole selected
/// curves; the point domain splits curves at selection borders.
pub fn copy_selection(
    object: &StrokeObject,
    clipboard: &mut Clipboard,
    domain: SelectionDomain,
) -> OpStatus {
    let mut parts = Vec::new();
    for layer_index in object.editable_layers() {
        let Some(layer) = object.layer(layer_index) else {
            continue;
        };
        let drawing = &layer.drawing;
        if drawing.point_count() == 0 {
            continue;
        }
        let part = match domain {
            SelectionDomain::Point => {
                let selected = selected_points(drawing);
                if selected.is_empty() {
                    continue;
                }
                // Keeping only the selected points is deletion of the
                // complement.
                let unselected = selected.complement(drawing.point_count());
                remove_points_and_split(drawing, &unselected)
            }
            SelectionDomain::Curve => {
                let selected = selected_curves(drawing);
                if selected.is_empty() {
                    continue;
                }
                remove_curves(drawing, &selected.complement(drawing.curve_count()))
            }
        };
        parts.push(part);
    }
    if parts.is_empty() {
        return OpStatus::Unchanged;
    }

    let drawing = join_drawings(&parts);
    let mut materials = Vec::new();
    for index in drawing.material_indices().iter() {
        let index = index.max(0) as usize;
        if materials.iter().any(|&(_, local)| local == index) {
            continue;
        }
        if let Some(slot) = object.materials().slot(index) {
            materials.push((slot.clone(), index));
        }
    }

    info!(
        curves = drawing.curve_count(),
        points = drawing.point_count(),
        materials = materials.len(),
        "copied selection to clipboard"
    );
    *clipboard = Clipboard { drawing, materials };
    OpStatus::Changed
}

/// Paste the clipboard into the object's active layer.
///
/// Material identities resolve against the destination table, appending
/// missing slots; `material_index` values remap through the result. Pasted
/// elements come out selected, everything else deselected. `behind` prepends
/// the clipboard curves so they draw underneath.
pub fn paste(
    object: &mut StrokeObject,
    clipboard: &Clipboard,
    behind: bool,
) -> EditResult {
    if clipboard.is_empty() {
        return Err(EditError::EmptyClipboard);
    }
    let layer_index = object.active_layer().ok_or(EditError::NoActiveLayer)?;
    {
        let layer = object
            .layer(layer_index)
            .ok_or(EditError::NoActiveLayer)?;
        if layer.locked {
            return Err(EditError::LayerLocked(layer.name.clone()));
        }
    }

    // Resolve identities first so the remap sees the final table.
    let mut remap: Vec<(usize, usize)> = Vec::with_capacity(clipboard.materials.len());
    for (slot, local) in &clipboard.materials {
        let dest = object.materials_mut().ensure_slot(slot);
        remap.push((*local, dest));
    }

    let mut pasted = clipboard.drawing.clone();
    if pasted.curve_count() > 0 {
        for index in pasted.material_indices_mut() {
            let local = (*index).max(0) as usize;
            if let Some(&(_, dest)) = remap.iter().find(|&&(from, _)| from == local) {
                *index = dest as i32;
            }
        }
    }
    let point_count = pasted.point_count();
    pasted
        .attributes_mut()
        .insert(AttrDomain::Point, ATTR_SELECTION, AttrData::Bool(vec![true; point_count]));
    pasted.attributes_mut().remove(AttrDomain::Curve, ATTR_SELECTION);

    // Nothing stays selected but the pasted elements, on any layer or
    // domain.
    for index in object.editable_layers().collect::<Vec<_>>() {
        if let Some(layer) = object.layer_mut(index) {
            deselect_all(&mut layer.drawing, AttrDomain::Point);
            deselect_all(&mut layer.drawing, AttrDomain::Curve);
        }
    }

    let layer = object
        .layer_mut(layer_index)
        .ok_or(EditError::NoActiveLayer)?;
    let joined = if behind {
        join_drawings(&[pasted, layer.drawing.clone()])
    } else {
        join_drawings(&[layer.drawing.clone(), pasted])
    };
    layer.drawing.replace(joined);

    debug!(behind, curves = clipboard.curve_count(), "pasted clipboard");
    Ok(OpStatus::Changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::write_selection;
    use glam::Vec3;
    use strokes::{CurvePartition, Layer};

    fn object_with_selection(selection: &[bool]) -> StrokeObject {
        let mut object = StrokeObject::new("src");
        object.materials_mut().add("ink");
        object.materials_mut().add("fill");
        let mut layer = Layer::new("lines");
        layer.drawing = Drawing::new(
            CurvePartition::from_counts(&[2, 2]),
            (0..4).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
        );
        layer.drawing.material_indices_mut().copy_from_slice(&[0, 1]);
        write_selection(&mut layer.drawing, AttrDomain::Point, selection);
        object.add_layer(layer);
        object
    }

    #[test]
    fn test_copy_empty_selection_unchanged() {
        let object = object_with_selection(&[false, false, false, false]);
        let mut clipboard = Clipboard::new();
        assert_eq!(
            copy_selection(&object, &mut clipboard, SelectionDomain::Point),
            OpStatus::Unchanged
        );
        assert!(clipboard.is_empty());
    }

    #[test]
    fn test_copy_paste_round_trip() {
        let mut object = object_with_selection(&[true, true, true, true]);
        let mut clipboard = Clipboard::new();
        assert_eq!(
            copy_selection(&object, &mut clipboard, SelectionDomain::Point),
            OpStatus::Changed
        );
        assert_eq!(clipboard.curve_count(), 2);

        paste(&mut object, &clipboard, false).unwrap();
        let drawing = &object.layer(0).unwrap().drawing;
        assert_eq!(drawing.curve_count(), 4);
        assert_eq!(drawing.point_count(), 8);
        // Identities unchanged, so material indices come back equal.
        assert_eq!(drawing.material_indices().materialize(), vec![0, 1, 0, 1]);
        assert_eq!(drawing.positions()[4], drawing.positions()[0]);
        // Only the pasted half is selected.
        assert_eq!(
            selected_points(drawing).indices(),
            &[4, 5, 6, 7]
        );
    }

    #[test]
    fn test_copy_curve_domain_takes_whole_selected_curves() {
        let mut object = object_with_selection(&[true, true, true, true]);
        write_selection(
            &mut object.layers_mut()[0].drawing,
            AttrDomain::Curve,
            &[true, false],
        );
        let mut clipboard = Clipboard::new();
        assert_eq!(
            copy_selection(&object, &mut clipboard, SelectionDomain::Curve),
            OpStatus::Changed
        );
        assert_eq!(clipboard.curve_count(), 1);
        assert_eq!(clipboard.point_count(), 2);
    }

    #[test]
    fn test_paste_deselects_other_layers() {
        let mut object = object_with_selection(&[true, true, true, true]);
        let mut clipboard = Clipboard::new();
        copy_selection(&object, &mut clipboard, SelectionDomain::Point);

        // The new layer becomes active; the first keeps its selection until
        // the paste lands.
        let mut layer = Layer::new("top");
        layer.drawing = Drawing::new(CurvePartition::single(2), vec![Vec3::ZERO, Vec3::X]);
        object.add_layer(layer);

        paste(&mut object, &clipboard, false).unwrap();
        assert!(selected_points(&object.layer(0).unwrap().drawing).is_empty());
        assert!(selected_curves(&object.layer(0).unwrap().drawing).is_empty());
        // Only the pasted geometry on the active layer stays selected.
        assert_eq!(
            selected_points(&object.layer(1).unwrap().drawing).indices(),
            &[2, 3, 4, 5]
        );
    }

    #[test]
    fn test_paste_behind_prepends() {
        let mut object = object_with_selection(&[true, true, false, false]);
        let mut clipboard = Clipboard::new();
        copy_selection(&object, &mut clipboard, SelectionDomain::Point);
        paste(&mut object, &clipboard, true).unwrap();
        let drawing = &object.layer(0).unwrap().drawing;
        assert_eq!(drawing.curve_count(), 3);
        // Pasted curve drawn first.
        assert_eq!(selected_points(drawing).indices(), &[0, 1]);
    }

    #[test]
    fn test_paste_remaps_materials_by_identity() {
        let source = object_with_selection(&[false, false, true, true]);
        let mut clipboard = Clipboard::new();
        copy_selection(&source, &mut clipboard, SelectionDomain::Point);

        // Destination has its own unrelated material table.
        let mut dest = StrokeObject::new("dest");
        dest.materials_mut().add("paper");
        let mut layer = Layer::new("lines");
        layer.drawing = Drawing::new(CurvePartition::single(1), vec![Vec3::ZERO]);
        dest.add_layer(layer);

        paste(&mut dest, &clipboard, false).unwrap();
        // The copied curve used source slot 1 ("fill"); its identity did not
        // resolve, so a slot was appended.
        assert_eq!(dest.materials().len(), 2);
        assert_eq!(dest.materials().slot(1).unwrap().name, "fill");
        let drawing = &dest.layer(0).unwrap().drawing;
        assert_eq!(drawing.material_indices().materialize(), vec![0, 1]);
    }

    #[test]
    fn test_paste_empty_clipboard_errors() {
        let mut object = object_with_selection(&[true, true, true, true]);
        let clipboard = Clipboard::new();
        assert_eq!(
            paste(&mut object, &clipboard, false),
            Err(EditError::EmptyClipboard)
        );
    }
}
