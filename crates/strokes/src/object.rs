//! Layered stroke objects: the editing unit that batch operations walk.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::drawing::Drawing;
use crate::materials::MaterialTable;

/// One named layer holding a drawing and its object-space placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub selected: bool,
    pub locked: bool,
    pub hidden: bool,
    pub transform: Mat4,
    pub drawing: Drawing,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selected: false,
            locked: false,
            hidden: false,
            transform: Mat4::IDENTITY,
            drawing: Drawing::empty(),
        }
    }

    /// Whether edits may touch this layer's drawing
    pub fn is_editable(&self) -> bool {
        !self.locked && !self.hidden
    }
}

/// A stroke object: an ordered layer stack plus its material slots.
///
/// Curve material indices are only meaningful against this object's
/// [`MaterialTable`]; cross-object moves go through stable material ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeObject {
    pub name: String,
    layers: Vec<Layer>,
    materials: MaterialTable,
    active_layer: Option<usize>,
    active_material: usize,
}

impl StrokeObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Append a layer and make it active; returns its index
    pub fn add_layer(&mut self, layer: Layer) -> usize {
        self.layers.push(layer);
        let index = self.layers.len() - 1;
        self.active_layer = Some(index);
        index
    }

    pub fn find_layer(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name == name)
    }

    pub fn active_layer(&self) -> Option<usize> {
        self.active_layer
    }

    pub fn set_active_layer(&mut self, index: Option<usize>) {
        debug_assert!(index.is_none_or(|i| i < self.layers.len()));
        self.active_layer = index;
    }

    /// Indices of layers edits may touch
    pub fn editable_layers(&self) -> impl Iterator<Item = usize> + '_ {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.is_editable())
            .map(|(index, _)| index)
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialTable {
        &mut self.materials
    }

    /// Slot index newly drawn curves take
    pub fn active_material(&self) -> usize {
        self.active_material
    }

    pub fn set_active_material(&mut self, index: usize) {
        debug_assert!(index < self.materials.len().max(1));
        self.active_material = index;
    }

    /// Drop material slots no curve references, remapping every drawing's
    /// material indices onto the compacted table. The active slot index is
    /// adjusted to follow its slot, falling back to the first slot when the
    /// active one was unused.
    pub fn remove_unused_materials(&mut self) {
        if self.materials.is_empty() {
            return;
        }
        let mut used = vec![false; self.materials.len()];
        for layer in &self.layers {
            let indices = layer.drawing.material_indices();
            for index in indices.iter() {
                let index = (index.max(0) as usize).min(used.len() - 1);
                used[index] = true;
            }
        }
        if used.iter().all(|&u| u) {
            return;
        }

        let remap = self.materials.retain_used(&used);
        self.active_material = remap
            .get(self.active_material)
            .copied()
            .unwrap_or_default();
        for layer in &mut self.layers {
            if layer.drawing.curve_count() == 0 {
                continue;
            }
            let bound = remap.len() - 1;
            for index in layer.drawing.material_indices_mut() {
                let old = ((*index).max(0) as usize).min(bound);
                *index = remap[old] as i32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::CurvePartition;
    use glam::Vec3;

    fn object_with_curves(material_indices: &[i32]) -> StrokeObject {
        let mut object = StrokeObject::new("test");
        object.materials_mut().add("a");
        object.materials_mut().add("b");
        object.materials_mut().add("c");

        let counts = vec![1; material_indices.len()];
        let positions = vec![Vec3::ZERO; material_indices.len()];
        let mut layer = Layer::new("lines");
        layer.drawing = Drawing::new(CurvePartition::from_counts(&counts), positions);
        layer
            .drawing
            .material_indices_mut()
            .copy_from_slice(material_indices);
        object.add_layer(layer);
        object
    }

    #[test]
    fn test_editable_layers_skip_locked_and_hidden() {
        let mut object = StrokeObject::new("test");
        object.add_layer(Layer::new("a"));
        object.add_layer(Layer::new("b"));
        object.add_layer(Layer::new("c"));
        object.layer_mut(0).unwrap().locked = true;
        object.layer_mut(2).unwrap().hidden = true;
        assert_eq!(object.editable_layers().collect::<Vec<_>>(), vec![1]);
        assert_eq!(object.active_layer(), Some(2));
    }

    #[test]
    fn test_remove_unused_materials_remaps_indices() {
        let mut object = object_with_curves(&[2, 2, 0]);
        object.set_active_material(2);
        object.remove_unused_materials();

        assert_eq!(object.materials().len(), 2);
        assert_eq!(object.active_material(), 1);
        let indices = object.layer(0).unwrap().drawing.material_indices().materialize();
        assert_eq!(indices, vec![1, 1, 0]);
    }

    #[test]
    fn test_remove_unused_resets_dangling_active_slot() {
        let mut object = object_with_curves(&[0, 0, 0]);
        object.set_active_material(1);
        object.remove_unused_materials();

        assert_eq!(object.materials().len(), 1);
        assert_eq!(object.active_material(), 0);
    }
}
