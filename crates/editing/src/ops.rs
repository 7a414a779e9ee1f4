//! Small per-drawing attribute operations: cyclic and cap flags, uniform
//! thickness/opacity fills, material assignment, loose-stroke cleanup.

use serde::{Deserialize, Serialize};
use strokes::{
    AttrDomain, CapStyle, Drawing, IndexMask, ATTR_CYCLIC, ATTR_END_CAP, ATTR_OPACITY,
    ATTR_RADIUS, ATTR_START_CAP, DEFAULT_OPACITY, DEFAULT_RADIUS,
};

use crate::delete::remove_curves;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclicMode {
    Close,
    Open,
    Toggle,
}

/// Set or toggle the cyclic flag of the masked curves. The attribute is
/// dropped again when every curve ends up open.
pub fn set_cyclic(drawing: &mut Drawing, curves: &IndexMask, mode: CyclicMode) -> bool {
    if curves.is_empty() {
        return false;
    }
    let mut changed = false;
    {
        let cyclic = drawing.cyclic_mut();
        for curve in curves.iter() {
            let target = match mode {
                CyclicMode::Close => true,
                CyclicMode::Open => false,
                CyclicMode::Toggle => !cyclic[curve],
            };
            if cyclic[curve] != target {
                cyclic[curve] = target;
                changed = true;
            }
        }
    }
    if mode != CyclicMode::Close && drawing.cyclic().iter().all(|c| !c) {
        drawing.attributes_mut().remove(AttrDomain::Curve, ATTR_CYCLIC);
    }
    changed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapsMode {
    /// Round caps on both ends
    Round,
    /// Flat caps on both ends
    Flat,
    ToggleStart,
    ToggleEnd,
}

/// Set or toggle the cap styles of the masked curves
pub fn set_caps(drawing: &mut Drawing, curves: &IndexMask, mode: CapsMode) -> bool {
    if curves.is_empty() {
        return false;
    }
    let count = drawing.curve_count();
    let round = CapStyle::Round as i32;
    let mut changed = false;

    let mut apply = |drawing: &mut Drawing, name: &str, f: &dyn Fn(i32) -> i32| {
        let caps = drawing
            .attributes_mut()
            .ints_for_write(AttrDomain::Curve, name, round, count);
        for curve in curves.iter() {
            let next = f(caps[curve]);
            if caps[curve] != next {
                caps[curve] = next;
                changed = true;
            }
        }
    };
    match mode {
        CapsMode::Round => {
            apply(drawing, ATTR_START_CAP, &|_| CapStyle::Round as i32);
            apply(drawing, ATTR_END_CAP, &|_| CapStyle::Round as i32);
        }
        CapsMode::Flat => {
            apply(drawing, ATTR_START_CAP, &|_| CapStyle::Flat as i32);
            apply(drawing, ATTR_END_CAP, &|_| CapStyle::Flat as i32);
        }
        CapsMode::ToggleStart => {
            apply(drawing, ATTR_START_CAP, &|cap| {
                CapStyle::from_i32(cap).toggled() as i32
            });
        }
        CapsMode::ToggleEnd => {
            apply(drawing, ATTR_END_CAP, &|cap| {
                CapStyle::from_i32(cap).toggled() as i32
            });
        }
    }
    changed
}

fn fill_point_floats(
    drawing: &mut Drawing,
    curves: &IndexMask,
    name: &str,
    default: f32,
    value: f32,
) -> bool {
    if curves.is_empty() {
        return false;
    }
    let ranges: Vec<_> = curves
        .iter()
        .map(|curve| drawing.partition().points_of(curve))
        .collect();
    let len = drawing.point_count();
    let values = drawing
        .attributes_mut()
        .floats_for_write(AttrDomain::Point, name, default, len);
    let mut changed = false;
    for range in ranges {
        for v in &mut values[range] {
            if *v != value {
                *v = value;
                changed = true;
            }
        }
    }
    changed
}

/// Give every point of the masked curves the same radius
pub fn set_uniform_thickness(drawing: &mut Drawing, curves: &IndexMask, radius: f32) -> bool {
    fill_point_floats(drawing, curves, ATTR_RADIUS, DEFAULT_RADIUS, radius)
}

/// Give every point of the masked curves the same opacity
pub fn set_uniform_opacity(drawing: &mut Drawing, curves: &IndexMask, opacity: f32) -> bool {
    fill_point_floats(drawing, curves, ATTR_OPACITY, DEFAULT_OPACITY, opacity)
}

/// Assign a material slot to the masked curves
pub fn set_material_index(drawing: &mut Drawing, curves: &IndexMask, index: usize) -> bool {
    if curves.is_empty() {
        return false;
    }
    let indices = drawing.material_indices_mut();
    let mut changed = false;
    for curve in curves.iter() {
        if indices[curve] != index as i32 {
            indices[curve] = index as i32;
            changed = true;
        }
    }
    changed
}

/// Delete the masked curves holding at most `limit` points. Returns the
/// cleaned drawing, or `None` when no curve is that short.
pub fn clean_loose(drawing: &Drawing, curves: &IndexMask, limit: usize) -> Option<Drawing> {
    let loose = IndexMask::from_predicate(0..drawing.curve_count(), |curve| {
        curves.contains(curve) && drawing.partition().size_of(curve) <= limit
    });
    if loose.is_empty() {
        return None;
    }
    Some(remove_curves(drawing, &loose))
}
