//! Stroke data model - curve batches with per-point and per-curve attributes
//!
//! This crate provides the core data types for the stroke editing engine:
//! - [`partition::CurvePartition`] - The offsets table mapping curves to point ranges
//! - [`attributes::AttributeStore`] - Named typed arrays per domain with default fill
//! - [`mask::IndexMask`] - Ordered index sets and maximal-run utilities
//! - [`drawing::Drawing`] - One frame's worth of curve geometry
//! - [`object::StrokeObject`] - Layers, editability, and the material table
//! - [`materials`] - Stable material identities and slot bookkeeping

pub mod attributes;
pub mod drawing;
pub mod mask;
pub mod materials;
pub mod object;
pub mod partition;

pub use attributes::*;
pub use drawing::*;
pub use mask::*;
pub use materials::*;
pub use object::*;
pub use partition::*;
