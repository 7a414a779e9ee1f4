//! Structural edit algorithms for stroke drawings.
//!
//! Everything here consumes a drawing's curve partition and attribute store
//! plus an index mask and produces a replacement, never a partial mutation:
//!
//! - Selection retrieval turning the selection attribute into masks
//! - Point/curve removal, with and without curve splitting
//! - Simplify (Ramer-Douglas-Peucker), dissolve, duplicate, extrude,
//!   reorder, subdivide, merge-by-distance, smooth, snapping
//! - The clipboard and cross-object separate
//! - The batch driver running one parallel task per editable layer

pub mod batch;
pub mod clipboard;
pub mod delete;
pub mod dissolve;
pub mod duplicate;
pub mod error;
pub mod extrude;
pub mod merge;
pub mod ops;
pub mod reorder;
pub mod selection;
pub mod separate;
pub mod simplify;
pub mod smooth;
pub mod snap;
pub mod subdivide;

pub use batch::{ChangeSink, NullSink};
pub use clipboard::Clipboard;
pub use dissolve::DissolveMode;
pub use error::{EditError, EditResult, OpStatus};
pub use ops::{CapsMode, CyclicMode};
pub use reorder::ReorderDirection;
pub use selection::SelectionDomain;
pub use separate::SeparateMode;
pub use smooth::SmoothParams;
pub use snap::{CursorSnapMode, SeedPivot};
pub use subdivide::SubdivideMode;
