//! Operation results and the user-facing error taxonomy.

use thiserror::Error;

/// Outcome of a batch operation that ran to completion.
///
/// Empty selections, empty drawings, and nothing-editable situations are
/// `Unchanged`, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    Changed,
    Unchanged,
}

impl OpStatus {
    pub fn changed(self) -> bool {
        matches!(self, Self::Changed)
    }

    pub fn from_flag(changed: bool) -> Self {
        if changed {
            Self::Changed
        } else {
            Self::Unchanged
        }
    }
}

/// User input errors. Each is detected before any drawing is mutated; an
/// operation that returns one of these has changed nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("no layer named '{0}'")]
    LayerNotFound(String),

    #[error("layer '{0}' is locked")]
    LayerLocked(String),

    #[error("object has no active layer")]
    NoActiveLayer,

    #[error("no material named '{0}'")]
    MaterialNotFound(String),

    #[error("object has only one material")]
    SingleMaterial,

    #[error("object has only one layer")]
    SingleLayer,

    #[error("nothing selected")]
    NothingSelected,

    #[error("clipboard is empty")]
    EmptyClipboard,
}

pub type EditResult = Result<OpStatus, EditError>;
