//! Error types for the in-memory document.

use thiserror::Error;

use crate::document::ElementId;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DomError>;

/// Errors that can occur while editing or laying out a document.
#[derive(Error, Debug)]
pub enum DomError {
    /// Children can only be added to elements.
    #[error("{0:?} is not an element")]
    NotAnElement(ElementId),

    /// Inserting would make a node its own ancestor.
    #[error("cannot insert {child:?} under its own descendant {parent:?}")]
    Cycle { parent: ElementId, child: ElementId },

    /// The reference node passed to an insert is not a child of the parent.
    #[error("{0:?} is not a child of the insertion parent")]
    NotAChild(ElementId),

    /// A selector could not be parsed.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// Flow layout failed.
    #[error("layout error: {0}")]
    Layout(#[from] taffy::TaffyError),
}
