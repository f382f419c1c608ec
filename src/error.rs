//! Errors.

use crate::view::ViewId;
use thiserror::Error;

/// Errors raised while publishing or binding a view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// Views need a non-empty name; it is their namespace segment.
    #[error("every view needs a non-empty name as its namespace segment")]
    EmptyName,

    /// Another view instance already holds this namespace under the same root.
    #[error("namespace `{namespace}` is already held by view {holder:?}")]
    NamespaceCollision { namespace: String, holder: ViewId },

    /// The view was destroyed and can no longer reach its host.
    #[error("view `{namespace}` has been destroyed")]
    Destroyed { namespace: String },

    /// A patch given as a JSON value was not an object.
    #[error("patch must be a JSON object, got {found}")]
    PatchNotObject { found: &'static str },
}

/// Errors raised by the in-memory host while dispatching events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no handler installed for `{0}`")]
    NoHandler(String),
}
