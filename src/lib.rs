//! Namespaced view-model binding.
//!
//! # Conceptual overview
//! A host page owns one flat state store and one table of event handlers. Independently written
//! view models compose into a tree under that page, and each of them gets its own slice of both
//! without the page knowing the shape of the tree.
//!
//! ## Namespaces
//! Every view has a name and a parent, which is either another view or the [`Root`]. Its
//! namespace is the dot-joined chain of names from the root down, so a view `child` under a view
//! `list1` lives at `list1.child`. Views are never reparented; the namespace is fixed at creation.
//!
//! ## State
//! A view keeps its own model. [`View::publish`] shallowly merges a patch into it and sends a copy
//! of the whole model to the host as `{ "<namespace>": model }`. The host store is flat: nested
//! views are siblings of their parents there, not children. Models always carry the reserved
//! `name` and `namespace` keys so templates can find their own event keys.
//!
//! ## Events
//! View models declare their bindable methods statically in a [`Methods`] table.
//! [`bind_events`] installs one handler per method on the host under `"<namespace>:<method>"`;
//! the host's dispatch calls the method on the owning instance. [`View::unbind_events`] and
//! [`View::destroy`] remove them again.
//!
//! ## Hosts
//! A host implements [`Host`] and may provide a [`StateStore`], a [`HandlerTable`], both or
//! neither. Missing capabilities make the matching operations local-only, which is also what
//! happens to views without any root. [`Page`] is a complete in-memory host.
//!
//! ## Collisions
//! Two views resolving to the same namespace would overwrite each other's state and handlers.
//! The root tracks which view holds which namespace and applies its [`CollisionPolicy`].
//!
//! Everything is synchronous and runs on the host's dispatch loop; there is no scheduling of
//! its own.

mod config;
mod error;
mod events;
mod host;
mod patch;
#[cfg(test)]
mod testing;
mod tree;
mod view;

pub use config::{CollisionPolicy, Config, ConfigError};
pub use error::{BindError, DispatchError};
pub use events::{bind_all, bind_events, event_key, EventHandler, Method, Methods};
pub use host::{HandlerTable, Host, Page, PageEvent, Root, StateStore};
pub use patch::{merge, Model, NAMESPACE_KEY, NAME_KEY};
pub use tree::{
    ancestors, find_root, resolve, Ancestor, Ancestors, ViewNode, EVENT_SEPARATOR,
    NAMESPACE_SEPARATOR,
};
pub use view::{share, Shared, View, ViewId, ViewModel};
