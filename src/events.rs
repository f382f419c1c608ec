//! Exposing view methods to the host under namespaced event keys.

use crate::error::BindError;
use crate::tree::EVENT_SEPARATOR;
use crate::view::{Shared, View, ViewModel};
use core::fmt;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};

/// A handler installed on the host. Called with the event's arguments.
pub struct EventHandler(Arc<Mutex<dyn FnMut(&[Value]) + Send>>);

impl Clone for EventHandler {
    fn clone(&self) -> Self {
        EventHandler(Arc::clone(&self.0))
    }
}

impl EventHandler {
    pub fn new<F: 'static + FnMut(&[Value]) + Send>(handler: F) -> Self {
        EventHandler(Arc::new(Mutex::new(handler)))
    }

    /// Runs the handler. Must not be called from within the same handler.
    pub fn call(&self, args: &[Value]) {
        let mut handler = self.0.lock();
        (&mut *handler)(args)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EventHandler({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// A view-model method that can be bound to an event.
pub type Method<T> = fn(&mut T, &[Value]);

/// The methods a view model exposes to events, by name, in declaration order.
pub struct Methods<T> {
    entries: Vec<(&'static str, Method<T>)>,
}

impl<T> Methods<T> {
    pub fn new() -> Self {
        Methods {
            entries: Vec::new(),
        }
    }

    /// Adds a method. A later entry with the same name replaces the earlier one.
    pub fn with(mut self, name: &'static str, method: Method<T>) -> Self {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = method;
        } else {
            self.entries.push((name, method));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Method<T>> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, method)| *method)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

impl<T> Default for Methods<T> {
    fn default() -> Self {
        Methods::new()
    }
}

impl<T> fmt::Debug for Methods<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// The host key a method is bound under, e.g. `list1.child:add`.
pub fn event_key(namespace: &str, method: &str) -> String {
    let mut key = String::with_capacity(namespace.len() + EVENT_SEPARATOR.len() + method.len());
    key.push_str(namespace);
    key.push_str(EVENT_SEPARATOR);
    key.push_str(method);
    key
}

/// Binds the named methods of a view model to its root host.
///
/// Each name found in [`ViewModel::methods`] gets a handler under
/// `"<namespace>:<name>"` that calls the method on this instance. Names without a method are
/// skipped. Rebinding a name replaces its handler. Without a reachable host handler table nothing
/// is installed.
///
/// Handlers only hold a weak reference to the instance and do nothing once it is gone.
///
/// # Errors
/// - [`BindError::Destroyed`] after [`View::destroy`].
/// - [`BindError::NamespaceCollision`] if the collision policy is `Error` and another view
///   holds this namespace.
pub fn bind_events<T: ViewModel>(target: &Shared<T>, names: &[&str]) -> Result<(), BindError> {
    let methods = T::methods();
    let weak = Arc::downgrade(target);
    let mut model = target.lock();
    model.view_mut().bind_with(names, |name| {
        let method = methods.get(name)?;
        Some(forward(Weak::clone(&weak), method))
    })
}

/// Binds every method of [`ViewModel::methods`].
pub fn bind_all<T: ViewModel>(target: &Shared<T>) -> Result<(), BindError> {
    let names: Vec<&'static str> = T::methods().names().collect();
    bind_events(target, &names)
}

fn forward<T: ViewModel>(target: Weak<Mutex<T>>, method: Method<T>) -> EventHandler {
    EventHandler::new(move |args: &[Value]| match target.upgrade() {
        Some(target) => {
            let mut target = target.lock();
            method(&mut *target, args);
        }
        None => tracing::trace!("Event for a dropped view model ignored"),
    })
}

impl View {
    /// Installs a handler for every name `handler_for` yields one for.
    fn bind_with<F>(&mut self, names: &[&str], mut handler_for: F) -> Result<(), BindError>
    where
        F: FnMut(&str) -> Option<EventHandler>,
    {
        self.ensure_live()?;

        let root = match self.root() {
            Some(root) => root,
            None => {
                tracing::debug!(namespace = %self.namespace, "No root reachable, events not bound");
                return Ok(());
            }
        };
        root.claim(&self.namespace, self.id())?;

        for &name in names {
            let handler = match handler_for(name) {
                Some(handler) => handler,
                None => {
                    tracing::debug!(namespace = %self.namespace, method = %name, "No such method, skipped");
                    continue;
                }
            };

            let key = event_key(&self.namespace, name);
            if root.install(key.clone(), handler, self.id()) {
                tracing::debug!(key = %key, "Bound event");
                self.bound.insert(name.to_string(), key);
            } else {
                tracing::debug!(key = %key, "Host has no handler table, event not bound");
            }
        }
        Ok(())
    }

    /// Removes bound events from the host.
    ///
    /// With `None`, every bound event is removed; otherwise exactly the given names. Names that
    /// are not bound are ignored.
    pub fn unbind_events(&mut self, names: Option<&[&str]>) {
        let names: Vec<String> = match names {
            Some(names) => names.iter().map(|name| name.to_string()).collect(),
            None => self.bound.keys().cloned().collect(),
        };
        if names.is_empty() {
            return;
        }

        let root = self.root();
        let id = self.id();
        for name in names {
            if let Some(key) = self.bound.remove(&name) {
                if let Some(root) = &root {
                    root.uninstall(&key, id);
                }
                tracing::debug!(key = %key, "Unbound event");
            }
        }
    }

    /// The names of all currently bound methods, sorted.
    pub fn bound_events(&self) -> impl Iterator<Item = &str> + '_ {
        self.bound.keys().map(String::as_str)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bound.contains_key(name)
    }
}
