use crate::config::{CollisionPolicy, Config};
use crate::error::{BindError, DispatchError};
use crate::events::EventHandler;
use crate::patch::Model;
use crate::view::ViewId;
use core::fmt;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The host's persistent UI state.
pub trait StateStore: Send + Sync {
    /// Merges `update` into the stored state, last write wins per key.
    fn set_data(&self, update: Model);
}

/// The host's event lookup surface, consulted by the host's own dispatch mechanism.
pub trait HandlerTable: Send + Sync {
    fn insert(&self, key: String, handler: EventHandler);
    fn remove(&self, key: &str);
}

/// A host page that views bind to.
///
/// Both capabilities are optional; a host lacking one turns the corresponding publish or bind
/// into a local-only operation.
pub trait Host: Send + Sync {
    fn state_store(&self) -> Option<&dyn StateStore> {
        None
    }

    fn handler_table(&self) -> Option<&dyn HandlerTable> {
        None
    }
}

/// A host without any capabilities.
impl Host for () {}

/// Connects a tree of views to a host.
///
/// Cloning is cheap; every clone refers to the same host and the same namespace claims.
#[derive(Clone)]
pub struct Root {
    inner: Arc<RootInner>,
}

struct RootInner {
    host: Arc<dyn Host>,
    config: Config,
    /// The view instance each namespace currently belongs to. Owned by us, not the host.
    claims: Mutex<HashMap<String, ViewId>>,
    /// The view that installed each handler key.
    installed: Mutex<HashMap<String, ViewId>>,
}

impl Root {
    /// Creates a root with the default configuration.
    pub fn new(host: Arc<dyn Host>) -> Root {
        Root::with_config(host, Config::default())
    }

    pub fn with_config(host: Arc<dyn Host>, config: Config) -> Root {
        Root {
            inner: Arc::new(RootInner {
                host,
                config,
                claims: Mutex::new(HashMap::new()),
                installed: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.inner.host
    }

    /// Returns true if both handles refer to the same root.
    pub fn same_root(&self, other: &Root) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the view currently holding a namespace.
    pub fn holder(&self, namespace: &str) -> Option<ViewId> {
        self.inner.claims.lock().get(namespace).copied()
    }

    /// Sends an update to the host. Returns false if the host has no state store.
    pub(crate) fn set_data(&self, update: Model) -> bool {
        match self.inner.host.state_store() {
            Some(store) => {
                store.set_data(update);
                true
            }
            None => false,
        }
    }

    /// Returns the view that installed the handler under `key`.
    pub fn installer(&self, key: &str) -> Option<ViewId> {
        self.inner.installed.lock().get(key).copied()
    }

    /// Installs a handler on behalf of a view. Returns false if the host has no handler table.
    pub(crate) fn install(&self, key: String, handler: EventHandler, id: ViewId) -> bool {
        match self.inner.host.handler_table() {
            Some(table) => {
                self.inner.installed.lock().insert(key.clone(), id);
                table.insert(key, handler);
                true
            }
            None => false,
        }
    }

    /// Removes a handler, unless another view has installed its own under the same key since.
    pub(crate) fn uninstall(&self, key: &str, id: ViewId) {
        let mut installed = self.inner.installed.lock();
        if installed.get(key) != Some(&id) {
            return;
        }
        installed.remove(key);
        drop(installed);

        if let Some(table) = self.inner.host.handler_table() {
            table.remove(key);
        }
    }

    /// Claims a namespace for a view, applying the collision policy if another view holds it.
    pub(crate) fn claim(&self, namespace: &str, id: ViewId) -> Result<(), BindError> {
        let mut claims = self.inner.claims.lock();
        match claims.get(namespace) {
            Some(holder) if *holder == id => return Ok(()),
            Some(holder) => match self.inner.config.collision {
                CollisionPolicy::Error => {
                    return Err(BindError::NamespaceCollision {
                        namespace: namespace.to_string(),
                        holder: *holder,
                    });
                }
                CollisionPolicy::Warn => {
                    tracing::warn!(
                        namespace = %namespace,
                        holder = ?holder,
                        view = ?id,
                        "Namespace collision, newer view takes over"
                    );
                }
                CollisionPolicy::LastWriteWins => {}
            },
            None => {}
        }
        claims.insert(namespace.to_string(), id);
        Ok(())
    }

    /// Releases a namespace, unless another view has taken it over since.
    pub(crate) fn release(&self, namespace: &str, id: ViewId) {
        let mut claims = self.inner.claims.lock();
        if claims.get(namespace) == Some(&id) {
            claims.remove(namespace);
        }
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Root({:p})", Arc::as_ptr(&self.inner))
    }
}

/// An event waiting in a [`Page`] queue.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEvent {
    pub key: String,
    pub args: Vec<Value>,
}

/// A complete in-memory host: a flat state map, a handler table and an event queue.
///
/// Useful for tests, and as a model of what a real host page has to provide.
pub struct Page {
    data: Mutex<Model>,
    handlers: Mutex<HashMap<String, EventHandler>>,
    event_send: Sender<PageEvent>,
    event_recv: Receiver<PageEvent>,
}

impl Page {
    pub fn new() -> Page {
        let (event_send, event_recv) = channel::unbounded();

        Page {
            data: Mutex::new(Model::new()),
            handlers: Mutex::new(HashMap::new()),
            event_send,
            event_recv,
        }
    }

    /// A snapshot of the whole page state.
    pub fn data(&self) -> Model {
        self.data.lock().clone()
    }

    /// A single state entry.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.lock().get(key).cloned()
    }

    /// All installed handler keys, sorted.
    pub fn handler_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.handlers.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn has_handler(&self, key: &str) -> bool {
        self.handlers.lock().contains_key(key)
    }

    /// Calls the handler installed under `key`.
    ///
    /// The table is not locked while the handler runs, so handlers may bind and unbind.
    pub fn dispatch(&self, key: &str, args: &[Value]) -> Result<(), DispatchError> {
        let handler = self.handlers.lock().get(key).cloned();
        match handler {
            Some(handler) => {
                tracing::trace!(key = %key, "Dispatching event");
                handler.call(args);
                Ok(())
            }
            None => Err(DispatchError::NoHandler(key.to_string())),
        }
    }

    /// Returns a sender that feeds this page's event queue.
    pub fn sender(&self) -> Sender<PageEvent> {
        self.event_send.clone()
    }

    /// Queues an event for the next [`poll`](Page::poll).
    pub fn enqueue(&self, key: impl Into<String>, args: Vec<Value>) {
        let event = PageEvent {
            key: key.into(),
            args,
        };
        if self.event_send.send(event).is_err() {
            // the page owns the receiver, so this cannot happen while the page is alive
            tracing::warn!("Page event queue is closed");
        }
    }

    /// Receives all events from the queue and dispatches them in order.
    ///
    /// Events queued by handlers during the poll are dispatched too. Returns the number of events
    /// that found a handler.
    pub fn poll(&self) -> usize {
        let mut handled = 0;
        loop {
            match self.event_recv.try_recv() {
                Ok(event) => match self.dispatch(&event.key, &event.args) {
                    Ok(()) => handled += 1,
                    Err(err) => tracing::warn!(error = %err, "Dropping page event"),
                },
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Page")
            .field("data", &*self.data.lock())
            .field("handlers", &self.handler_keys())
            .finish()
    }
}

impl StateStore for Page {
    fn set_data(&self, update: Model) {
        self.data.lock().extend(update);
    }
}

impl HandlerTable for Page {
    fn insert(&self, key: String, handler: EventHandler) {
        self.handlers.lock().insert(key, handler);
    }

    fn remove(&self, key: &str) {
        self.handlers.lock().remove(key);
    }
}

impl Host for Page {
    fn state_store(&self) -> Option<&dyn StateStore> {
        Some(self)
    }

    fn handler_table(&self) -> Option<&dyn HandlerTable> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_merges_per_key() {
        let page = Page::new();
        let mut update = Model::new();
        update.insert("a".into(), json!(1));
        update.insert("b".into(), json!(2));
        page.set_data(update);

        let mut update = Model::new();
        update.insert("a".into(), json!({ "x": 3 }));
        page.set_data(update);

        assert_eq!(page.get("a"), Some(json!({ "x": 3 })));
        assert_eq!(page.get("b"), Some(json!(2)), "untouched keys should survive");
    }

    #[test]
    fn dispatch_and_poll() {
        let page = Page::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        page.insert(
            "demo:add".into(),
            EventHandler::new(move |args: &[Value]| recorded.lock().push(args.to_vec())),
        );

        page.dispatch("demo:add", &[json!(1)]).unwrap();
        assert_eq!(
            page.dispatch("demo:remove", &[]),
            Err(DispatchError::NoHandler("demo:remove".into()))
        );

        page.enqueue("demo:add", vec![json!(2)]);
        page.sender()
            .send(PageEvent {
                key: "demo:missing".into(),
                args: Vec::new(),
            })
            .unwrap();
        page.enqueue("demo:add", vec![json!(3)]);
        assert_eq!(page.poll(), 2, "the unknown key should be dropped");
        assert_eq!(page.poll(), 0, "queue should be drained");

        assert_eq!(
            *calls.lock(),
            vec![vec![json!(1)], vec![json!(2)], vec![json!(3)]],
            "events should run in queue order"
        );
    }

    #[test]
    fn claims_follow_policy() {
        let a = ViewId::new();
        let b = ViewId::new();

        let strict = Root::new(Arc::new(Page::new()));
        strict.claim("list", a).unwrap();
        strict.claim("list", a).unwrap();
        assert_eq!(
            strict.claim("list", b),
            Err(BindError::NamespaceCollision {
                namespace: "list".into(),
                holder: a,
            })
        );
        strict.release("list", b);
        assert_eq!(strict.holder("list"), Some(a), "only the holder may release");
        strict.release("list", a);
        assert_eq!(strict.holder("list"), None);

        let config = Config {
            collision: CollisionPolicy::LastWriteWins,
            ..Config::default()
        };
        let lenient = Root::with_config(Arc::new(Page::new()), config);
        lenient.claim("list", a).unwrap();
        lenient.claim("list", b).unwrap();
        assert_eq!(lenient.holder("list"), Some(b));
    }

    #[test]
    fn keys_are_removed_only_by_their_installer() {
        let page = Arc::new(Page::new());
        let root = Root::new(page.clone());
        let a = ViewId::new();
        let b = ViewId::new();

        root.install("list:add".into(), EventHandler::new(|_: &[Value]| {}), a);
        root.install("list:add".into(), EventHandler::new(|_: &[Value]| {}), b);
        assert_eq!(root.installer("list:add"), Some(b));

        root.uninstall("list:add", a);
        assert!(page.has_handler("list:add"), "a reinstalled key belongs to the newer view");

        root.uninstall("list:add", b);
        assert!(!page.has_handler("list:add"));
        assert_eq!(root.installer("list:add"), None);
    }

    #[test]
    fn host_without_capabilities() {
        let root = Root::new(Arc::new(()));
        assert!(!root.set_data(Model::new()));
        let id = ViewId::new();
        assert!(!root.install("x:y".into(), EventHandler::new(|_: &[Value]| {}), id));
        assert_eq!(root.installer("x:y"), None);
        root.uninstall("x:y", id);
    }
}
