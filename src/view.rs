use crate::config::Config;
use crate::error::BindError;
use crate::events::Methods;
use crate::host::Root;
use crate::patch::{self, Model};
use crate::tree::{self, Ancestor, ViewNode};
use core::fmt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// A unique identifier for a view.
///
/// (this is just a UUID)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u32, u16, u16, [u8; 8]);

impl ViewId {
    pub(crate) fn new() -> ViewId {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        ViewId(a, b, c, *d)
    }
}

/// A view model's connection to its host: a namespaced slice of host state plus namespaced
/// event handlers.
///
/// Views are created under a parent (another view or the [`Root`]) and a name. The name is
/// appended to the parent's namespace, so a view `child` under a view `list1` publishes its model
/// to the host state key `list1.child` and binds its methods as `list1.child:<method>`.
///
/// The local model always contains the reserved keys [`name`](patch::NAME_KEY) and
/// [`namespace`](patch::NAMESPACE_KEY).
pub struct View {
    pub(crate) node: Arc<ViewNode>,
    pub(crate) namespace: String,
    pub(crate) model: Model,
    /// Bound method names and the host keys they were installed under.
    pub(crate) bound: BTreeMap<String, String>,
    config: Config,
    destroyed: bool,
}

impl View {
    /// Creates a view under `parent` and publishes its initial model.
    ///
    /// Uses the configuration of the root the parent chain leads to, or the default configuration
    /// if there is none.
    ///
    /// # Errors
    /// Fails with [`BindError::EmptyName`] if `name` is empty, before anything reaches the host,
    /// and with any error of the initial [`publish`](View::publish).
    pub fn new(
        parent: impl Into<Ancestor>,
        name: impl Into<String>,
        initial: Model,
    ) -> Result<View, BindError> {
        let parent = parent.into();
        let config = match parent.root() {
            Some(root) => root.config().clone(),
            None => Config::default(),
        };
        View::build(Some(parent), name.into(), initial, config)
    }

    /// Creates a view with an explicit configuration instead of the root's.
    pub fn with_config(
        parent: impl Into<Ancestor>,
        name: impl Into<String>,
        initial: Model,
        config: Config,
    ) -> Result<View, BindError> {
        View::build(Some(parent.into()), name.into(), initial, config)
    }

    /// Creates a view without any parent. It keeps its model locally and never reaches a host.
    pub fn detached(name: impl Into<String>, initial: Model) -> Result<View, BindError> {
        View::build(None, name.into(), initial, Config::default())
    }

    fn build(
        parent: Option<Ancestor>,
        name: String,
        initial: Model,
        config: Config,
    ) -> Result<View, BindError> {
        if name.is_empty() {
            return Err(BindError::EmptyName);
        }

        let node = Arc::new(ViewNode::new(ViewId::new(), name, parent));
        let namespace = tree::resolve(&node);
        let mut model = initial;
        patch::refresh_reserved(&mut model, node.name(), &namespace);

        let mut view = View {
            node,
            namespace,
            model,
            bound: BTreeMap::new(),
            config,
            destroyed: false,
        };
        if view.config.publish_on_create {
            view.publish(None)?;
        }
        Ok(view)
    }

    pub fn id(&self) -> ViewId {
        self.node.id()
    }

    pub fn name(&self) -> &str {
        self.node.name()
    }

    /// The fully-qualified namespace, e.g. `list1.child`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The root host this view's chain leads to.
    pub fn root(&self) -> Option<Root> {
        tree::find_root(&self.node)
    }

    /// The ancestor handle to create child views with.
    pub fn as_ancestor(&self) -> Ancestor {
        Ancestor::View(Arc::clone(&self.node))
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn ensure_live(&self) -> Result<(), BindError> {
        if self.destroyed {
            Err(BindError::Destroyed {
                namespace: self.namespace.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Tears the view down.
    ///
    /// Removes all bound events, clears the model down to the reserved keys and, if configured,
    /// publishes the cleared model so the host does not keep stale state. Afterwards the view
    /// is inert: [`publish`](View::publish) and binding fail with [`BindError::Destroyed`].
    ///
    /// Destroying twice does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.unbind_events(None);
        self.model.clear();
        patch::refresh_reserved(&mut self.model, self.node.name(), &self.namespace);

        if let Some(root) = self.root() {
            // a view that took over our namespace owns the host slot now
            if self.config.publish_on_destroy && root.holder(&self.namespace) == Some(self.id()) {
                self.deliver(&root, self.model.clone());
            }
            root.release(&self.namespace, self.id());
        }

        self.destroyed = true;
        tracing::debug!(namespace = %self.namespace, "Destroyed view");
    }
}

impl Drop for View {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        self.unbind_events(None);
        if let Some(root) = self.root() {
            root.release(&self.namespace, self.id());
        }
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id())
            .field("namespace", &self.namespace)
            .field("model", &self.model)
            .field("bound", &self.bound)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

/// An application view model that owns a [`View`].
///
/// ```
/// use nsview::{bind_events, share, Methods, Model, Page, Root, View, ViewModel};
/// use serde_json::{json, Value};
/// use std::sync::Arc;
///
/// struct List {
///     view: View,
///     items: Vec<u64>,
/// }
///
/// impl List {
///     fn add(&mut self, _args: &[Value]) {
///         self.items.push(self.items.len() as u64);
///         let items = self.items.clone();
///         self.view.publish_value(json!({ "items": items })).unwrap();
///     }
/// }
///
/// impl ViewModel for List {
///     fn view(&self) -> &View { &self.view }
///     fn view_mut(&mut self) -> &mut View { &mut self.view }
///     fn methods() -> Methods<Self> {
///         Methods::new().with("add", List::add)
///     }
/// }
///
/// let page = Arc::new(Page::new());
/// let root = Root::new(page.clone());
/// let view = View::new(&root, "list1", Model::new()).unwrap();
/// let list = share(List { view, items: vec![] });
/// bind_events(&list, &["add"]).unwrap();
///
/// page.dispatch("list1:add", &[]).unwrap();
/// assert_eq!(page.get("list1").unwrap()["items"], json!([0]));
/// ```
pub trait ViewModel: Send + Sized + 'static {
    fn view(&self) -> &View;

    fn view_mut(&mut self) -> &mut View;

    /// The methods events may be bound to.
    fn methods() -> Methods<Self>;
}

/// A shared view model, as handed to [`bind_events`](crate::bind_events).
pub type Shared<T> = Arc<Mutex<T>>;

pub fn share<T: ViewModel>(model: T) -> Shared<T> {
    Arc::new(Mutex::new(model))
}
