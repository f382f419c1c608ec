//! Ownership chain of a view and namespace resolution.

use crate::host::Root;
use crate::view::ViewId;
use core::fmt;
use std::sync::Arc;

/// Joins namespace segments, e.g. `list1.child`.
pub const NAMESPACE_SEPARATOR: &str = ".";

/// Joins a namespace and a method name in event keys, e.g. `list1.child:add`.
pub const EVENT_SEPARATOR: &str = ":";

/// The immutable identity of a view: who it is and who owns it.
///
/// Children keep their parent's node alive through [`Ancestor::View`]; a node never holds its
/// children, so chains cannot form cycles.
pub struct ViewNode {
    id: ViewId,
    name: String,
    parent: Option<Ancestor>,
}

impl ViewNode {
    pub(crate) fn new(id: ViewId, name: String, parent: Option<Ancestor>) -> ViewNode {
        ViewNode { id, name, parent }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Ancestor> {
        self.parent.as_ref()
    }
}

impl fmt::Debug for ViewNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ViewNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .finish()
    }
}

/// The parent of a view: either another view or the root host.
#[derive(Clone)]
pub enum Ancestor {
    View(Arc<ViewNode>),
    Root(Root),
}

impl Ancestor {
    /// The namespace children of this ancestor extend. Empty for the root.
    pub fn namespace(&self) -> String {
        match self {
            Ancestor::View(node) => resolve(node),
            Ancestor::Root(_) => String::new(),
        }
    }

    /// The root at the top of this ancestor's chain, if there is one.
    pub fn root(&self) -> Option<Root> {
        match self {
            Ancestor::View(node) => find_root(node),
            Ancestor::Root(root) => Some(root.clone()),
        }
    }
}

impl fmt::Debug for Ancestor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ancestor::View(node) => write!(f, "View({:?})", node.name),
            Ancestor::Root(root) => write!(f, "{:?}", root),
        }
    }
}

impl From<Root> for Ancestor {
    fn from(root: Root) -> Self {
        Ancestor::Root(root)
    }
}

impl From<&Root> for Ancestor {
    fn from(root: &Root) -> Self {
        Ancestor::Root(root.clone())
    }
}

impl From<Arc<ViewNode>> for Ancestor {
    fn from(node: Arc<ViewNode>) -> Self {
        Ancestor::View(node)
    }
}

/// Iterates over a view node and its view ancestors, leaf first.
pub struct Ancestors<'a> {
    next: Option<&'a ViewNode>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ViewNode;

    fn next(&mut self) -> Option<&'a ViewNode> {
        let node = self.next?;
        self.next = match &node.parent {
            Some(Ancestor::View(parent)) => Some(&**parent),
            Some(Ancestor::Root(_)) | None => None,
        };
        Some(node)
    }
}

/// Returns the node followed by all its view ancestors.
pub fn ancestors(node: &ViewNode) -> Ancestors<'_> {
    Ancestors { next: Some(node) }
}

/// Resolves the fully-qualified namespace of a node: its ancestors' names joined root to leaf.
///
/// A segment only gets a separator if the namespace before it is non-empty, so a view directly
/// under the root (or without any parent) resolves to its own name.
pub fn resolve(node: &ViewNode) -> String {
    let mut segments: Vec<&str> = ancestors(node).map(ViewNode::name).collect();
    segments.reverse();

    let mut namespace = String::new();
    for segment in segments {
        if !namespace.is_empty() {
            namespace.push_str(NAMESPACE_SEPARATOR);
        }
        namespace.push_str(segment);
    }
    namespace
}

/// Walks up the chain until the root. Returns None for detached chains.
pub fn find_root(node: &ViewNode) -> Option<Root> {
    match ancestors(node).last().and_then(|top| top.parent.as_ref()) {
        Some(Ancestor::Root(root)) => Some(root.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Page;

    fn chain(top: Option<Ancestor>, names: &[&str]) -> Arc<ViewNode> {
        let mut parent = top;
        let mut last = None;
        for name in names {
            let node = Arc::new(ViewNode::new(ViewId::new(), name.to_string(), parent.take()));
            parent = Some(Ancestor::View(Arc::clone(&node)));
            last = Some(node);
        }
        last.expect("chain needs at least one name")
    }

    #[test]
    fn resolve_joins_root_to_leaf() {
        let root = Root::new(Arc::new(Page::new()));
        let leaf = chain(Some(root.into()), &["a", "b", "c"]);
        assert_eq!(resolve(&leaf), "a.b.c");

        let names: Vec<_> = ancestors(&leaf).map(ViewNode::name).collect();
        assert_eq!(names, ["c", "b", "a"], "ancestors should go leaf first");
    }

    #[test]
    fn resolve_single_segment() {
        let root = Root::new(Arc::new(Page::new()));
        let node = chain(Some(Ancestor::from(&root)), &["list1"]);
        assert_eq!(resolve(&node), "list1", "no leading separator under the root");
        assert_eq!(Ancestor::Root(root).namespace(), "");
    }

    #[test]
    fn detached_chain_has_no_root() {
        let leaf = chain(None, &["offline", "inner"]);
        assert_eq!(resolve(&leaf), "offline.inner");
        assert!(find_root(&leaf).is_none());
    }

    #[test]
    fn root_is_found_from_any_depth() {
        let root = Root::new(Arc::new(Page::new()));
        let leaf = chain(Some(Ancestor::from(&root)), &["a", "b", "c", "d"]);
        let found = find_root(&leaf).expect("chain should reach the root");
        assert!(found.same_root(&root));

        let parent = leaf.parent().expect("leaf has a parent");
        assert_eq!(parent.namespace(), "a.b.c");
        assert!(parent.root().expect("parent reaches the root").same_root(&root));
    }
}
