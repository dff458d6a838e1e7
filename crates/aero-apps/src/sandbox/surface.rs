//! Document surfaces: the host seam and the per-module private scope.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Opaque node handle on the host surface.
pub type NodeId = u64;

/// Host document operations the runtime is allowed to reach.
///
/// The real host backs this with live DOM nodes; tests use
/// [`MemorySurface`].
pub trait HostSurface {
    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;
    /// Append `child` under `parent`.
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    /// Document head.
    fn head(&self) -> NodeId;
    /// Document body.
    fn body(&self) -> NodeId;
    /// Document root element.
    fn document_element(&self) -> NodeId;
    /// Resolve a selector against the whole document.
    fn query_selector(&mut self, selector: &str) -> Option<NodeId>;
    /// Resolve a selector inside the subtree rooted at `root`.
    fn query_selector_in(&mut self, root: NodeId, selector: &str) -> Option<NodeId>;
}

/// In-memory tree surface for native runs and tests.
#[derive(Default)]
pub struct MemorySurface {
    tags: HashMap<NodeId, String>,
    children: HashMap<NodeId, Vec<NodeId>>,
    next_id: NodeId,
    root: NodeId,
    head: NodeId,
    body: NodeId,
}

impl MemorySurface {
    pub fn new() -> Self {
        let mut surface = Self {
            tags: HashMap::new(),
            children: HashMap::new(),
            next_id: 1,
            root: 0,
            head: 0,
            body: 0,
        };
        surface.root = surface.alloc("html");
        surface.head = surface.alloc("head");
        surface.body = surface.alloc("body");
        let (root, head, body) = (surface.root, surface.head, surface.body);
        surface.append_child(root, head);
        surface.append_child(root, body);
        surface
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.tags.insert(id, tag.to_string());
        self.children.insert(id, Vec::new());
        id
    }

    /// Tag of a node, for assertions.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.tags.get(&node).map(String::as_str)
    }

    /// Direct children of a node, for assertions.
    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        self.children.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn find_in(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        if self.tags.get(&root).map(String::as_str) == Some(tag) {
            return Some(root);
        }
        for child in self.children.get(&root).cloned().unwrap_or_default() {
            if let Some(found) = self.find_in(child, tag) {
                return Some(found);
            }
        }
        None
    }
}

impl HostSurface for MemorySurface {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(tag)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.children.entry(parent).or_default().push(child);
    }

    fn head(&self) -> NodeId {
        self.head
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn document_element(&self) -> NodeId {
        self.root
    }

    fn query_selector(&mut self, selector: &str) -> Option<NodeId> {
        self.find_in(self.root, selector)
    }

    fn query_selector_in(&mut self, root: NodeId, selector: &str) -> Option<NodeId> {
        self.find_in(root, selector)
    }
}

/// Document view handed to a module.
///
/// Sandboxed, `head`/`body`/`document_element` and selector lookups resolve
/// inside a private detached subtree; everything a module mounts there never
/// reaches the live document unless the host attaches the scope root itself.
/// Passthrough (sandbox opt-out) forwards every call to the host surface.
pub struct DocumentSurface {
    host: Rc<RefCell<dyn HostSurface>>,
    scope: Option<Scope>,
}

struct Scope {
    root: NodeId,
    head: NodeId,
}

impl DocumentSurface {
    /// Build a private scope: a detached root with its own head.
    pub fn sandboxed(host: Rc<RefCell<dyn HostSurface>>) -> Self {
        let scope = {
            let mut h = host.borrow_mut();
            let root = h.create_element("div");
            let head = h.create_element("div");
            h.append_child(root, head);
            Scope { root, head }
        };
        Self {
            host,
            scope: Some(scope),
        }
    }

    /// Forward everything to the host document.
    pub fn passthrough(host: Rc<RefCell<dyn HostSurface>>) -> Self {
        Self { host, scope: None }
    }

    pub fn is_sandboxed(&self) -> bool {
        self.scope.is_some()
    }

    pub fn head(&self) -> NodeId {
        match &self.scope {
            Some(scope) => scope.head,
            None => self.host.borrow().head(),
        }
    }

    /// Mount point for module content (the scope root when sandboxed).
    pub fn body(&self) -> NodeId {
        match &self.scope {
            Some(scope) => scope.root,
            None => self.host.borrow().body(),
        }
    }

    pub fn document_element(&self) -> NodeId {
        match &self.scope {
            Some(scope) => scope.root,
            None => self.host.borrow().document_element(),
        }
    }

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.host.borrow_mut().create_element(tag)
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.host.borrow_mut().append_child(parent, child);
    }

    /// Selector lookup; `head` and `body` resolve to the scope when
    /// sandboxed, anything else searches the scope subtree.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        match &self.scope {
            Some(scope) => match selector {
                "head" => Some(scope.head),
                "body" => Some(scope.root),
                _ => self
                    .host
                    .borrow_mut()
                    .query_selector_in(scope.root, selector),
            },
            None => self.host.borrow_mut().query_selector(selector),
        }
    }
}
