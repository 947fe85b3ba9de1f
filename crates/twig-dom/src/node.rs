//! Element Node
//!
//! A node is either a text leaf or a tagged element with ordered children.
//! Nodes are shared handles (`Rc`); the parent link is weak and reassigned
//! whenever the node is attached to a different parent.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::document::DocumentInner;
use crate::reactive::Producer;
use crate::{
    Diagnostic, Document, DomError, DomResult, EventKind, NodeId, Reactive, ScopeNames,
    ScopeRegistry, Surface, SurfaceId, TagKind,
};

/// Event handler: receives mutable application state and the node it fired on
pub type Handler<S> = Rc<dyn Fn(&mut S, &Node<S>)>;

pub(crate) struct NodeInner<S> {
    pub(crate) id: NodeId,
    pub(crate) kind: TagKind,
    pub(crate) text: Option<String>,
    pub(crate) owner: Weak<DocumentInner<S>>,
    pub(crate) children: RefCell<Vec<Node<S>>>,
    pub(crate) parent: RefCell<Weak<NodeInner<S>>>,
    pub(crate) surface: Cell<Option<SurfaceId>>,
    /// Set only on reactive nodes
    pub(crate) producer: RefCell<Option<Producer<S>>>,
    pub(crate) scopes: RefCell<Vec<String>>,
}

/// Shared handle to a tree node
pub struct Node<S>(pub(crate) Rc<NodeInner<S>>);

/// Constructor input: literal text, an existing node, or a deferred
/// producer whose results are spliced in at construction time
pub enum Child<S> {
    Text(String),
    Node(Node<S>),
    Thunk(Box<dyn FnOnce(&Document<S>) -> Vec<Child<S>>>),
}

impl<S> Child<S> {
    /// Deferred children, evaluated once when the parent is constructed
    pub fn thunk<F>(f: F) -> Self
    where
        F: FnOnce(&Document<S>) -> Vec<Child<S>> + 'static,
    {
        Child::Thunk(Box::new(f))
    }
}

impl<S> From<&str> for Child<S> {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl<S> From<String> for Child<S> {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl<S> From<&String> for Child<S> {
    fn from(text: &String) -> Self {
        Child::Text(text.clone())
    }
}

impl<S> From<Node<S>> for Child<S> {
    fn from(node: Node<S>) -> Self {
        Child::Node(node)
    }
}

impl<S> From<Reactive<S>> for Child<S> {
    fn from(node: Reactive<S>) -> Self {
        Child::Node(node.into_node())
    }
}

impl<S> Clone for Node<S> {
    fn clone(&self) -> Self {
        Node(self.0.clone())
    }
}

impl<S> PartialEq for Node<S> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<S> Eq for Node<S> {}

impl<S> Drop for NodeInner<S> {
    fn drop(&mut self) {
        if let (Some(sid), Some(doc)) = (self.surface.get(), self.owner.upgrade()) {
            doc.release_surface(sid);
        }
    }
}

impl<S> std::fmt::Debug for Node<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .field("text", &self.0.text)
            .field("children", &self.0.children.borrow().len())
            .field("reactive", &self.0.producer.borrow().is_some())
            .finish()
    }
}

impl<S: 'static> Node<S> {
    fn with_parts(
        doc: &Document<S>,
        kind: TagKind,
        text: Option<String>,
        children: Vec<Node<S>>,
    ) -> Self {
        Node(Rc::new(NodeInner {
            id: doc.next_id(),
            kind,
            text,
            owner: doc.downgrade(),
            children: RefCell::new(children),
            parent: RefCell::new(Weak::new()),
            surface: Cell::new(None),
            producer: RefCell::new(None),
            scopes: RefCell::new(Vec::new()),
        }))
    }

    /// Text leaf rendered inside an element of `kind`
    pub fn leaf(doc: &Document<S>, kind: TagKind, text: impl Into<String>) -> Self {
        Self::with_parts(doc, kind, Some(text.into()), Vec::new())
    }

    /// Build an unmaterialized node, flattening `children`:
    /// text becomes a leaf of the same kind, thunks are invoked and their
    /// results spliced in, nodes are taken as-is.
    pub fn construct(doc: &Document<S>, kind: TagKind, children: Vec<Child<S>>) -> Self {
        let mut nodes = Vec::with_capacity(children.len());
        flatten(doc, kind, children, &mut nodes);
        Self::with_parts(doc, kind, None, nodes)
    }

    pub(crate) fn upgrade(weak: &Weak<NodeInner<S>>) -> Option<Self> {
        weak.upgrade().map(Node)
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn kind(&self) -> TagKind {
        self.0.kind
    }

    /// Text payload of a leaf
    pub fn text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    /// Snapshot of the children
    pub fn children(&self) -> Vec<Node<S>> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn parent(&self) -> Option<Node<S>> {
        Self::upgrade(&self.0.parent.borrow())
    }

    pub(crate) fn set_parent(&self, parent: &Node<S>) {
        *self.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
    }

    pub(crate) fn take_children(&self) -> Vec<Node<S>> {
        std::mem::take(&mut *self.0.children.borrow_mut())
    }

    /// Rendered surface handle, `None` before `create`
    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.0.surface.get()
    }

    pub fn is_materialized(&self) -> bool {
        self.0.surface.get().is_some()
    }

    pub fn is_reactive(&self) -> bool {
        self.0.producer.borrow().is_some()
    }

    pub fn as_reactive(&self) -> Option<Reactive<S>> {
        self.is_reactive().then(|| Reactive(self.clone()))
    }

    /// Owning document
    pub fn document(&self) -> DomResult<Document<S>> {
        self.0
            .owner
            .upgrade()
            .map(Document::from_inner)
            .ok_or(DomError::DocumentDropped)
    }

    /// Closest reactive node strictly above this one
    pub fn nearest_reactive_ancestor(&self) -> Option<Reactive<S>> {
        let mut next = self.parent();
        while let Some(node) = next {
            if let Some(reactive) = node.as_reactive() {
                return Some(reactive);
            }
            next = node.parent();
        }
        None
    }

    /// Materialize the surface and adopt the children.
    ///
    /// Calling this twice creates a second surface element and re-parents
    /// the children into it; `destroy` the node first when re-creating.
    pub fn create(&self) -> DomResult<()> {
        let doc = self.document()?;
        self.create_in(&doc);
        Ok(())
    }

    pub(crate) fn create_in(&self, doc: &Document<S>) {
        let children = self.children();
        for child in &children {
            if !child.is_text() && !child.is_materialized() {
                child.create_in(doc);
            }
        }

        let sid = {
            let mut surface = doc.surface_mut();
            let sid = surface.create_element(self.kind());
            for child in &children {
                match (child.text(), child.surface_id()) {
                    (Some(text), _) => surface.append_text(sid, text),
                    (None, Some(child_sid)) => surface.append_child(sid, child_sid),
                    (None, None) => {}
                }
            }
            sid
        };

        self.0.surface.set(Some(sid));
        for child in &children {
            child.set_parent(self);
        }
    }

    /// Empty the rendered surface.
    ///
    /// Scope subscriptions of reactive descendants are left in place; call
    /// [`Reactive::clear_child_scopes`] first when discarding such a subtree.
    pub fn destroy(&self) -> DomResult<()> {
        let doc = self.document()?;
        let sid = self.surface_id().ok_or(DomError::NotMaterialized(self.id()))?;
        doc.surface_mut().remove_children(sid);
        Ok(())
    }

    /// Run `f` against this node's surface element, recording a diagnostic
    /// if there is none
    fn with_surface(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut dyn Surface, SurfaceId),
    ) {
        let Ok(doc) = self.document() else {
            tracing::warn!(node = %self.id(), operation, "document dropped");
            return;
        };
        let Some(sid) = self.surface_id() else {
            tracing::warn!(node = %self.id(), operation, "node has no rendered surface");
            doc.record(Diagnostic::Unmaterialized {
                node: self.id(),
                operation,
            });
            return;
        };
        let mut surface = doc.surface_mut();
        f(&mut **surface, sid);
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.with_surface("attr", |surface, sid| surface.set_attribute(sid, name, value));
        self
    }

    /// Add a class; empty names are ignored
    pub fn class(self, name: &str) -> Self {
        if !name.is_empty() {
            self.with_surface("class", |surface, sid| surface.add_class(sid, name));
        }
        self
    }

    fn listen(&self, event: EventKind, listener: impl Fn() + 'static) {
        self.with_surface("listen", |surface, sid| {
            surface.add_event_listener(sid, event, Rc::new(listener));
        });
    }

    /// Attach a handler with no re-render side effect
    pub fn handle<F>(self, event: impl Into<EventKind>, handler: F) -> Self
    where
        F: Fn(&mut S, &Node<S>) + 'static,
    {
        let handler: Handler<S> = Rc::new(handler);
        let weak = Rc::downgrade(&self.0);
        self.listen(event.into(), move || {
            if let Some(node) = Node::upgrade(&weak) {
                node.fire(&handler);
            }
        });
        self
    }

    /// Attach a handler, then re-render the nearest reactive ancestor
    pub fn handle_local<F>(self, event: impl Into<EventKind>, handler: F) -> Self
    where
        F: Fn(&mut S, &Node<S>) + 'static,
    {
        let event = event.into();
        let handler: Handler<S> = Rc::new(handler);
        let weak = Rc::downgrade(&self.0);
        let fired = event.clone();
        self.listen(event, move || {
            let Some(node) = Node::upgrade(&weak) else {
                return;
            };
            if let Some(doc) = node.fire(&handler) {
                node.propagate_local(&doc, &fired);
            }
        });
        self
    }

    /// Attach a handler, then re-render every node subscribed to `scopes`
    pub fn handle_scoped<F>(
        self,
        scopes: impl ScopeNames,
        event: impl Into<EventKind>,
        handler: F,
    ) -> Self
    where
        F: Fn(&mut S, &Node<S>) + 'static,
    {
        let scopes = scopes.into_names();
        let handler: Handler<S> = Rc::new(handler);
        let weak = Rc::downgrade(&self.0);
        self.listen(event.into(), move || {
            let Some(node) = Node::upgrade(&weak) else {
                return;
            };
            if let Some(doc) = node.fire(&handler) {
                doc.broadcast(&scopes);
            }
        });
        self
    }

    /// Run the handler with exclusive access to state
    pub(crate) fn fire(&self, handler: &Handler<S>) -> Option<Document<S>> {
        let doc = self.document().ok()?;
        doc.update(|state| handler(state, self));
        Some(doc)
    }

    fn propagate_local(&self, doc: &Document<S>, event: &EventKind) {
        match self.nearest_reactive_ancestor() {
            Some(ancestor) => {
                doc.react_logged(&ancestor);
            }
            None => {
                tracing::warn!(node = %self.id(), %event, "no reactive ancestor to react");
                doc.record(Diagnostic::NoReactiveAncestor {
                    node: self.id(),
                    event: event.clone(),
                });
            }
        }
    }

    /// Unsubscribe every reactive node in this subtree, children first
    pub(crate) fn unsubscribe_tree(&self, registry: &mut ScopeRegistry<S>) {
        for child in self.0.children.borrow().iter() {
            child.unsubscribe_tree(registry);
        }
        if self.is_reactive() {
            let names = std::mem::take(&mut *self.0.scopes.borrow_mut());
            registry.remove_node(self.id(), &names);
        }
    }
}

fn flatten<S: 'static>(
    doc: &Document<S>,
    kind: TagKind,
    children: Vec<Child<S>>,
    out: &mut Vec<Node<S>>,
) {
    for child in children {
        match child {
            Child::Text(text) => out.push(Node::leaf(doc, kind, text)),
            Child::Node(node) => out.push(node),
            Child::Thunk(produce) => flatten(doc, kind, produce(doc), out),
        }
    }
}
