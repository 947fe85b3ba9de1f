//! Document - owner of the surface, application state and scope registry
//!
//! Every node holds a weak link back to the document that created it, so
//! event handlers reach state and subscriptions without globals.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::{
    Child, DomError, DomResult, EventKind, Node, NodeId, Reactive, ScopeRegistry, Surface,
    SurfaceId, TagKind,
};

/// Recoverable conditions observed while handling events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A local handler fired on a node with no reactive ancestor
    NoReactiveAncestor { node: NodeId, event: EventKind },
    /// A reaction was aborted
    ReactionFailed { node: NodeId, error: DomError },
    /// A surface operation targeted a node without a rendered surface
    Unmaterialized { node: NodeId, operation: &'static str },
}

/// Work queued while a handler holds the state
type Deferred<S> = Box<dyn FnOnce(&Document<S>)>;

pub(crate) struct DocumentInner<S> {
    surface: RefCell<Box<dyn Surface>>,
    state: RefCell<S>,
    scopes: RefCell<ScopeRegistry<S>>,
    diagnostics: RefCell<Vec<Diagnostic>>,
    next_id: Cell<u64>,
    handling: Cell<u32>,
    deferred: RefCell<VecDeque<Deferred<S>>>,
}

impl<S> DocumentInner<S> {
    /// Give back the surface element of a dropped node, unless it is still
    /// on display or the surface is busy
    pub(crate) fn release_surface(&self, sid: SurfaceId) {
        let Ok(mut surface) = self.surface.try_borrow_mut() else {
            return;
        };
        if !surface.is_connected(sid) {
            surface.release(sid);
        }
    }
}

/// Shared handle to a document
pub struct Document<S> {
    inner: Rc<DocumentInner<S>>,
}

impl<S> Clone for Document<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> std::fmt::Debug for Document<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.inner.next_id.get())
            .field("scopes", &*self.inner.scopes.borrow())
            .field("diagnostics", &self.inner.diagnostics.borrow().len())
            .finish()
    }
}

impl<S: 'static> Document<S> {
    /// Create a document rendering onto `surface`
    pub fn new(state: S, surface: impl Surface + 'static) -> Self {
        Self {
            inner: Rc::new(DocumentInner {
                surface: RefCell::new(Box::new(surface)),
                state: RefCell::new(state),
                scopes: RefCell::new(ScopeRegistry::new()),
                diagnostics: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                handling: Cell::new(0),
                deferred: RefCell::new(VecDeque::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<DocumentInner<S>>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<DocumentInner<S>> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn next_id(&self) -> NodeId {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        NodeId(id)
    }

    /// Application state, read by producers.
    ///
    /// Panics if a handler currently holds the state mutably.
    pub fn state(&self) -> Ref<'_, S> {
        self.inner.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, S> {
        self.inner.state.borrow_mut()
    }

    /// Mutate state the way an event handler does.
    ///
    /// Broadcasts and reactions requested inside `f` run after it returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.inner.handling.set(self.inner.handling.get() + 1);
        let result = f(&mut *self.inner.state.borrow_mut());
        self.inner.handling.set(self.inner.handling.get() - 1);
        if !self.is_handling() {
            self.run_deferred();
        }
        result
    }

    /// Whether a handler currently holds the state
    pub fn is_handling(&self) -> bool {
        self.inner.handling.get() > 0
    }

    /// Run `task` now, or once the running handler has released the state
    pub fn defer(&self, task: impl FnOnce(&Document<S>) + 'static) {
        if self.is_handling() {
            self.inner.deferred.borrow_mut().push_back(Box::new(task));
        } else {
            task(self);
        }
    }

    fn run_deferred(&self) {
        loop {
            let next = self.inner.deferred.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            task(self);
        }
    }

    pub(crate) fn surface(&self) -> Ref<'_, Box<dyn Surface>> {
        self.inner.surface.borrow()
    }

    pub(crate) fn surface_mut(&self) -> RefMut<'_, Box<dyn Surface>> {
        self.inner.surface.borrow_mut()
    }

    /// Current scope subscriptions
    pub fn scopes(&self) -> Ref<'_, ScopeRegistry<S>> {
        self.inner.scopes.borrow()
    }

    pub(crate) fn scopes_mut(&self) -> RefMut<'_, ScopeRegistry<S>> {
        self.inner.scopes.borrow_mut()
    }

    /// Drop every scope subscription at once
    pub fn reset_scopes(&self) {
        self.inner.scopes.borrow_mut().clear();
    }

    /// Construct and materialize an element
    pub fn element(&self, kind: TagKind, children: Vec<Child<S>>) -> Node<S> {
        let node = Node::construct(self, kind, children);
        node.create_in(self);
        node
    }

    /// Reactive element whose children are recomputed by `children` on
    /// every reaction
    pub fn reactive<F>(&self, kind: TagKind, children: F) -> Reactive<S>
    where
        F: Fn(&Document<S>) -> Vec<Child<S>> + 'static,
    {
        Reactive::create(self, move |doc: &Document<S>| doc.element(kind, children(doc)))
    }

    /// Materialize `node` if needed and attach it to the named host
    pub fn mount(&self, mount_point: &str, node: &Node<S>) -> DomResult<()> {
        if !node.is_materialized() {
            node.create_in(self);
        }
        let sid = node.surface_id().ok_or(DomError::NotMaterialized(node.id()))?;
        self.surface_mut().attach_to_host(mount_point, sid)?;
        tracing::info!(node = %node.id(), mount_point, "mounted");
        Ok(())
    }

    /// Empty `node`'s surface and detach it from its host
    pub fn unmount(&self, node: &Node<S>) -> DomResult<()> {
        node.destroy()?;
        if let Some(sid) = node.surface_id() {
            self.surface_mut().remove_from_host(sid);
        }
        tracing::debug!(node = %node.id(), "unmounted");
        Ok(())
    }

    pub(crate) fn record(&self, diagnostic: Diagnostic) {
        self.inner.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Drain the recorded diagnostics
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.inner.diagnostics.borrow_mut())
    }

    /// React `node`, logging and recording a failure instead of propagating it
    pub(crate) fn react_logged(&self, node: &Reactive<S>) -> bool {
        match node.react() {
            Ok(()) => true,
            Err(error) => {
                tracing::error!(node = %node.id(), %error, "reaction aborted");
                self.record(Diagnostic::ReactionFailed {
                    node: node.id(),
                    error,
                });
                false
            }
        }
    }

    /// React every node subscribed to any of `scopes`, once each.
    ///
    /// Subscribers are snapshotted first; a node unsubscribed by an earlier
    /// reaction in the same broadcast is skipped. Inside a handler the
    /// broadcast is queued until the handler returns and 0 is reported.
    pub fn broadcast(&self, scopes: &[String]) -> usize {
        if self.is_handling() {
            tracing::debug!(scopes = ?scopes, "broadcast deferred");
            let scopes = scopes.to_vec();
            self.defer(move |doc| {
                doc.broadcast(&scopes);
            });
            return 0;
        }
        let targets = self.scopes().subscribers(scopes);
        let mut reacted = 0;
        for target in targets {
            let live = {
                let registry = self.scopes();
                scopes.iter().any(|name| registry.contains(name, target.id()))
            };
            if !live {
                tracing::debug!(node = %target.id(), "skipping discarded subscriber");
                continue;
            }
            if self.react_logged(&target) {
                reacted += 1;
            }
        }
        tracing::debug!(scopes = ?scopes, reacted, "broadcast");
        reacted
    }
}
