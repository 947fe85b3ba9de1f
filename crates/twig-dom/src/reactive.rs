//! Reactive Node
//!
//! A node that keeps the producer it was built from and can rebuild its
//! subtree in place. There is no dependency tracking: a reaction re-runs the
//! producer in full against the current state.

use std::ops::Deref;
use std::rc::Rc;

use crate::{Document, DomError, DomResult, EventKind, Node, ScopeNames};

/// Builds a fresh instance of a reactive node from the current state
pub type Producer<S> = Rc<dyn Fn(&Document<S>) -> Node<S>>;

/// Node created through a [`Producer`]
pub struct Reactive<S>(pub(crate) Node<S>);

impl<S> Reactive<S> {
    pub fn node(&self) -> &Node<S> {
        &self.0
    }

    pub fn into_node(self) -> Node<S> {
        self.0
    }
}

impl<S> Clone for Reactive<S> {
    fn clone(&self) -> Self {
        Reactive(self.0.clone())
    }
}

impl<S> PartialEq for Reactive<S> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<S> Eq for Reactive<S> {}

impl<S> Deref for Reactive<S> {
    type Target = Node<S>;

    fn deref(&self) -> &Node<S> {
        &self.0
    }
}

impl<S> From<Reactive<S>> for Node<S> {
    fn from(node: Reactive<S>) -> Self {
        node.0
    }
}

impl<S> std::fmt::Debug for Reactive<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Reactive").field(&self.0).finish()
    }
}

impl<S: 'static> Reactive<S> {
    /// Invoke `producer` for the initial instance and keep it for reactions
    pub fn create<F>(doc: &Document<S>, producer: F) -> Self
    where
        F: Fn(&Document<S>) -> Node<S> + 'static,
    {
        Self::from_producer(doc, Rc::new(producer))
    }

    pub fn from_producer(doc: &Document<S>, producer: Producer<S>) -> Self {
        let node = producer(doc);
        if !node.is_text() && !node.is_materialized() {
            node.create_in(doc);
        }
        *node.0.producer.borrow_mut() = Some(producer);
        Reactive(node)
    }

    /// Scope names this node is subscribed under
    pub fn scope_names(&self) -> Vec<String> {
        self.0.0.scopes.borrow().clone()
    }

    /// Subscribe under one or more scope names
    pub fn scope(self, names: impl ScopeNames) -> Self {
        let names = names.into_names();
        match self.document() {
            Ok(doc) => {
                let mut registry = doc.scopes_mut();
                for name in &names {
                    registry.add(name, &self);
                }
            }
            Err(err) => {
                tracing::warn!(node = %self.id(), error = %err, "cannot subscribe");
                return self;
            }
        }
        tracing::debug!(node = %self.id(), scopes = ?names, "subscribed");
        self.0.0.scopes.borrow_mut().extend(names);
        self
    }

    /// Unsubscribe every reactive descendant (depth-first), then this node.
    /// Must run before the subtree is discarded.
    pub fn clear_child_scopes(&self) {
        let Ok(doc) = self.document() else {
            return;
        };
        let mut registry = doc.scopes_mut();
        self.0.unsubscribe_tree(&mut registry);
    }

    /// Rebuild the subtree from the producer and reconcile the surface.
    ///
    /// Fails with [`DomError::Detached`] when the node's surface no longer
    /// hangs under a host, which happens to stale scope subscribers after
    /// the page they belonged to was torn down.
    ///
    /// Called while a handler holds the state, the reaction is queued and
    /// runs once the handler returns; failures are then recorded as
    /// diagnostics.
    pub fn react(&self) -> DomResult<()> {
        let node = &self.0;
        let doc = node.document()?;
        if doc.is_handling() {
            let target = self.clone();
            doc.defer(move |doc| {
                doc.react_logged(&target);
            });
            return Ok(());
        }
        let sid = node.surface_id().ok_or(DomError::NotMaterialized(node.id()))?;
        if !doc.surface().is_connected(sid) {
            return Err(DomError::Detached(node.id()));
        }
        let producer = node
            .0
            .producer
            .borrow()
            .clone()
            .ok_or(DomError::NotReactive(node.id()))?;

        // Descendants are about to be discarded
        {
            let mut registry = doc.scopes_mut();
            for child in node.0.children.borrow().iter() {
                child.unsubscribe_tree(&mut registry);
            }
        }

        let fresh = producer(&doc);
        let children = fresh.take_children();
        self.adopt_scopes(&doc, &fresh);

        for child in &children {
            if !child.is_text() && !child.is_materialized() {
                child.create_in(&doc);
            }
        }
        {
            let mut surface = doc.surface_mut();
            surface.remove_children(sid);
            for child in &children {
                match (child.text(), child.surface_id()) {
                    (Some(text), _) => surface.append_text(sid, text),
                    (None, Some(child_sid)) => surface.append_child(sid, child_sid),
                    (None, None) => {}
                }
            }
        }
        for child in &children {
            child.set_parent(node);
        }

        tracing::debug!(node = %node.id(), children = children.len(), "reacted");
        *node.0.children.borrow_mut() = children;
        Ok(())
    }

    /// Scopes declared on the replacement instance belong to this node
    fn adopt_scopes(&self, doc: &Document<S>, fresh: &Node<S>) {
        let declared = std::mem::take(&mut *fresh.0.scopes.borrow_mut());
        if declared.is_empty() {
            return;
        }
        let mut registry = doc.scopes_mut();
        registry.remove_node(fresh.id(), &declared);
        let mut held = self.0.0.scopes.borrow_mut();
        for name in declared {
            if !held.contains(&name) {
                registry.add(&name, self);
                held.push(name);
            }
        }
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        Reactive(self.0.attr(name, value))
    }

    pub fn class(self, name: &str) -> Self {
        Reactive(self.0.class(name))
    }

    pub fn handle<F>(self, event: impl Into<EventKind>, handler: F) -> Self
    where
        F: Fn(&mut S, &Node<S>) + 'static,
    {
        Reactive(self.0.handle(event, handler))
    }

    /// `$handle`: run the handler, then the nearest reactive ancestor
    /// strictly above this node reacts
    pub fn handle_local<F>(self, event: impl Into<EventKind>, handler: F) -> Self
    where
        F: Fn(&mut S, &Node<S>) + 'static,
    {
        Reactive(self.0.handle_local(event, handler))
    }

    /// `$$handle`: run the handler, then every node subscribed to `scopes`
    /// reacts once
    pub fn handle_scoped<F>(
        self,
        scopes: impl ScopeNames,
        event: impl Into<EventKind>,
        handler: F,
    ) -> Self
    where
        F: Fn(&mut S, &Node<S>) + 'static,
    {
        Reactive(self.0.handle_scoped(scopes, event, handler))
    }
}
