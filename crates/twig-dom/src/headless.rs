//! Headless surface (arena-based)
//!
//! In-memory rendering backend. Clones share the same arena, so a caller can
//! keep a handle for inspection while a [`Document`](crate::Document) owns
//! another one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::{ClassList, DomError, DomResult, EventKind, Listener, Surface, SurfaceId, TagKind};

/// Where a surface node currently hangs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attachment {
    Detached,
    Parent(SurfaceId),
    Host(usize),
}

#[derive(Debug)]
enum Content {
    Element(TagKind),
    Text(String),
}

struct SurfaceNode {
    content: Content,
    attachment: Attachment,
    children: Vec<SurfaceId>,
    attrs: Vec<(String, String)>,
    classes: ClassList,
    listeners: Vec<(EventKind, Listener)>,
}

impl SurfaceNode {
    fn new(content: Content) -> Self {
        Self {
            content,
            attachment: Attachment::Detached,
            children: Vec::new(),
            attrs: Vec::new(),
            classes: ClassList::new(),
            listeners: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Host {
    name: String,
    roots: Vec<SurfaceId>,
}

/// Slots of released nodes are reused by later allocations
#[derive(Default)]
struct Arena {
    nodes: Vec<Option<SurfaceNode>>,
    free: Vec<u32>,
    hosts: Vec<Host>,
}

impl Arena {
    fn push(&mut self, node: SurfaceNode) -> SurfaceId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(node);
                SurfaceId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                SurfaceId(self.nodes.len() as u32 - 1)
            }
        }
    }

    fn get(&self, id: SurfaceId) -> Option<&SurfaceNode> {
        self.nodes.get(id.0 as usize)?.as_ref()
    }

    fn get_mut(&mut self, id: SurfaceId) -> Option<&mut SurfaceNode> {
        self.nodes.get_mut(id.0 as usize)?.as_mut()
    }

    fn is_text(&self, id: SurfaceId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.content, Content::Text(_)))
    }

    /// Empty the slot of `id`, freeing text children and detaching element
    /// children. Removed nodes are handed back so their listeners can be
    /// dropped outside the arena borrow.
    fn free(&mut self, id: SurfaceId, removed: &mut Vec<SurfaceNode>) {
        let Some(node) = self.nodes.get_mut(id.0 as usize).and_then(Option::take) else {
            return;
        };
        self.free.push(id.0);
        for &child in &node.children {
            if self.is_text(child) {
                self.free(child, removed);
            } else if let Some(c) = self.get_mut(child) {
                c.attachment = Attachment::Detached;
            }
        }
        removed.push(node);
    }

    fn live(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn host_index(&self, name: &str) -> Option<usize> {
        self.hosts.iter().position(|h| h.name == name)
    }

    /// Unlink `id` from its current holder
    fn detach(&mut self, id: SurfaceId) {
        let Some(attachment) = self.get(id).map(|n| n.attachment) else {
            return;
        };
        match attachment {
            Attachment::Detached => {}
            Attachment::Parent(parent) => {
                if let Some(p) = self.get_mut(parent) {
                    p.children.retain(|&c| c != id);
                }
            }
            Attachment::Host(host) => {
                if let Some(h) = self.hosts.get_mut(host) {
                    h.roots.retain(|&c| c != id);
                }
            }
        }
        if let Some(node) = self.get_mut(id) {
            node.attachment = Attachment::Detached;
        }
    }

    fn write_html(&self, id: SurfaceId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.content {
            Content::Text(text) => escape_into(text, out),
            Content::Element(kind) => {
                let _ = write!(out, "<{kind}");
                if !node.classes.is_empty() {
                    out.push_str(" class=\"");
                    escape_into(&node.classes.to_string(), out);
                    out.push('"');
                }
                for (name, value) in &node.attrs {
                    let _ = write!(out, " {name}=\"");
                    escape_into(value, out);
                    out.push('"');
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{kind}>");
            }
        }
    }

    fn write_text(&self, id: SurfaceId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.content {
            Content::Text(text) => out.push_str(text),
            Content::Element(_) => {
                for &child in &node.children {
                    self.write_text(child, out);
                }
            }
        }
    }

    fn find_in(
        &self,
        id: SurfaceId,
        pred: &dyn Fn(&SurfaceNode) -> bool,
        found: &mut Vec<SurfaceId>,
    ) {
        let Some(node) = self.get(id) else {
            return;
        };
        if pred(node) {
            found.push(id);
        }
        for &child in &node.children {
            self.find_in(child, pred, found);
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// In-memory surface used by tests and the demo
#[derive(Clone, Default)]
pub struct HeadlessSurface {
    arena: Rc<RefCell<Arena>>,
}

impl HeadlessSurface {
    /// Create a surface without host containers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named host container
    pub fn with_host(self, name: &str) -> Self {
        self.add_host(name);
        self
    }

    pub fn add_host(&self, name: &str) {
        let mut arena = self.arena.borrow_mut();
        if arena.host_index(name).is_none() {
            arena.hosts.push(Host {
                name: name.to_string(),
                roots: Vec::new(),
            });
        }
    }

    /// Remove a host container; its roots are detached
    pub fn remove_host(&self, name: &str) {
        let mut arena = self.arena.borrow_mut();
        let Some(index) = arena.host_index(name) else {
            return;
        };
        let host = arena.hosts.remove(index);
        for root in host.roots {
            if let Some(node) = arena.get_mut(root) {
                node.attachment = Attachment::Detached;
            }
        }
        // Host indices above the removed one shift down
        for node in arena.nodes.iter_mut().flatten() {
            match node.attachment {
                Attachment::Host(h) if h > index => node.attachment = Attachment::Host(h - 1),
                _ => {}
            }
        }
    }

    /// Number of live surface nodes
    pub fn len(&self) -> usize {
        self.arena.borrow().live()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Roots currently attached to a host
    pub fn host_roots(&self, name: &str) -> Vec<SurfaceId> {
        let arena = self.arena.borrow();
        arena
            .host_index(name)
            .map(|h| arena.hosts[h].roots.clone())
            .unwrap_or_default()
    }

    /// Children of a surface element
    pub fn children(&self, id: SurfaceId) -> Vec<SurfaceId> {
        self.arena
            .borrow()
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Tag kind of an element, `None` for text nodes
    pub fn kind(&self, id: SurfaceId) -> Option<TagKind> {
        match self.arena.borrow().get(id)?.content {
            Content::Element(kind) => Some(kind),
            Content::Text(_) => None,
        }
    }

    pub fn attribute(&self, id: SurfaceId, name: &str) -> Option<String> {
        let arena = self.arena.borrow();
        let node = arena.get(id)?;
        node.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn has_class(&self, id: SurfaceId, class: &str) -> bool {
        self.arena
            .borrow()
            .get(id)
            .is_some_and(|n| n.classes.contains(class))
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, id: SurfaceId) -> String {
        let mut out = String::new();
        self.arena.borrow().write_text(id, &mut out);
        out
    }

    /// Serialize a subtree to HTML markup
    pub fn html(&self, id: SurfaceId) -> String {
        let mut out = String::new();
        self.arena.borrow().write_html(id, &mut out);
        out
    }

    /// Serialize everything attached to a host
    pub fn host_html(&self, name: &str) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        if let Some(h) = arena.host_index(name) {
            for &root in &arena.hosts[h].roots {
                arena.write_html(root, &mut out);
            }
        }
        out
    }

    /// Elements of `kind` under a host, in document order
    pub fn find_all(&self, host: &str, kind: TagKind) -> Vec<SurfaceId> {
        let arena = self.arena.borrow();
        let mut found = Vec::new();
        let pred = |n: &SurfaceNode| matches!(n.content, Content::Element(k) if k == kind);
        if let Some(h) = arena.host_index(host) {
            for &root in &arena.hosts[h].roots {
                arena.find_in(root, &pred, &mut found);
            }
        }
        found
    }

    /// First element of `kind` under a host whose text content equals `text`
    pub fn find_by_text(&self, host: &str, kind: TagKind, text: &str) -> Option<SurfaceId> {
        self.find_all(host, kind)
            .into_iter()
            .find(|&id| self.text_content(id) == text)
    }

    /// Number of listeners registered for `event` on `id`
    pub fn listener_count(&self, id: SurfaceId, event: &EventKind) -> usize {
        self.arena
            .borrow()
            .get(id)
            .map_or(0, |n| n.listeners.iter().filter(|(k, _)| k == event).count())
    }

    /// Fire `event` on `id`, invoking every matching listener.
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, id: SurfaceId, event: impl Into<EventKind>) -> usize {
        let event = event.into();
        // Listeners re-enter the surface, so the arena must not stay borrowed.
        let listeners: Vec<Listener> = match self.arena.borrow().get(id) {
            Some(node) => node
                .listeners
                .iter()
                .filter(|(k, _)| *k == event)
                .map(|(_, l)| l.clone())
                .collect(),
            None => Vec::new(),
        };
        tracing::debug!(surface = id.0, %event, listeners = listeners.len(), "dispatch");
        for listener in &listeners {
            listener();
        }
        listeners.len()
    }
}

impl Surface for HeadlessSurface {
    fn create_element(&mut self, kind: TagKind) -> SurfaceId {
        self.arena
            .borrow_mut()
            .push(SurfaceNode::new(Content::Element(kind)))
    }

    fn append_child(&mut self, parent: SurfaceId, child: SurfaceId) {
        let mut arena = self.arena.borrow_mut();
        if parent == child || arena.get(parent).is_none() || arena.get(child).is_none() {
            return;
        }
        arena.detach(child);
        if let Some(p) = arena.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = arena.get_mut(child) {
            c.attachment = Attachment::Parent(parent);
        }
    }

    fn append_text(&mut self, parent: SurfaceId, text: &str) {
        let mut arena = self.arena.borrow_mut();
        if arena.get(parent).is_none() {
            return;
        }
        let mut node = SurfaceNode::new(Content::Text(text.to_string()));
        node.attachment = Attachment::Parent(parent);
        let id = arena.push(node);
        if let Some(p) = arena.get_mut(parent) {
            p.children.push(id);
        }
    }

    fn remove_children(&mut self, id: SurfaceId) {
        let mut removed = Vec::new();
        let mut arena = self.arena.borrow_mut();
        let children = match arena.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        // Text nodes belong to their parent element alone
        for child in children {
            if arena.is_text(child) {
                arena.free(child, &mut removed);
            } else if let Some(c) = arena.get_mut(child) {
                c.attachment = Attachment::Detached;
            }
        }
        drop(arena);
        drop(removed);
    }

    fn remove_from_host(&mut self, id: SurfaceId) {
        self.arena.borrow_mut().detach(id);
    }

    fn release(&mut self, id: SurfaceId) {
        let mut removed = Vec::new();
        {
            let mut arena = self.arena.borrow_mut();
            arena.detach(id);
            arena.free(id, &mut removed);
        }
        tracing::trace!(surface = id.0, released = removed.len(), "release");
    }

    fn attach_to_host(&mut self, mount_point: &str, id: SurfaceId) -> DomResult<()> {
        let mut arena = self.arena.borrow_mut();
        let host = arena
            .host_index(mount_point)
            .ok_or_else(|| DomError::UnknownMountPoint(mount_point.to_string()))?;
        arena.detach(id);
        arena.hosts[host].roots.push(id);
        if let Some(node) = arena.get_mut(id) {
            node.attachment = Attachment::Host(host);
        }
        Ok(())
    }

    fn set_attribute(&mut self, id: SurfaceId, name: &str, value: &str) {
        let mut arena = self.arena.borrow_mut();
        let Some(node) = arena.get_mut(id) else {
            return;
        };
        if name == "class" {
            node.classes = ClassList::parse(value);
            return;
        }
        match node.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => node.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn add_class(&mut self, id: SurfaceId, class: &str) {
        if let Some(node) = self.arena.borrow_mut().get_mut(id) {
            node.classes.add(class);
        }
    }

    fn add_event_listener(&mut self, id: SurfaceId, event: EventKind, listener: Listener) {
        if let Some(node) = self.arena.borrow_mut().get_mut(id) {
            node.listeners.push((event, listener));
        }
    }

    fn is_connected(&self, id: SurfaceId) -> bool {
        let arena = self.arena.borrow();
        let mut current = id;
        // Bounded by the arena size so a malformed cycle cannot hang.
        for _ in 0..=arena.nodes.len() {
            match arena.get(current).map(|n| n.attachment) {
                Some(Attachment::Host(_)) => return true,
                Some(Attachment::Parent(parent)) => current = parent,
                _ => return false,
            }
        }
        false
    }
}

impl std::fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arena = self.arena.borrow();
        f.debug_struct("HeadlessSurface")
            .field("nodes", &arena.live())
            .field("hosts", &arena.hosts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_html_serialization() {
        let mut surface = HeadlessSurface::new().with_host("main");
        let div = surface.create_element(TagKind::Div);
        let link = surface.create_element(TagKind::A);
        surface.append_text(link, "home & away");
        surface.set_attribute(link, "href", "#/");
        surface.append_child(div, link);
        surface.add_class(div, "red");
        surface.attach_to_host("main", div).unwrap();

        assert_eq!(
            surface.host_html("main"),
            "<div class=\"red\"><a href=\"#/\">home &amp; away</a></div>"
        );
    }

    #[test]
    fn test_append_moves_child() {
        let mut surface = HeadlessSurface::new();
        let first = surface.create_element(TagKind::Div);
        let second = surface.create_element(TagKind::Div);
        let child = surface.create_element(TagKind::P);

        surface.append_child(first, child);
        surface.append_child(second, child);

        assert!(surface.children(first).is_empty());
        assert_eq!(surface.children(second), vec![child]);
    }

    #[test]
    fn test_connection_tracking() {
        let mut surface = HeadlessSurface::new().with_host("main");
        let root = surface.create_element(TagKind::Div);
        let child = surface.create_element(TagKind::Span);
        surface.append_child(root, child);
        assert!(!surface.is_connected(child));

        surface.attach_to_host("main", root).unwrap();
        assert!(surface.is_connected(child));

        surface.remove_children(root);
        assert!(!surface.is_connected(child));
        assert!(surface.is_connected(root));

        surface.remove_from_host(root);
        assert!(!surface.is_connected(root));
        assert!(surface.host_roots("main").is_empty());
    }

    #[test]
    fn test_unknown_mount_point() {
        let mut surface = HeadlessSurface::new();
        let root = surface.create_element(TagKind::Div);
        assert_eq!(
            surface.attach_to_host("main", root),
            Err(DomError::UnknownMountPoint("main".into()))
        );
    }

    #[test]
    fn test_dispatch_invokes_matching_listeners() {
        let mut surface = HeadlessSurface::new();
        let button = surface.create_element(TagKind::Button);
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        surface.add_event_listener(
            button,
            EventKind::Click,
            Rc::new(move || counter.set(counter.get() + 1)),
        );

        assert_eq!(surface.listener_count(button, &EventKind::Click), 1);
        assert_eq!(surface.listener_count(button, &EventKind::Input), 0);
        assert_eq!(surface.dispatch(button, "click"), 1);
        assert_eq!(surface.dispatch(button, "input"), 0);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_release_reuses_slots() {
        let mut surface = HeadlessSurface::new();
        let root = surface.create_element(TagKind::Div);
        let kept = surface.create_element(TagKind::Span);
        surface.append_text(root, "gone");
        surface.append_child(root, kept);
        assert_eq!(surface.len(), 3);

        surface.release(root);
        assert_eq!(surface.len(), 1);
        assert_eq!(surface.kind(kept), Some(TagKind::Span));
        assert_eq!(surface.html(root), "");

        let next = surface.create_element(TagKind::P);
        assert!(next.0 < 3);
        assert_eq!(surface.len(), 2);
    }

    #[test]
    fn test_remove_children_frees_text() {
        let mut surface = HeadlessSurface::new();
        let root = surface.create_element(TagKind::P);
        surface.append_text(root, "a");
        surface.append_text(root, "b");
        surface.remove_children(root);
        assert_eq!(surface.len(), 1);
    }

    #[test]
    fn test_remove_host_detaches_roots() {
        let mut surface = HeadlessSurface::new().with_host("side").with_host("main");
        let root = surface.create_element(TagKind::Div);
        let other = surface.create_element(TagKind::Div);
        surface.attach_to_host("side", root).unwrap();
        surface.attach_to_host("main", other).unwrap();

        surface.remove_host("side");
        assert!(!surface.is_connected(root));
        assert!(surface.is_connected(other));
        assert_eq!(surface.host_roots("main"), vec![other]);
    }

    #[test]
    fn test_find_by_text() {
        let mut surface = HeadlessSurface::new().with_host("main");
        let root = surface.create_element(TagKind::Div);
        let button = surface.create_element(TagKind::Button);
        surface.append_text(button, "Click Me");
        surface.append_child(root, button);
        surface.attach_to_host("main", root).unwrap();

        assert_eq!(
            surface.find_by_text("main", TagKind::Button, "Click Me"),
            Some(button)
        );
        assert_eq!(surface.find_by_text("main", TagKind::Button, "Nope"), None);
    }
}
