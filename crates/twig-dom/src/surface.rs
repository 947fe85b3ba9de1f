//! Rendering surface
//!
//! The capability set a backend must provide for nodes to be realized.
//! Any backend (a display tree, a headless double, a markup builder) can
//! stand in as long as it implements [`Surface`].

use std::rc::Rc;

use crate::{DomResult, EventKind, TagKind};

/// Handle to an element owned by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

/// Callback invoked when an event fires on a surface element
pub type Listener = Rc<dyn Fn()>;

/// Rendering backend operations
pub trait Surface {
    /// Create a detached element of the given kind
    fn create_element(&mut self, kind: TagKind) -> SurfaceId;

    /// Append `child` to `parent`, moving it away from any previous parent
    fn append_child(&mut self, parent: SurfaceId, child: SurfaceId);

    /// Append a text node to `parent`
    fn append_text(&mut self, parent: SurfaceId, text: &str);

    /// Remove every child of `id`
    fn remove_children(&mut self, id: SurfaceId);

    /// Detach `id` from whatever holds it (host or parent element)
    fn remove_from_host(&mut self, id: SurfaceId);

    /// Discard `id` once no node refers to it. Its text children go with
    /// it; element children are only detached.
    fn release(&mut self, id: SurfaceId);

    /// Attach `id` as a root of the named host container
    fn attach_to_host(&mut self, mount_point: &str, id: SurfaceId) -> DomResult<()>;

    fn set_attribute(&mut self, id: SurfaceId, name: &str, value: &str);

    fn add_class(&mut self, id: SurfaceId, class: &str);

    fn add_event_listener(&mut self, id: SurfaceId, event: EventKind, listener: Listener);

    /// Whether `id` is reachable from a host container
    fn is_connected(&self, id: SurfaceId) -> bool;
}
