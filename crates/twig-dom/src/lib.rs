//! twig DOM - Reactive element tree
//!
//! Element nodes, reactive nodes that rebuild themselves from a producer,
//! and the scope registry used to broadcast re-renders across subtrees.
//!
//! # Example
//! ```rust,ignore
//! use twig_dom::{children, Document, HeadlessSurface, TagKind};
//!
//! let surface = HeadlessSurface::new().with_host("main");
//! let doc = Document::new(0u32, surface.clone());
//!
//! let counter = doc
//!     .reactive(TagKind::Div, |doc| children![format!("Count {}", doc.state())])
//!     .scope("count");
//! let button = doc
//!     .element(TagKind::Button, children!["+1"])
//!     .handle_scoped(["count"], "click", |count, _| *count += 1);
//! ```

mod classlist;
mod document;
mod event;
mod headless;
mod kind;
mod node;
mod reactive;
mod scope;
mod surface;

pub use classlist::ClassList;
pub use document::{Diagnostic, Document};
pub use event::EventKind;
pub use headless::HeadlessSurface;
pub use kind::TagKind;
pub use node::{Child, Handler, Node};
pub use reactive::{Producer, Reactive};
pub use scope::{ScopeNames, ScopeRegistry};
pub use surface::{Listener, Surface, SurfaceId};

/// Result type for tree operations
pub type DomResult<T> = Result<T, DomError>;

/// Node identifier, unique within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Raw index value
    pub fn index(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tree operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node has no rendered surface
    #[error("node {0} has not been materialized")]
    NotMaterialized(NodeId),

    /// The node's surface is no longer reachable from any host
    #[error("node {0} is detached from its host")]
    Detached(NodeId),

    /// The operation requires a reactive node
    #[error("node {0} is not reactive")]
    NotReactive(NodeId),

    /// The owning document was dropped
    #[error("owning document has been dropped")]
    DocumentDropped,

    /// No host container with this name
    #[error("unknown mount point: {0}")]
    UnknownMountPoint(String),

    /// Tag name outside the supported set
    #[error("unsupported tag kind: {0}")]
    UnknownTag(String),
}

/// Build a `Vec<Child<_>>` from heterogeneous values (text, nodes, reactive nodes)
#[macro_export]
macro_rules! children {
    () => { ::std::vec::Vec::new() };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::Child::from($child)),+]
    };
}
