//! twig Router - Hash-path routing for twig documents
//!
//! Route patterns are split into `/`-separated segments and stored in a
//! segment trie. Segments starting with the parameter marker (`:` by
//! default) capture whatever segment appears at that position.
//!
//! # Example
//! ```rust,ignore
//! use twig_dom::{children, Document, HeadlessSurface, TagKind};
//! use twig_router::{Router, RouterConfig, Routes};
//!
//! let doc = Document::new((), HeadlessSurface::new().with_host("main"));
//! let routes = Routes::new()
//!     .route("/", |doc, _| doc.element(TagKind::H1, children!["home"]))
//!     .route("/user/:id", |doc, params| {
//!         doc.element(TagKind::P, children![params.get("id").unwrap_or("?")])
//!     });
//! let router = Router::new(&doc, routes, RouterConfig::default(), "/user/7")?;
//! ```

mod config;
mod location;
mod pattern;
mod router;
mod trie;

pub use config::RouterConfig;
pub use location::{HashLocation, NavigationSource, PathListener};
pub use pattern::{normalize_path, split_segments, Segment};
pub use router::{RouteHandler, Router, RouterState, Routes};
pub use trie::{Params, RouteMatch, RouteTrie};

use twig_dom::DomError;

/// Result type for routing operations
pub type RouteResult<T> = Result<T, RouteError>;

/// Routing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// Two patterns name the parameter at the same position differently
    #[error("pattern {pattern} names parameter `{found}` where `{existing}` is already registered")]
    ConflictingParam {
        pattern: String,
        existing: String,
        found: String,
    },

    /// A segment consists of the parameter marker alone
    #[error("pattern {0} has an unnamed parameter")]
    EmptyParam(String),

    /// A location that cannot be parsed as a URL
    #[error("invalid location: {0}")]
    InvalidLocation(#[from] url::ParseError),

    #[error(transparent)]
    Dom(#[from] DomError),
}
