//! Router
//!
//! Maps the current path to a root node and keeps exactly one root mounted
//! at the configured mount point. Every navigation resets the document's
//! scope registry before the new view is built.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use twig_dom::{children, Document, Node, TagKind};

use crate::location::NavigationSource;
use crate::pattern::normalize_path;
use crate::trie::{Params, RouteTrie};
use crate::{RouteResult, RouterConfig};

/// Builds the root node for a route
pub type RouteHandler<S> = Rc<dyn Fn(&Document<S>, &Params) -> Node<S>>;

/// Route table: pattern -> handler, in registration order
pub struct Routes<S> {
    entries: Vec<(String, RouteHandler<S>)>,
}

impl<S> Default for Routes<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: 'static> Routes<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. The not-found key is accepted like any pattern.
    pub fn route<F, N>(mut self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&Document<S>, &Params) -> N + 'static,
        N: Into<Node<S>>,
    {
        let handler: RouteHandler<S> =
            Rc::new(move |doc: &Document<S>, params: &Params| handler(doc, params).into());
        self.entries.push((pattern.to_string(), handler));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Router lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    /// Constructed, nothing resolved yet
    Idle,
    /// Resolving a path and building its view
    Resolving,
    /// A view is attached to the mount point
    Mounted,
}

pub struct Router<S> {
    doc: Document<S>,
    config: RouterConfig,
    trie: RouteTrie<RouteHandler<S>>,
    not_found: RouteHandler<S>,
    mounted: RefCell<Option<Node<S>>>,
    state: Cell<RouterState>,
    path: RefCell<String>,
    params: RefCell<Params>,
}

impl<S: 'static> Router<S> {
    /// Build the route trie and mount the view for `initial_path`.
    ///
    /// An empty initial path routes to `/`.
    pub fn new(
        doc: &Document<S>,
        routes: Routes<S>,
        config: RouterConfig,
        initial_path: &str,
    ) -> RouteResult<Self> {
        let mut trie = RouteTrie::new(config.param_marker);
        let mut not_found = None;
        for (pattern, handler) in routes.entries {
            if pattern == config.not_found_key {
                not_found = Some(handler);
            } else {
                trie.insert(&pattern, handler)?;
            }
        }
        let not_found = not_found.unwrap_or_else(|| fallback(&config.fallback_message));
        tracing::debug!(routes = trie.len(), mount_point = %config.mount_point, "router built");

        let router = Self {
            doc: doc.clone(),
            config,
            trie,
            not_found,
            mounted: RefCell::new(None),
            state: Cell::new(RouterState::Idle),
            path: RefCell::new(String::new()),
            params: RefCell::new(Params::new()),
        };
        let initial = if normalize_path(initial_path).is_empty() {
            "/"
        } else {
            initial_path
        };
        router.route(initial)?;
        Ok(router)
    }

    /// Handler and parameters for `path`; unmatched paths get the
    /// not-found handler with no parameters
    pub fn resolve(&self, path: &str) -> (RouteHandler<S>, Params) {
        match self.trie.resolve(path) {
            Some(found) => (found.handler.clone(), found.params),
            None => {
                tracing::debug!(path, "no route, using not-found view");
                (self.not_found.clone(), Params::new())
            }
        }
    }

    /// Reset scopes, resolve `path` and mount its view.
    ///
    /// The current path and parameters change only when the view was
    /// mounted. Must not be called while a handler holds the state; follow
    /// a [`NavigationSource`] with [`Router::listen`] to navigate from
    /// handlers.
    pub fn route(&self, path: &str) -> RouteResult<()> {
        self.state.set(RouterState::Resolving);
        self.doc.reset_scopes();
        let (handler, params) = self.resolve(path);
        if let Err(error) = self.navigate(&handler, &params) {
            let settled = if self.mounted.borrow().is_some() {
                RouterState::Mounted
            } else {
                RouterState::Idle
            };
            self.state.set(settled);
            return Err(error);
        }
        tracing::info!(path, params = params.len(), "routed");
        *self.path.borrow_mut() = normalize_path(path).to_string();
        *self.params.borrow_mut() = params;
        Ok(())
    }

    /// Replace the mounted view with the one built by `handler`
    pub fn navigate(&self, handler: &RouteHandler<S>, params: &Params) -> RouteResult<()> {
        let previous = self.mounted.borrow_mut().take();
        if let Some(previous) = previous {
            self.doc.unmount(&previous)?;
        }

        let root = handler(&self.doc, params);
        self.doc.mount(&self.config.mount_point, &root)?;
        tracing::debug!(root = %root.id(), mount_point = %self.config.mount_point, "view mounted");
        *self.mounted.borrow_mut() = Some(root);
        self.state.set(RouterState::Mounted);
        Ok(())
    }

    /// Follow `source`: route on every path change it reports.
    ///
    /// The subscription holds the router weakly; failures are logged. A
    /// change reported from inside an event handler is routed once the
    /// handler returns.
    pub fn listen(self: &Rc<Self>, source: &dyn NavigationSource) {
        let router = Rc::downgrade(self);
        source.subscribe(Rc::new(move |path: &str| {
            let Some(router) = router.upgrade() else {
                return;
            };
            let path = path.to_string();
            let doc = router.doc.clone();
            doc.defer(move |_| {
                if let Err(error) = router.route(&path) {
                    tracing::error!(path = %path, %error, "navigation failed");
                }
            });
        }));
    }

    /// Construct a router on `source`'s current path and follow it
    pub fn attach(
        doc: &Document<S>,
        routes: Routes<S>,
        config: RouterConfig,
        source: &dyn NavigationSource,
    ) -> RouteResult<Rc<Self>> {
        let router = Rc::new(Self::new(doc, routes, config, &source.current_path())?);
        router.listen(source);
        Ok(router)
    }

    /// The currently mounted root
    pub fn mounted(&self) -> Option<Node<S>> {
        self.mounted.borrow().clone()
    }

    pub fn state(&self) -> RouterState {
        self.state.get()
    }

    /// Last routed path, normalized
    pub fn current_path(&self) -> String {
        self.path.borrow().clone()
    }

    /// Parameters captured for the mounted view
    pub fn params(&self) -> Params {
        self.params.borrow().clone()
    }

    pub fn document(&self) -> &Document<S> {
        &self.doc
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

fn fallback<S: 'static>(message: &str) -> RouteHandler<S> {
    let message = message.to_string();
    Rc::new(move |doc: &Document<S>, _: &Params| {
        doc.element(TagKind::Div, children![message.as_str()])
    })
}

impl<S> std::fmt::Debug for Router<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("state", &self.state.get())
            .field("path", &*self.path.borrow())
            .field("routes", &self.trie)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RouteError;
    use twig_dom::HeadlessSurface;

    fn setup() -> (HeadlessSurface, Document<()>) {
        let surface = HeadlessSurface::new().with_host("main");
        let doc = Document::new((), surface.clone());
        (surface, doc)
    }

    fn routes() -> Routes<()> {
        Routes::<()>::new()
            .route("/", |doc, _| doc.element(TagKind::H1, children!["home"]))
            .route("/test/:a/:b", |doc, params| {
                let a = params.get("a").unwrap_or("");
                let b = params.get("b").unwrap_or("");
                let text = format!("{a}-{b}");
                doc.element(TagKind::P, children![text])
            })
    }

    #[test]
    fn test_empty_initial_path_routes_to_root() {
        let (surface, doc) = setup();
        let router = Router::new(&doc, routes(), RouterConfig::default(), "").unwrap();

        assert_eq!(router.state(), RouterState::Mounted);
        assert_eq!(surface.host_html("main"), "<h1>home</h1>");
        assert!(router.params().is_empty());
    }

    #[test]
    fn test_params_reach_handler() {
        let (surface, doc) = setup();
        let router = Router::new(&doc, routes(), RouterConfig::default(), "/test/x/y").unwrap();

        assert_eq!(surface.host_html("main"), "<p>x-y</p>");
        assert_eq!(router.params().get("a"), Some("x"));
        assert_eq!(router.current_path(), "/test/x/y");
    }

    #[test]
    fn test_builtin_not_found() {
        let (surface, doc) = setup();
        let router = Router::new(&doc, routes(), RouterConfig::default(), "/nowhere").unwrap();
        assert_eq!(surface.host_html("main"), "<div>404 Not Found</div>");
        assert!(router.mounted().is_some());
    }

    #[test]
    fn test_custom_fallback_message() {
        let (surface, doc) = setup();
        let config = RouterConfig {
            fallback_message: "gone".into(),
            ..RouterConfig::default()
        };
        Router::new(&doc, Routes::new(), config, "/x").unwrap();
        assert_eq!(surface.host_html("main"), "<div>gone</div>");
    }

    #[test]
    fn test_route_replaces_mounted_view() {
        let (surface, doc) = setup();
        let router = Router::new(&doc, routes(), RouterConfig::default(), "/").unwrap();
        let first = router.mounted().unwrap();

        router.route("/test/1/2").unwrap();
        assert_eq!(surface.host_roots("main").len(), 1);
        assert_eq!(surface.host_html("main"), "<p>1-2</p>");
        assert_ne!(router.mounted().unwrap(), first);
    }

    #[test]
    fn test_route_resets_scopes() {
        let (_surface, doc) = setup();
        let routes = Routes::new().route("/", |doc: &Document<()>, _: &Params| {
            let view = doc.reactive(TagKind::Span, |_| children!["a"]).scope("s");
            doc.element(TagKind::Div, children![view])
        });
        let router = Router::new(&doc, routes, RouterConfig::default(), "/").unwrap();
        assert_eq!(doc.scopes().len("s"), 1);

        router.route("/missing").unwrap();
        assert!(doc.scopes().is_empty());
    }

    #[test]
    fn test_failed_route_keeps_last_path() {
        let (surface, doc) = setup();
        let router = Router::new(&doc, routes(), RouterConfig::default(), "/test/a/b").unwrap();

        surface.remove_host("main");
        let err = router.route("/").unwrap_err();
        assert_eq!(err, RouteError::Dom(twig_dom::DomError::UnknownMountPoint("main".into())));
        assert_eq!(router.state(), RouterState::Idle);
        assert!(router.mounted().is_none());
        assert_eq!(router.current_path(), "/test/a/b");
        assert_eq!(router.params().get("a"), Some("a"));

        surface.add_host("main");
        router.route("/").unwrap();
        assert_eq!(router.state(), RouterState::Mounted);
        assert_eq!(surface.host_html("main"), "<h1>home</h1>");
    }

    #[test]
    fn test_missing_mount_point() {
        let doc = Document::new((), HeadlessSurface::new());
        let err = Router::new(&doc, routes(), RouterConfig::default(), "/").unwrap_err();
        assert_eq!(err, RouteError::Dom(twig_dom::DomError::UnknownMountPoint("main".into())));
    }

    #[test]
    fn test_conflicting_routes_rejected() {
        let (_surface, doc) = setup();
        let routes = routes().route("/test/:c", |doc, _| doc.element(TagKind::Div, Vec::new()));
        assert!(matches!(
            Router::new(&doc, routes, RouterConfig::default(), "/"),
            Err(RouteError::ConflictingParam { .. })
        ));
    }
}
