//! Segment trie
//!
//! Each level holds literal children keyed by segment text and at most one
//! parameter child. Resolution prefers the literal child and never
//! backtracks into the parameter branch once a literal has matched.

use std::collections::{BTreeMap, HashMap};

use crate::pattern::{split_segments, Segment};
use crate::{RouteError, RouteResult};

/// Parameter name -> captured path segment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in parameter-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

struct TrieNode<H> {
    handler: Option<H>,
    literals: HashMap<String, TrieNode<H>>,
    param: Option<Box<ParamBranch<H>>>,
}

struct ParamBranch<H> {
    name: String,
    node: TrieNode<H>,
}

impl<H> Default for TrieNode<H> {
    fn default() -> Self {
        Self {
            handler: None,
            literals: HashMap::new(),
            param: None,
        }
    }
}

/// Result of a successful lookup
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub handler: &'a H,
    pub params: Params,
}

/// Route patterns -> handlers
pub struct RouteTrie<H> {
    root: TrieNode<H>,
    marker: char,
    routes: usize,
}

impl<H> RouteTrie<H> {
    pub fn new(marker: char) -> Self {
        Self {
            root: TrieNode::default(),
            marker,
            routes: 0,
        }
    }

    /// Register `handler` under `pattern`.
    ///
    /// Parameter segments at the same position merge when they share a
    /// name. A later handler for an identical pattern replaces the earlier.
    pub fn insert(&mut self, pattern: &str, handler: H) -> RouteResult<()> {
        let mut node = &mut self.root;
        for raw in split_segments(pattern) {
            node = match Segment::parse(raw, self.marker) {
                Segment::Literal(literal) => node.literals.entry(literal.to_string()).or_default(),
                Segment::Param(name) => {
                    if name.is_empty() {
                        return Err(RouteError::EmptyParam(pattern.to_string()));
                    }
                    let branch = node.param.get_or_insert_with(|| {
                        Box::new(ParamBranch {
                            name: name.to_string(),
                            node: TrieNode::default(),
                        })
                    });
                    if branch.name != name {
                        return Err(RouteError::ConflictingParam {
                            pattern: pattern.to_string(),
                            existing: branch.name.clone(),
                            found: name.to_string(),
                        });
                    }
                    &mut branch.node
                }
            };
        }

        if node.handler.replace(handler).is_some() {
            tracing::debug!(pattern, "route replaced");
        } else {
            self.routes += 1;
        }
        Ok(())
    }

    /// Find the handler for `path`, capturing parameter segments
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_, H>> {
        let mut node = &self.root;
        let mut params = Params::new();
        for segment in split_segments(path) {
            node = if let Some(next) = node.literals.get(segment) {
                next
            } else if let Some(branch) = &node.param {
                params.insert(branch.name.as_str(), segment);
                &branch.node
            } else {
                tracing::trace!(path, segment, "no matching segment");
                return None;
            };
        }
        node.handler
            .as_ref()
            .map(|handler| RouteMatch { handler, params })
    }

    /// Number of registered patterns
    pub fn len(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }
}

impl<H> std::fmt::Debug for RouteTrie<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTrie")
            .field("routes", &self.routes)
            .field("marker", &self.marker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(patterns: &[&'static str]) -> RouteTrie<&'static str> {
        let mut trie = RouteTrie::new(':');
        for pattern in patterns {
            trie.insert(pattern, *pattern).unwrap();
        }
        trie
    }

    #[test]
    fn test_root_route() {
        let trie = trie(&["/"]);
        assert_eq!(*trie.resolve("/").unwrap().handler, "/");
        assert_eq!(*trie.resolve("").unwrap().handler, "/");
        assert!(trie.resolve("/x").is_none());
    }

    #[test]
    fn test_params_captured() {
        let trie = trie(&["/test/:a/:b"]);
        let found = trie.resolve("/test/1/2").unwrap();
        assert_eq!(found.params.get("a"), Some("1"));
        assert_eq!(found.params.get("b"), Some("2"));
        assert!(trie.resolve("/test/1").is_none());
        assert!(trie.resolve("/test/1/2/3").is_none());
    }

    #[test]
    fn test_literal_preferred_over_param() {
        let trie = trie(&["/users/:id", "/users/me"]);
        let me = trie.resolve("/users/me").unwrap();
        assert_eq!(*me.handler, "/users/me");
        assert!(me.params.is_empty());
        assert_eq!(*trie.resolve("/users/42").unwrap().handler, "/users/:id");
    }

    #[test]
    fn test_no_backtracking_after_literal() {
        let trie = trie(&["/a/b", "/:x/c"]);
        assert!(trie.resolve("/a/c").is_none());
        assert_eq!(trie.resolve("/z/c").unwrap().params.get("x"), Some("z"));
    }

    #[test]
    fn test_same_param_name_merges() {
        let trie = trie(&["/post/:id", "/post/:id/edit"]);
        assert_eq!(trie.len(), 2);
        assert_eq!(*trie.resolve("/post/3/edit").unwrap().handler, "/post/:id/edit");
    }

    #[test]
    fn test_conflicting_param_names() {
        let mut trie = trie(&["/post/:id"]);
        let err = trie.insert("/post/:slug", "other").unwrap_err();
        assert_eq!(
            err,
            RouteError::ConflictingParam {
                pattern: "/post/:slug".into(),
                existing: "id".into(),
                found: "slug".into(),
            }
        );
    }

    #[test]
    fn test_empty_param_name() {
        let mut trie = RouteTrie::new(':');
        assert_eq!(trie.insert("/a/:", 1), Err(RouteError::EmptyParam("/a/:".into())));
    }

    #[test]
    fn test_duplicate_pattern_replaces() {
        let mut trie = trie(&["/a"]);
        trie.insert("a/", "again").unwrap();
        assert_eq!(trie.len(), 1);
        assert_eq!(*trie.resolve("/a").unwrap().handler, "again");
    }

    #[test]
    fn test_params_from_iter() {
        let params: Params = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("a", "1"), ("b", "2")]);
    }
}
