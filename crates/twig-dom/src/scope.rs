//! Scope registry
//!
//! Named subscription groups of reactive nodes. A handler attached with
//! `handle_scoped` re-renders every node registered under the scopes it
//! emits to, whatever their position in the tree.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{NodeId, Reactive};

/// Scope name -> subscribed reactive nodes
pub struct ScopeRegistry<S> {
    scopes: HashMap<String, BTreeMap<NodeId, Reactive<S>>>,
}

impl<S> Default for ScopeRegistry<S> {
    fn default() -> Self {
        Self {
            scopes: HashMap::new(),
        }
    }
}

impl<S: 'static> ScopeRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `node` under `name`. Returns false if it was already there.
    pub fn add(&mut self, name: &str, node: &Reactive<S>) -> bool {
        self.scopes
            .entry(name.to_string())
            .or_default()
            .insert(node.id(), node.clone())
            .is_none()
    }

    /// Unsubscribe one node from one scope
    pub fn remove(&mut self, name: &str, id: NodeId) -> bool {
        let Some(members) = self.scopes.get_mut(name) else {
            return false;
        };
        let removed = members.remove(&id).is_some();
        if members.is_empty() {
            self.scopes.remove(name);
        }
        removed
    }

    /// Unsubscribe a node from every listed scope
    pub fn remove_node(&mut self, id: NodeId, names: &[String]) {
        for name in names {
            self.remove(name, id);
        }
    }

    pub fn contains(&self, name: &str, id: NodeId) -> bool {
        self.scopes
            .get(name)
            .is_some_and(|members| members.contains_key(&id))
    }

    /// Whether `id` is subscribed under any scope
    pub fn is_subscribed(&self, id: NodeId) -> bool {
        self.scopes.values().any(|members| members.contains_key(&id))
    }

    /// Nodes subscribed under any of `names`, each listed once
    pub fn subscribers(&self, names: &[String]) -> Vec<Reactive<S>> {
        let mut seen = HashSet::new();
        names
            .iter()
            .filter_map(|name| self.scopes.get(name))
            .flat_map(|members| members.values())
            .filter(|node| seen.insert(node.id()))
            .cloned()
            .collect()
    }

    /// Number of nodes subscribed under `name`
    pub fn len(&self, name: &str) -> usize {
        self.scopes.get(name).map_or(0, BTreeMap::len)
    }

    /// No subscriptions at all
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Scope names with at least one subscriber, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scopes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Drop every subscription
    pub fn clear(&mut self) {
        self.scopes.clear();
    }
}

impl<S> std::fmt::Debug for ScopeRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, members) in &self.scopes {
            map.entry(name, &members.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

/// One or more scope names
pub trait ScopeNames {
    fn into_names(self) -> Vec<String>;
}

impl ScopeNames for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl ScopeNames for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl ScopeNames for &[&str] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> ScopeNames for [&str; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl ScopeNames for Vec<&str> {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl ScopeNames for Vec<String> {
    fn into_names(self) -> Vec<String> {
        self
    }
}
