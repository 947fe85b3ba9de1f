//! Navigation sources
//!
//! The router follows the fragment of a URL. `HashLocation` keeps an
//! in-memory session history of URLs and notifies subscribers whenever the
//! current fragment changes, the way a browser fires `hashchange`.

use std::cell::RefCell;
use std::rc::Rc;

use url::Url;

use crate::RouteResult;

/// Called with the new path after a navigation
pub type PathListener = Rc<dyn Fn(&str)>;

/// Something the router can follow
pub trait NavigationSource {
    /// Current navigation path, without the leading `#`
    fn current_path(&self) -> String;

    /// Register a listener for path changes
    fn subscribe(&self, listener: PathListener);
}

struct History {
    entries: Vec<Url>,
    current: usize,
    listeners: Vec<PathListener>,
}

impl History {
    fn current(&self) -> &Url {
        &self.entries[self.current]
    }
}

/// Session history whose paths live in the URL fragment
#[derive(Clone)]
pub struct HashLocation {
    history: Rc<RefCell<History>>,
}

fn fragment_path(url: &Url) -> String {
    url.fragment().unwrap_or("").to_string()
}

impl HashLocation {
    /// Start a history at `href`, e.g. `http://localhost/#/test`
    pub fn new(href: &str) -> RouteResult<Self> {
        let url = Url::parse(href)?;
        Ok(Self {
            history: Rc::new(RefCell::new(History {
                entries: vec![url],
                current: 0,
                listeners: Vec::new(),
            })),
        })
    }

    /// Full URL of the current entry
    pub fn href(&self) -> String {
        self.history.borrow().current().to_string()
    }

    /// Fragment including `#`, or empty when there is none
    pub fn hash(&self) -> String {
        match self.history.borrow().current().fragment() {
            Some(fragment) if !fragment.is_empty() => format!("#{fragment}"),
            _ => String::new(),
        }
    }

    /// Number of entries in the session history
    pub fn length(&self) -> usize {
        self.history.borrow().entries.len()
    }

    /// Navigate to `target`, resolved against the current URL.
    ///
    /// `#/users/3` only changes the fragment. Forward entries are dropped.
    pub fn push(&self, target: &str) -> RouteResult<()> {
        let before = self.current_path();
        {
            let mut history = self.history.borrow_mut();
            let url = history.current().join(target)?;
            let keep = history.current + 1;
            history.entries.truncate(keep);
            history.entries.push(url);
            history.current = history.entries.len() - 1;
        }
        self.notify_if_changed(&before);
        Ok(())
    }

    /// Replace the current entry with `target`
    pub fn replace(&self, target: &str) -> RouteResult<()> {
        let before = self.current_path();
        {
            let mut history = self.history.borrow_mut();
            let url = history.current().join(target)?;
            let current = history.current;
            history.entries[current] = url;
        }
        self.notify_if_changed(&before);
        Ok(())
    }

    /// Step back one entry. Returns false at the start of the history.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Step forward one entry. Returns false at the end of the history.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Move `delta` entries through the history
    pub fn go(&self, delta: isize) -> bool {
        let before = self.current_path();
        {
            let mut history = self.history.borrow_mut();
            let Some(index) = history.current.checked_add_signed(delta) else {
                return false;
            };
            if delta == 0 || index >= history.entries.len() {
                return false;
            }
            history.current = index;
        }
        self.notify_if_changed(&before);
        true
    }

    fn notify_if_changed(&self, before: &str) {
        let path = self.current_path();
        if path == before {
            return;
        }
        tracing::debug!(from = before, to = %path, "hash changed");
        let listeners = self.history.borrow().listeners.clone();
        for listener in listeners {
            listener(&path);
        }
    }
}

impl NavigationSource for HashLocation {
    fn current_path(&self) -> String {
        fragment_path(self.history.borrow().current())
    }

    fn subscribe(&self, listener: PathListener) {
        self.history.borrow_mut().listeners.push(listener);
    }
}

impl std::fmt::Debug for HashLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let history = self.history.borrow();
        f.debug_struct("HashLocation")
            .field("href", &history.current().as_str())
            .field("index", &history.current)
            .field("entries", &history.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(location: &HashLocation) -> Rc<RefCell<Vec<String>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        location.subscribe(Rc::new(move |path: &str| sink.borrow_mut().push(path.to_string())));
        seen
    }

    #[test]
    fn test_initial_path_from_fragment() {
        let location = HashLocation::new("http://localhost/#/test/1").unwrap();
        assert_eq!(location.current_path(), "/test/1");
        assert_eq!(location.hash(), "#/test/1");

        let bare = HashLocation::new("http://localhost/").unwrap();
        assert_eq!(bare.current_path(), "");
        assert_eq!(bare.hash(), "");
    }

    #[test]
    fn test_push_notifies_listeners() {
        let location = HashLocation::new("http://localhost/").unwrap();
        let seen = recorder(&location);

        location.push("#/test").unwrap();
        location.push("#/test").unwrap();
        assert_eq!(*seen.borrow(), vec!["/test"]);
        assert_eq!(location.href(), "http://localhost/#/test");
        assert_eq!(location.length(), 3);
    }

    #[test]
    fn test_back_and_forward() {
        let location = HashLocation::new("http://localhost/#/").unwrap();
        location.push("#/a").unwrap();
        location.push("#/b").unwrap();
        let seen = recorder(&location);

        assert!(location.back());
        assert!(location.back());
        assert!(!location.back());
        assert!(location.forward());
        assert_eq!(*seen.borrow(), vec!["/a", "/", "/a"]);
    }

    #[test]
    fn test_push_drops_forward_entries() {
        let location = HashLocation::new("http://localhost/#/").unwrap();
        location.push("#/a").unwrap();
        location.push("#/b").unwrap();
        location.go(-2);
        location.push("#/c").unwrap();

        assert_eq!(location.length(), 2);
        assert!(!location.forward());
        assert_eq!(location.current_path(), "/c");
    }

    #[test]
    fn test_replace_keeps_length() {
        let location = HashLocation::new("http://localhost/#/a").unwrap();
        location.replace("#/b").unwrap();
        assert_eq!(location.length(), 1);
        assert_eq!(location.current_path(), "/b");
    }

    #[test]
    fn test_invalid_href() {
        assert!(HashLocation::new("not a url").is_err());
    }
}
