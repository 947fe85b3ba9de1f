//! Class list
//!
//! Ordered, duplicate-free set of class names held by a surface element.

/// Space-separated class tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    tokens: Vec<String>,
}

impl ClassList {
    /// Create empty class list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a space-separated string
    pub fn parse(value: &str) -> Self {
        let mut list = Self::new();
        for token in value.split_whitespace() {
            list.add(token);
        }
        list
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Add a class; empty or duplicate names are ignored.
    /// Returns whether the list changed.
    pub fn add(&mut self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() || self.contains(token) {
            return false;
        }
        self.tokens.push(token.to_string());
        true
    }

    /// Remove a class, returns whether it was present
    pub fn remove(&mut self, token: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != token);
        self.tokens.len() != before
    }

    /// Toggle a class, returns the new state
    pub fn toggle(&mut self, token: &str) -> bool {
        if self.remove(token) {
            false
        } else {
            self.add(token)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl std::fmt::Display for ClassList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_ignores_empty_and_duplicates() {
        let mut list = ClassList::new();
        assert!(list.add("red"));
        assert!(!list.add("red"));
        assert!(!list.add(""));
        assert!(!list.add("   "));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_parse_and_display() {
        let list = ClassList::parse("flex  red flex");
        assert_eq!(list.to_string(), "flex red");
    }

    #[test]
    fn test_toggle() {
        let mut list = ClassList::new();
        assert!(list.toggle("active"));
        assert!(list.contains("active"));
        assert!(!list.toggle("active"));
        assert!(list.is_empty());
    }
}
