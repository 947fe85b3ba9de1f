//! Path and pattern segmentation

/// One segment of a route pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Must match the path segment exactly
    Literal(&'a str),
    /// Captures any path segment under this name
    Param(&'a str),
}

impl<'a> Segment<'a> {
    pub fn parse(raw: &'a str, marker: char) -> Self {
        match raw.strip_prefix(marker) {
            Some(name) => Segment::Param(name),
            None => Segment::Literal(raw),
        }
    }
}

/// Strip a leading `#` and any query string
pub fn normalize_path(path: &str) -> &str {
    let path = path.strip_prefix('#').unwrap_or(path);
    match path.find('?') {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Non-empty `/`-separated segments of a path or pattern.
///
/// `/`, `` and `#/` all yield no segments; `/a//b/` yields `["a", "b"]`.
pub fn split_segments(path: &str) -> Vec<&str> {
    normalize_path(path)
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ignores_empty_segments() {
        assert!(split_segments("/").is_empty());
        assert!(split_segments("").is_empty());
        assert_eq!(split_segments("/test/:a/:b"), vec!["test", ":a", ":b"]);
        assert_eq!(split_segments("a//b/"), vec!["a", "b"]);
    }

    #[test]
    fn test_normalize_strips_hash_and_query() {
        assert_eq!(normalize_path("#/test?x=1"), "/test");
        assert_eq!(normalize_path("/plain"), "/plain");
        assert!(split_segments("#/").is_empty());
    }

    #[test]
    fn test_segment_parse() {
        assert_eq!(Segment::parse(":id", ':'), Segment::Param("id"));
        assert_eq!(Segment::parse("users", ':'), Segment::Literal("users"));
        assert_eq!(Segment::parse("{id", '{'), Segment::Param("id"));
        assert_eq!(Segment::parse(":", ':'), Segment::Param(""));
    }
}
