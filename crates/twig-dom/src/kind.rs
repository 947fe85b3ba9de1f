//! Renderable tag kinds

use std::str::FromStr;

use crate::DomError;

/// Closed set of element kinds the tree can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    A,
    Div,
    Span,
    P,
    H1,
    H2,
    H3,
    Button,
    Ul,
    Li,
    Section,
}

impl TagKind {
    /// Every supported kind
    pub const ALL: [TagKind; 11] = [
        TagKind::A,
        TagKind::Div,
        TagKind::Span,
        TagKind::P,
        TagKind::H1,
        TagKind::H2,
        TagKind::H3,
        TagKind::Button,
        TagKind::Ul,
        TagKind::Li,
        TagKind::Section,
    ];

    /// Lowercase tag name
    pub fn as_str(self) -> &'static str {
        match self {
            TagKind::A => "a",
            TagKind::Div => "div",
            TagKind::Span => "span",
            TagKind::P => "p",
            TagKind::H1 => "h1",
            TagKind::H2 => "h2",
            TagKind::H3 => "h3",
            TagKind::Button => "button",
            TagKind::Ul => "ul",
            TagKind::Li => "li",
            TagKind::Section => "section",
        }
    }
}

impl FromStr for TagKind {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        TagKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or(DomError::UnknownTag(name))
    }
}

impl std::fmt::Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
