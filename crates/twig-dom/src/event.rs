//! Event kinds
//!
//! Names of the events a listener can be attached to.

/// Event type identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    DblClick,
    MouseDown,
    MouseUp,
    MouseEnter,
    MouseLeave,
    KeyDown,
    KeyUp,
    Input,
    Change,
    Focus,
    Blur,
    Submit,
    Custom(String),
}

impl EventKind {
    /// Parse an event name; unknown names become `Custom`
    pub fn parse(name: &str) -> Self {
        match name {
            "click" => EventKind::Click,
            "dblclick" => EventKind::DblClick,
            "mousedown" => EventKind::MouseDown,
            "mouseup" => EventKind::MouseUp,
            "mouseenter" => EventKind::MouseEnter,
            "mouseleave" => EventKind::MouseLeave,
            "keydown" => EventKind::KeyDown,
            "keyup" => EventKind::KeyUp,
            "input" => EventKind::Input,
            "change" => EventKind::Change,
            "focus" => EventKind::Focus,
            "blur" => EventKind::Blur,
            "submit" => EventKind::Submit,
            other => EventKind::Custom(other.to_string()),
        }
    }

    /// Event name as used by the surface
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Click => "click",
            EventKind::DblClick => "dblclick",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::MouseEnter => "mouseenter",
            EventKind::MouseLeave => "mouseleave",
            EventKind::KeyDown => "keydown",
            EventKind::KeyUp => "keyup",
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
            EventKind::Submit => "submit",
            EventKind::Custom(name) => name,
        }
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        EventKind::parse(name)
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        EventKind::parse(&name)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
