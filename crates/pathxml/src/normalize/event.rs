//! Path-addressed events

use std::fmt;

/// Kind of a normalized event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EventKind {
    /// A container element (one with child elements) has begun
    Start,
    /// Leaf element text or attribute value
    Data,
    /// A container element has finished
    End,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Data => "data",
            Self::End => "end",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(path, kind, value)` triple
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PathEvent {
    pub path: String,
    pub kind: EventKind,
    /// Text of a `data` event. On `start` and `end` it is whatever text the
    /// tokenizer reported before the container's first child, normally
    /// `None`; builders should not key on it.
    pub value: Option<String>,
}

impl PathEvent {
    pub fn new(path: impl Into<String>, kind: EventKind, value: Option<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            value,
        }
    }

    pub fn start(path: impl Into<String>) -> Self {
        Self::new(path, EventKind::Start, None)
    }

    pub fn data(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(path, EventKind::Data, Some(value.into()))
    }

    pub fn end(path: impl Into<String>) -> Self {
        Self::new(path, EventKind::End, None)
    }

    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    pub fn is_start(&self) -> bool {
        self.kind == EventKind::Start
    }

    pub fn is_end(&self) -> bool {
        self.kind == EventKind::End
    }
}

impl fmt::Display for PathEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} {value:?}", self.path, self.kind),
            None => write!(f, "{} {}", self.path, self.kind),
        }
    }
}
