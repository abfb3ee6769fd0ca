//! Raw tokenizer events
//!
//! These are the element-boundary events the normalizer consumes. The bundled
//! [`Reader`](super::Reader) produces them, but any tokenizer can feed the
//! normalizer by yielding `Result<RawEvent>` items.

/// Raw event kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawKind {
    Start,
    End,
}

/// An attribute as read from a start tag
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Name as written, possibly `prefix:local` or `{uri}local`
    pub name: String,
    pub prefix: Option<String>,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let prefix = split_prefix(&name).map(str::to_string);
        Self {
            name,
            prefix,
            value: value.into(),
        }
    }
}

/// One element boundary reported by a tokenizer.
///
/// `text` is the element's leading character data (everything before its first
/// child element), present on both the start and the end event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: RawKind,
    /// Tag name as written, possibly `prefix:local` or `{uri}local`
    pub name: String,
    pub prefix: Option<String>,
    pub text: Option<String>,
    /// Always empty on end events
    pub attributes: Vec<Attribute>,
}

impl RawEvent {
    /// Start event; the prefix is taken from a `prefix:local` name
    pub fn start(name: impl Into<String>) -> Self {
        Self::new(RawKind::Start, name.into())
    }

    /// End event; the prefix is taken from a `prefix:local` name
    pub fn end(name: impl Into<String>) -> Self {
        Self::new(RawKind::End, name.into())
    }

    fn new(kind: RawKind, name: String) -> Self {
        let prefix = split_prefix(&name).map(str::to_string);
        Self {
            kind,
            name,
            prefix,
            text: None,
            attributes: Vec::new(),
        }
    }

    /// Override the namespace prefix (e.g. for `{uri}local` names)
    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.map(str::to_string);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn is_start(&self) -> bool {
        self.kind == RawKind::Start
    }
}

/// Prefix of a `prefix:local` name; Clark-notation `{uri}local` names have none
fn split_prefix(name: &str) -> Option<&str> {
    if name.starts_with('{') {
        return None;
    }
    name.split_once(':').map(|(prefix, _)| prefix)
}
