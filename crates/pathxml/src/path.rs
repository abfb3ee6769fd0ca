//! Path syntax
//!
//! A path is the dot-joined chain of rendered tag names from the document root
//! down to an element, e.g. `rss.channel.item`. Attributes hang off their
//! element's path as `rss.@version`. Tags render as `prefix:local` when the
//! element carries an explicit namespace prefix and as bare `local` otherwise;
//! namespace URIs never appear in paths.

use crate::error::{Error, ErrorKind, Result};

/// Separates path segments. Reserved: names containing it are rejected.
pub const SEPARATOR: char = '.';

/// Marks an attribute segment
pub const ATTRIBUTE_MARKER: char = '@';

/// Local part of a tag written as `{uri}local`, `prefix:local` or `local`
pub fn local_name(tag: &str) -> &str {
    if tag.starts_with('{') {
        return tag.rsplit_once('}').map_or(tag, |(_, local)| local);
    }
    tag.split_once(':').map_or(tag, |(_, local)| local)
}

/// Render a tag for use in a path; an empty prefix counts as no prefix
pub fn prefixed_tag(prefix: Option<&str>, tag: &str) -> String {
    let local = local_name(tag);
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

/// `parent.@name`
pub fn attribute_path(parent: &str, name: &str) -> String {
    format!("{parent}{SEPARATOR}{ATTRIBUTE_MARKER}{name}")
}

/// Join rendered segments into a path
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let mut path = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            path.push(SEPARATOR);
        }
        path.push_str(segment.as_ref());
    }
    path
}

/// Reject a rendered name that would make paths ambiguous
pub fn check_segment(name: &str) -> Result<()> {
    if name.contains(SEPARATOR) {
        return Err(Error::unpositioned(ErrorKind::ReservedSeparator {
            name: name.to_string(),
        }));
    }
    Ok(())
}
