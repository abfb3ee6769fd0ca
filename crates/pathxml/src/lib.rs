//! pathxml - streaming XML to path events and incrementally built values
//!
//! A document is read as a flat stream of `(path, kind, value)` events, where
//! leaf elements arrive as a single `data` event and attributes as `data`
//! events under `path.@name`. Builders turn that stream into nested values
//! without holding the whole document in memory.
//!
//! # Quick Start
//!
//! ```
//! use pathxml::{from_xml_str, Value};
//! # fn main() -> Result<(), pathxml::Error> {
//! let xml = r#"<rss version="2.0"><channel><item><title>T1</title></item></channel></rss>"#;
//! let value = from_xml_str(xml)?;
//! assert_eq!(value.pointer("rss.@version"), Some(&Value::from("2.0")));
//! assert_eq!(value.pointer("rss.channel.item.title"), Some(&Value::from("T1")));
//! # Ok(())
//! # }
//! ```
//!
//! Iterating over every `item` of a feed:
//!
//! ```
//! # fn main() -> Result<(), pathxml::Error> {
//! let xml = "<channel><item><title>A</title></item><item><title>B</title></item></channel>";
//! for item in pathxml::items(xml.as_bytes(), "channel.item") {
//!     let item = item?;
//!     assert!(item.get("title").is_some());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use tracing::instrument;

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod input;
pub use input::Input;

pub mod reader;
pub use reader::{Attribute, Config, RawEvent, RawKind, Reader};

pub mod path;

pub mod normalize;
pub use normalize::{EventKind, Normalizer, PathEvent};

pub mod value;
pub use value::{Array, Object, Value};

pub mod builder;
pub use builder::{build, MapBuilder, ObjectBuilder};

pub mod items;
pub use items::Items;

/// Path event stream over an in-memory document
pub fn parse(input: &[u8]) -> Normalizer<Reader<'_>> {
    parse_with_config(input, Config::default())
}

/// Path event stream with custom reader configuration
pub fn parse_with_config(input: &[u8], config: Config) -> Normalizer<Reader<'_>> {
    Normalizer::new(Reader::with_config(input, config))
}

/// Built values for every occurrence of `path`
pub fn items<'a>(input: &'a [u8], path: &str) -> Items<Normalizer<Reader<'a>>> {
    Items::new(parse(input), path)
}

/// Built values for every occurrence of `path`, with custom reader configuration
pub fn items_with_config<'a>(
    input: &'a [u8],
    path: &str,
    config: Config,
) -> Items<Normalizer<Reader<'a>>> {
    Items::new(parse_with_config(input, config), path)
}

/// Build the whole document from a string
#[instrument(skip_all, fields(len = s.len()))]
pub fn from_xml_str(s: &str) -> Result<Value> {
    from_xml_bytes(s.as_bytes())
}

/// Build the whole document from bytes
#[instrument(skip_all, fields(len = bytes.len()))]
pub fn from_xml_bytes(bytes: &[u8]) -> Result<Value> {
    build::<MapBuilder, _>(parse(bytes)).map(Value::Object)
}
