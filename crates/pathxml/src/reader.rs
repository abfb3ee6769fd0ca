//! Streaming XML tokenizer
//!
//! Produces the raw start/end element events the normalizer works from.

pub mod cursor;
pub mod event;
pub mod parser;

pub use cursor::Cursor;
pub use event::{Attribute, RawEvent, RawKind};
pub use parser::{Config, Reader};
