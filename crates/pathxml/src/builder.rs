//! Incremental object builders
//!
//! A builder consumes path events one at a time and materializes a value from
//! them. Builders only ever see events in the order the normalizer produced
//! them, with `start`/`end` properly nested.

pub mod map;

pub use map::MapBuilder;

use crate::error::Result;
use crate::normalize::PathEvent;

/// Strategy for turning a path event stream into a value
pub trait ObjectBuilder {
    /// What the builder produces
    type Output;

    /// Fresh builder. With a `root`, event paths are taken relative to it, so
    /// a builder for `rss.channel.item` keys `rss.channel.item.title` as
    /// `title`.
    fn new(root: Option<&str>) -> Self
    where
        Self: Sized;

    /// Feed the next event
    fn accept(&mut self, event: PathEvent) -> Result<()>;

    /// The value built so far
    fn value(&self) -> &Self::Output;

    /// Finish and take the built value
    fn into_value(self) -> Self::Output;
}

/// Drive a fresh root-less builder over a complete event stream
pub fn build<B, I>(events: I) -> Result<B::Output>
where
    B: ObjectBuilder,
    I: IntoIterator<Item = Result<PathEvent>>,
{
    let mut builder = B::new(None);
    for event in events {
        builder.accept(event?)?;
    }
    Ok(builder.into_value())
}
