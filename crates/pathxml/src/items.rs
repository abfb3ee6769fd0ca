//! Built values for every occurrence of one path

use std::marker::PhantomData;

use tracing::debug;

use crate::builder::{MapBuilder, ObjectBuilder};
use crate::error::{Error, ErrorKind, Result, Span};
use crate::normalize::{EventKind, PathEvent};
use crate::value::Value;

/// Yields one value per occurrence of `path` in a path event stream.
///
/// A container occurrence is built by a fresh `B` rooted at `path` from the
/// events strictly between its `start` and matching `end`. A leaf occurrence
/// yields its text. Everything outside the path is skipped.
#[derive(Debug)]
pub struct Items<I, B = MapBuilder> {
    events: I,
    path: String,
    failed: bool,
    builder: PhantomData<fn() -> B>,
}

impl<I, B> Items<I, B>
where
    I: Iterator<Item = Result<PathEvent>>,
    B: ObjectBuilder,
    B::Output: Into<Value>,
{
    pub fn new(events: I, path: impl Into<String>) -> Self {
        Self {
            events,
            path: path.into(),
            failed: false,
            builder: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn build_occurrence(&mut self) -> Result<Value> {
        let mut builder = B::new(Some(&self.path));
        loop {
            let event = match self.events.next() {
                Some(event) => event?,
                None => {
                    return Err(Error::with_message(
                        ErrorKind::UnexpectedEof,
                        Span::empty(),
                        format!("event stream ended inside {}", self.path),
                    ))
                }
            };
            if event.kind == EventKind::End && event.path == self.path {
                return Ok(builder.into_value().into());
            }
            builder.accept(event)?;
        }
    }

    fn next_item(&mut self) -> Result<Option<Value>> {
        while let Some(event) = self.events.next() {
            let event = event?;
            if event.path != self.path {
                continue;
            }
            match event.kind {
                EventKind::Start => {
                    let value = self.build_occurrence()?;
                    debug!(path = %self.path, "built item");
                    return Ok(Some(value));
                }
                EventKind::Data => {
                    debug!(path = %self.path, "leaf item");
                    return Ok(Some(Value::String(event.value.unwrap_or_default())));
                }
                EventKind::End => {}
            }
        }
        Ok(None)
    }
}

impl<I, B> Iterator for Items<I, B>
where
    I: Iterator<Item = Result<PathEvent>>,
    B: ObjectBuilder,
    B::Output: Into<Value>,
{
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_item() {
            Ok(item) => item.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
