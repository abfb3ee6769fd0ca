//! Raw element events to path events

use std::collections::VecDeque;

use tracing::trace;

use crate::error::Result;
use crate::normalize::event::PathEvent;
use crate::path;
use crate::reader::event::{RawEvent, RawKind};

/// A start whose element is not yet known to be a leaf or a container
#[derive(Debug)]
struct Pending {
    path: String,
    text: Option<String>,
    attributes: Vec<PathEvent>,
}

/// Turns raw start/end element events into `(path, kind, value)` triples.
///
/// Elements with child elements come out as `start` … `end`; elements without
/// any come out as a single `data` event carrying their text. Attributes follow
/// their element's principal event as `data` events at `path.@name`.
///
/// Whether an element is a leaf is only known once the next raw event
/// arrives, so the start of the most recent element is held back in a single
/// pending slot: a following start proves it a container, a following end at
/// the same path proves it a leaf.
#[derive(Debug)]
pub struct Normalizer<I> {
    events: I,
    tags: Vec<String>,
    pending: Option<Pending>,
    ready: VecDeque<PathEvent>,
    failed: bool,
}

impl<I> Normalizer<I>
where
    I: Iterator<Item = Result<RawEvent>>,
{
    pub fn new(events: I) -> Self {
        Self {
            events,
            tags: Vec::new(),
            pending: None,
            ready: VecDeque::new(),
            failed: false,
        }
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.tags.len()
    }

    /// Give back the underlying raw event source
    pub fn into_inner(self) -> I {
        self.events
    }

    fn handle(&mut self, raw: RawEvent) -> Result<()> {
        match raw.kind {
            RawKind::Start => self.handle_start(raw),
            RawKind::End => {
                self.handle_end(raw);
                Ok(())
            }
        }
    }

    fn handle_start(&mut self, raw: RawEvent) -> Result<()> {
        // A new element began, so the pending one has children
        if let Some(pending) = self.pending.take() {
            self.ready
                .push_back(PathEvent::start(pending.path).with_value(pending.text));
            self.ready.extend(pending.attributes);
        }

        let tag = path::prefixed_tag(raw.prefix.as_deref(), &raw.name);
        path::check_segment(&tag)?;
        self.tags.push(tag);
        let current = path::join(&self.tags);

        let mut attributes = Vec::with_capacity(raw.attributes.len());
        for attribute in raw.attributes {
            let name = path::prefixed_tag(attribute.prefix.as_deref(), &attribute.name);
            path::check_segment(&name)?;
            attributes.push(PathEvent::data(
                path::attribute_path(&current, &name),
                attribute.value,
            ));
        }

        self.pending = Some(Pending {
            path: current,
            text: raw.text,
            attributes,
        });
        Ok(())
    }

    fn handle_end(&mut self, raw: RawEvent) {
        let current = path::join(&self.tags);

        match self.pending.take() {
            Some(pending) if pending.path == current => {
                self.ready
                    .push_back(PathEvent::data(current, pending.text.unwrap_or_default()));
                self.ready.extend(pending.attributes);
            }
            other => {
                self.pending = other;
                self.ready.push_back(PathEvent::end(current).with_value(raw.text));
            }
        }

        self.tags.pop();
    }
}

impl<I> Iterator for Normalizer<I>
where
    I: Iterator<Item = Result<RawEvent>>,
{
    type Item = Result<PathEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                trace!(path = %event.path, kind = %event.kind, "path event");
                return Some(Ok(event));
            }
            if self.failed {
                return None;
            }

            let raw = match self.events.next()? {
                Ok(raw) => raw,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            };
            if let Err(err) = self.handle(raw) {
                self.failed = true;
                self.ready.clear();
                return Some(Err(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::normalize::event::EventKind;

    fn normalize(raw: Vec<RawEvent>) -> Result<Vec<PathEvent>> {
        Normalizer::new(raw.into_iter().map(Ok)).collect()
    }

    #[test]
    fn test_leaf_is_single_data_event() -> Result<()> {
        let events = normalize(vec![
            RawEvent::start("title").with_text("T1"),
            RawEvent::end("title").with_text("T1"),
        ])?;
        assert_eq!(events, vec![PathEvent::data("title", "T1")]);
        Ok(())
    }

    #[test]
    fn test_leaf_without_text_is_empty_string() -> Result<()> {
        let events = normalize(vec![RawEvent::start("a"), RawEvent::end("a")])?;
        assert_eq!(events, vec![PathEvent::data("a", "")]);
        Ok(())
    }

    #[test]
    fn test_container_is_start_and_end() -> Result<()> {
        let events = normalize(vec![
            RawEvent::start("a"),
            RawEvent::start("b").with_text("x"),
            RawEvent::end("b").with_text("x"),
            RawEvent::end("a"),
        ])?;
        assert_eq!(
            events,
            vec![
                PathEvent::start("a"),
                PathEvent::data("a.b", "x"),
                PathEvent::end("a"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_attributes_follow_principal_event() -> Result<()> {
        let events = normalize(vec![
            RawEvent::start("a").with_attribute("x", "1").with_attribute("y", "2"),
            RawEvent::start("b").with_attribute("z", "3"),
            RawEvent::end("b"),
            RawEvent::end("a"),
        ])?;
        assert_eq!(
            events,
            vec![
                PathEvent::start("a"),
                PathEvent::data("a.@x", "1"),
                PathEvent::data("a.@y", "2"),
                PathEvent::data("a.b", ""),
                PathEvent::data("a.b.@z", "3"),
                PathEvent::end("a"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_container_leading_text_rides_on_start() -> Result<()> {
        let events = normalize(vec![
            RawEvent::start("a").with_text("lead"),
            RawEvent::start("b"),
            RawEvent::end("b"),
            RawEvent::end("a").with_text("lead"),
        ])?;
        let kinds: Vec<_> = events.iter().map(|e| (e.kind, e.value.as_deref())).collect();
        assert_eq!(
            kinds,
            vec![
                (EventKind::Start, Some("lead")),
                (EventKind::Data, Some("")),
                (EventKind::End, Some("lead")),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_prefixes_render_in_paths() -> Result<()> {
        let events = normalize(vec![
            RawEvent::start("{http://www.defaultns.com}item"),
            RawEvent::start("{http://www.ns2.com}title")
                .with_prefix(Some("ns2"))
                .with_attribute("xml:lang", "en"),
            RawEvent::end("{http://www.ns2.com}title").with_prefix(Some("ns2")),
            RawEvent::end("{http://www.defaultns.com}item"),
        ])?;
        let paths: Vec<_> = events.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["item", "item.ns2:title", "item.ns2:title.@xml:lang", "item"]
        );
        Ok(())
    }

    #[test]
    fn test_separator_in_tag_fails_fast() {
        let result = normalize(vec![RawEvent::start("a.b"), RawEvent::end("a.b")]);
        assert_eq!(
            result.err().map(|e| e.kind().clone()),
            Some(ErrorKind::ReservedSeparator {
                name: "a.b".to_string()
            })
        );
    }

    #[test]
    fn test_tokenizer_error_passes_through() {
        let failure = Error::unpositioned(ErrorKind::InvalidEntity);
        let raw = vec![
            Ok(RawEvent::start("a")),
            Err(failure.clone()),
            Ok(RawEvent::end("a")),
        ];
        let mut normalizer = Normalizer::new(raw.into_iter());
        assert_eq!(normalizer.next(), Some(Err(failure)));
        assert_eq!(normalizer.next(), None);
    }

    #[test]
    fn test_lazy_pull() {
        let raw = vec![
            RawEvent::start("a"),
            RawEvent::start("b"),
            RawEvent::end("b"),
            RawEvent::end("a"),
        ];
        let mut normalizer = Normalizer::new(raw.into_iter().map(Ok));
        assert_eq!(normalizer.next(), Some(Ok(PathEvent::start("a"))));
        assert_eq!(normalizer.depth(), 2);
        let rest = normalizer.into_inner().count();
        assert_eq!(rest, 2);
    }
}
