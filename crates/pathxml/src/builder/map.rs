//! Mapping/sequence builder

use crate::builder::ObjectBuilder;
use crate::error::{Error, ErrorKind, Result, Span};
use crate::normalize::{EventKind, PathEvent};
use crate::path::SEPARATOR;
use crate::value::{Object, Value};

/// Where an open container sits in its parent: under `key`, at `index` when
/// the key collided into an array
#[derive(Debug)]
struct Frame {
    key: String,
    index: Option<usize>,
}

/// Builds nested objects keyed by tag name (or `@attr`), turning repeated
/// keys into arrays.
///
/// A container is inserted into its parent as soon as its `start` arrives,
/// so [`ObjectBuilder::value`] shows open containers while they fill. Each
/// open container is remembered as a [`Frame`] handle; events are routed by
/// following those handles down from the top-level object.
#[derive(Debug, Default)]
pub struct MapBuilder {
    /// Path prefixes (with trailing separator) stripped to form keys
    roots: Vec<String>,
    frames: Vec<Frame>,
    value: Object,
}

impl MapBuilder {
    /// Number of open containers
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether every container that was started has ended
    pub fn is_complete(&self) -> bool {
        self.frames.is_empty()
    }

    fn make_key(&self, path: &str) -> String {
        match self.roots.last() {
            Some(root) => path.strip_prefix(root.as_str()).unwrap_or(path).to_string(),
            None => path.to_string(),
        }
    }

    fn innermost(&mut self) -> Option<&mut Object> {
        let mut object = &mut self.value;
        for frame in &self.frames {
            let slot = object.get_mut(&frame.key)?;
            let slot = match (frame.index, slot) {
                (Some(index), Value::Array(items)) => items.get_mut(index)?,
                (Some(_), _) => return None,
                (None, slot) => slot,
            };
            object = slot.as_object_mut()?;
        }
        Some(object)
    }

    fn open_container(&mut self, path: &str) -> Result<&mut Object> {
        // Handles stay valid: only `accept` mutates the value
        self.innermost().ok_or_else(|| {
            Error::with_message(
                ErrorKind::UnbalancedEnd {
                    path: path.to_string(),
                },
                Span::empty(),
                "open container is missing from the built value",
            )
        })
    }
}

impl ObjectBuilder for MapBuilder {
    type Output = Object;

    fn new(root: Option<&str>) -> Self {
        Self {
            roots: root.map(|root| format!("{root}{SEPARATOR}")).into_iter().collect(),
            frames: Vec::new(),
            value: Object::new(),
        }
    }

    fn accept(&mut self, event: PathEvent) -> Result<()> {
        match event.kind {
            EventKind::Data => {
                let key = self.make_key(&event.path);
                let value = event.value.unwrap_or_default();
                self.open_container(&event.path)?.insert_repeated(key, value);
            }
            EventKind::Start => {
                let key = self.make_key(&event.path);
                let index = self
                    .open_container(&event.path)?
                    .insert_repeated(key.as_str(), Object::new());
                self.frames.push(Frame { key, index });
                self.roots.push(format!("{}{SEPARATOR}", event.path));
            }
            EventKind::End => {
                if self.frames.pop().is_none() {
                    return Err(Error::unpositioned(ErrorKind::UnbalancedEnd {
                        path: event.path,
                    }));
                }
                self.roots.pop();
            }
        }
        Ok(())
    }

    fn value(&self) -> &Object {
        &self.value
    }

    fn into_value(self) -> Object {
        self.value
    }
}
