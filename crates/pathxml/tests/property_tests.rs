//! Property-based tests for path event normalization
//!
//! Random element trees are rendered to XML, then:
//! 1. The normalized stream equals a reference model: leaves as one `data`
//!    event carrying their exact text, containers as `start` … `end`,
//!    attributes right after their element's principal event in source order.
//! 2. Building the same stream twice gives equal values.
//!
//! Trees mix prefixed and bare names, unsorted attributes, whitespace-only and
//! entity-bearing text, and indentation between children.

use proptest::prelude::*;
use pathxml::{build, parse, MapBuilder, PathEvent, Result};

const NAMESPACES: &str = r#" xmlns="urn:default" xmlns:p="urn:p" xmlns:q="urn:q""#;

#[derive(Debug, Clone)]
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    /// Whitespace written before each child and before the end tag
    indent: String,
    children: Vec<Node>,
}

fn arb_name(locals: &'static str) -> impl Strategy<Value = String> {
    (prop::option::of(prop_oneof!["p", "q"]), locals).prop_map(|(prefix, local)| match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local,
    })
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9 ]{0,5}",
        "[ \t\n]{1,4}",
        "[a-z &<>\"']{1,6}",
    ]
}

fn arb_attributes() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((arb_name("[r-z]"), "[a-z0-9 &<>\"']{0,4}"), 0..4).prop_map(
        |attrs| {
            let mut seen = Vec::new();
            attrs
                .into_iter()
                .filter(|(name, _)| {
                    let fresh = !seen.contains(name);
                    if fresh {
                        seen.push(name.clone());
                    }
                    fresh
                })
                .collect()
        },
    )
}

fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = (arb_name("[a-c]"), arb_attributes(), arb_text()).prop_map(
        |(name, attributes, text)| Node {
            name,
            attributes,
            text,
            indent: String::new(),
            children: Vec::new(),
        },
    );

    leaf.prop_recursive(4, 48, 4, |inner| {
        (
            arb_name("[a-c]"),
            arb_attributes(),
            "[ \t\n]{0,3}",
            prop::collection::vec(inner, 1..4),
        )
            .prop_map(|(name, attributes, indent, children)| Node {
                name,
                attributes,
                text: String::new(),
                indent,
                children,
            })
    })
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn render(node: &Node, root: bool, out: &mut String) {
    out.push('<');
    out.push_str(&node.name);
    if root {
        out.push_str(NAMESPACES);
    }
    for (name, value) in &node.attributes {
        out.push_str(&format!(" {name}=\"{}\"", escape(value)));
    }
    out.push('>');
    out.push_str(&escape(&node.text));
    for child in &node.children {
        out.push_str(&node.indent);
        render(child, false, out);
    }
    out.push_str(&node.indent);
    out.push_str(&format!("</{}>", node.name));
}

fn document(node: &Node) -> String {
    let mut xml = String::new();
    render(node, true, &mut xml);
    xml
}

fn expected_events(node: &Node, parent: Option<&str>, out: &mut Vec<PathEvent>) {
    let path = match parent {
        Some(parent) => format!("{parent}.{}", node.name),
        None => node.name.clone(),
    };
    if node.children.is_empty() {
        out.push(PathEvent::data(path.as_str(), node.text.as_str()));
    } else {
        out.push(PathEvent::start(path.as_str()));
    }
    for (name, value) in &node.attributes {
        out.push(PathEvent::data(format!("{path}.@{name}"), value.as_str()));
    }
    if !node.children.is_empty() {
        for child in &node.children {
            expected_events(child, Some(&path), out);
        }
        out.push(PathEvent::end(path.as_str()));
    }
}

fn normalized(xml: &str) -> Result<Vec<PathEvent>> {
    parse(xml.as_bytes()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn normalized_stream_matches_reference(node in arb_node()) {
        let xml = document(&node);
        let mut expected = Vec::new();
        expected_events(&node, None, &mut expected);

        let actual = normalized(&xml);
        prop_assert_eq!(actual, Ok(expected), "document: {}", xml);
    }

    #[test]
    fn starts_and_ends_are_balanced(node in arb_node()) {
        let events = normalized(&document(&node));
        prop_assert!(events.is_ok());

        let mut open: Vec<String> = Vec::new();
        for event in events.unwrap_or_default() {
            if event.is_start() {
                open.push(event.path);
            } else if event.is_end() {
                prop_assert_eq!(open.pop(), Some(event.path));
            } else if let Some(parent) = open.last() {
                let prefix = format!("{parent}.");
                prop_assert!(event.path.starts_with(&prefix));
            }
        }
        prop_assert!(open.is_empty());
    }

    #[test]
    fn rebuilding_is_idempotent(node in arb_node()) {
        let events = normalized(&document(&node)).unwrap_or_default();

        let first = build::<MapBuilder, _>(events.iter().cloned().map(Ok));
        let second = build::<MapBuilder, _>(events.into_iter().map(Ok));
        prop_assert!(first.is_ok());
        prop_assert_eq!(first, second);
    }
}
