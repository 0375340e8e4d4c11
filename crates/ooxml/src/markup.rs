//! Index-based element tree for slide markup.
//!
//! Nodes live in a flat arena in document order and store their parent's
//! index, so walking upward from any element needs no back-pointers.

use crate::package::local_name;
use embed_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An attribute with its namespace prefix split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub local: String,
    pub value: String,
}

/// One element of the tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Local element name, without prefix.
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl Node {
    /// Value of the first attribute with this local name, any prefix.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local == local)
            .map(|a| a.value.as_str())
    }

    /// Value of an unprefixed attribute.
    pub fn plain_attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.prefix.is_none() && a.local == local)
            .map(|a| a.value.as_str())
    }

    /// Value of a namespace-prefixed attribute (other than `xmlns`).
    pub fn prefixed_attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| {
                a.local == local
                    && a.prefix.as_deref().is_some_and(|p| !p.is_empty() && p != "xmlns")
            })
            .map(|a| a.value.as_str())
    }
}

/// A parsed document as a node arena.
#[derive(Debug, Clone, Default)]
pub struct MarkupTree {
    nodes: Vec<Node>,
}

impl MarkupTree {
    /// Parse a document in a single pass.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<usize> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let index = push_node(&mut nodes, e, stack.last().copied());
                    stack.push(index);
                }
                Ok(Event::Empty(ref e)) => {
                    push_node(&mut nodes, e, stack.last().copied());
                }
                Ok(Event::End(_)) => {
                    if stack.pop().is_none() {
                        return Err(Error::XmlError("unexpected closing tag".to_string()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::XmlError("unclosed element at end of document".to_string()));
        }

        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Indices of nodes with a given local name, in document order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.name == name)
            .map(|(index, _)| index)
    }

    /// Ancestors of a node, nearest first.
    pub fn ancestors(&self, index: usize) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes[index].parent,
        }
    }

    /// Nearest ancestor whose local name is one of `names`.
    pub fn nearest_ancestor(&self, index: usize, names: &[&str]) -> Option<usize> {
        self.ancestors(index)
            .find(|&ancestor| names.contains(&self.nodes[ancestor].name.as_str()))
    }

    /// Direct child with a given local name.
    pub fn child(&self, index: usize, name: &str) -> Option<usize> {
        self.nodes[index]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].name == name)
    }
}

/// Iterator over a node's ancestors.
pub struct Ancestors<'a> {
    tree: &'a MarkupTree,
    next: Option<usize>,
}

impl Iterator for Ancestors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.tree.nodes[current].parent;
        Some(current)
    }
}

fn push_node(nodes: &mut Vec<Node>, e: &BytesStart, parent: Option<usize>) -> usize {
    let name = e.name();
    let attributes = e
        .attributes()
        .flatten()
        .map(|attr| {
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            Attribute {
                prefix: attr
                    .key
                    .prefix()
                    .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
                local: String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
                value,
            }
        })
        .collect();

    let index = nodes.len();
    nodes.push(Node {
        name: String::from_utf8_lossy(local_name(name.as_ref())).into_owned(),
        attributes,
        parent,
        children: Vec::new(),
    });
    if let Some(parent) = parent {
        nodes[parent].children.push(index);
    }
    index
}
