//! Generic labeled tree produced by the parser

use std::fmt;

use crate::escape::escape;

/// A name/value pair attached to an element
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// `None` marks an attribute that is skipped on output
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn unset(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// XML element
///
/// The synthetic document root has an empty name; its children are the
/// top-level elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    /// Attributes in document order, duplicates allowed
    pub attributes: Vec<Attribute>,
    /// Child elements in document order
    pub children: Vec<Node>,
    /// Last trimmed text run seen inside the element
    pub body: Option<String>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Synthetic document root
    pub fn root() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Value of the first attribute called `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .and_then(|attr| attr.value.as_deref())
    }

    /// First child called `name`
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// No body, no attributes and no children: dropped by compaction.
    pub fn is_vestigial(&self) -> bool {
        self.body.is_none() && self.attributes.is_empty() && self.children.is_empty()
    }

    /// Number of elements in this subtree, the node itself included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// Single-line rendering for quick inspection. Unlike the serializer it
/// keeps vestigial elements and writes unset attributes as bare names.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return self.children.iter().try_for_each(|child| write!(f, "{child}"));
        }

        write!(f, "<{}", self.name)?;
        for attr in &self.attributes {
            match &attr.value {
                Some(value) => write!(f, " {}=\"{}\"", attr.name, escape(value))?,
                None => write!(f, " {}", attr.name)?,
            }
        }

        if self.children.is_empty() && self.body.is_none() {
            return write!(f, "/>");
        }

        write!(f, ">")?;
        for child in &self.children {
            write!(f, "{child}")?;
        }
        if let Some(body) = &self.body {
            write!(f, "{}", escape(body))?;
        }
        write!(f, "</{}>", self.name)
    }
}
