//! core::document
//!
//! Editable tree for HCL variable files and module files.
//!
//! # Design
//!
//! A [`Document`] is a [`Body`]: an ordered sequence of attributes and
//! labeled blocks. Parsing ([`Document::parse`]) goes through the `hcl`
//! crate and is immediately converted into this tree; serialization converts
//! back and lets `hcl::format` write the bytes.
//!
//! Values are typed literals ([`Value::String`], [`Value::Bool`],
//! [`Value::Number`]) or an opaque `hcl` expression ([`Value::Expression`])
//! for anything richer (lists, maps, references). Expressions are carried,
//! never evaluated.
//!
//! # Invariants
//!
//! - Attribute order is insertion order; replacing a value keeps its slot.
//! - A body never holds two attributes with the same key.
//! - [`Document::to_bytes`] is deterministic: equal trees serialize to
//!   identical bytes.
//!
//! # Example
//!
//! ```
//! use tfi::core::document::{Document, Value};
//!
//! let mut doc = Document::parse("env = \"dev\"\n", "dev.tfvars").unwrap();
//! doc.body_mut().set_attribute("region", Value::string("eu-west-1"));
//!
//! assert_eq!(
//!     String::from_utf8(doc.to_bytes()).unwrap(),
//!     "env = \"dev\"\nregion = \"eu-west-1\"\n"
//! );
//! ```

mod format;
mod parse;

use std::fmt;

use thiserror::Error;

/// Errors from document parsing.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The source text is not valid HCL.
    #[error("failed to parse {origin}: {message}")]
    Parse {
        /// File name or other label for the source
        origin: String,
        /// Diagnostic from the parser
        message: String,
    },
}

/// A literal or expression value assigned to an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Quoted string literal
    String(String),
    /// Boolean literal
    Bool(bool),
    /// Numeric literal
    Number(hcl::Number),
    /// Any other expression, carried unevaluated
    Expression(hcl::Expression),
}

impl Value {
    /// Build a string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    /// Select a literal type for a value received as plain text.
    ///
    /// `true` and `false` become booleans; everything else is a string.
    pub fn from_text(text: &str) -> Self {
        match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => Value::String(other.to_string()),
        }
    }

    /// True for an empty string literal.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::String(s) if s.is_empty())
    }

    /// The string content, if this is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format::format_value(self).map_err(|_| fmt::Error)?)
    }
}

/// A `key = value` item.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name
    pub key: String,
    /// Assigned value
    pub value: Value,
}

/// A labeled block such as `variable "region" { ... }`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Block type (`variable`, `terraform`, `backend`, ...)
    pub ident: String,
    /// Block labels, in order
    pub labels: Vec<String>,
    /// Nested content
    pub body: Body,
}

impl Block {
    /// Create an empty block.
    pub fn new<I, L>(ident: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            ident: ident.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            body: Body::default(),
        }
    }

    /// First label, if any.
    pub fn first_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// Whether this block has the given type and exactly the given labels.
    pub fn matches(&self, ident: &str, labels: &[&str]) -> bool {
        self.ident == ident
            && self.labels.len() == labels.len()
            && self.labels.iter().zip(labels).all(|(a, b)| a == b)
    }
}

/// One item in a body.
#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    /// An attribute
    Attribute(Attribute),
    /// A nested block
    Block(Block),
}

/// Ordered attributes and blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    items: Vec<Structure>,
}

impl Body {
    /// All items, in order.
    pub fn items(&self) -> &[Structure] {
        &self.items
    }

    /// True when the body holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate attributes in order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter().filter_map(|s| match s {
            Structure::Attribute(a) => Some(a),
            Structure::Block(_) => None,
        })
    }

    /// Iterate blocks in order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.items.iter().filter_map(|s| match s {
            Structure::Block(b) => Some(b),
            Structure::Attribute(_) => None,
        })
    }

    /// Look up an attribute value by key.
    pub fn get_attribute(&self, key: &str) -> Option<&Value> {
        self.attributes().find(|a| a.key == key).map(|a| &a.value)
    }

    /// Whether the key is present and carries a non-empty value.
    pub fn has_value(&self, key: &str) -> bool {
        self.get_attribute(key).is_some_and(|v| !v.is_empty())
    }

    /// Insert or replace an attribute.
    ///
    /// A replaced attribute keeps its position; a new one is appended after
    /// the last existing item.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        for item in &mut self.items {
            if let Structure::Attribute(attr) = item {
                if attr.key == key {
                    attr.value = value;
                    return;
                }
            }
        }
        self.items.push(Structure::Attribute(Attribute { key, value }));
    }

    /// Append a block after the last existing item.
    pub fn append_block(&mut self, block: Block) {
        self.items.push(Structure::Block(block));
    }

    /// First block with the given type and labels.
    pub fn first_matching_block(&self, ident: &str, labels: &[&str]) -> Option<&Block> {
        self.blocks().find(|b| b.matches(ident, labels))
    }

    /// First block of the given type, regardless of labels.
    pub fn first_block(&self, ident: &str) -> Option<&Block> {
        self.blocks().find(|b| b.ident == ident)
    }

    pub(crate) fn push(&mut self, item: Structure) {
        match item {
            Structure::Attribute(attr) => self.set_attribute(attr.key, attr.value),
            block => self.items.push(block),
        }
    }
}

/// A parsed (or freshly created) HCL file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    body: Body,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse HCL source text.
    ///
    /// `origin` names the source in error messages.
    pub fn parse(source: &str, origin: &str) -> Result<Self, DocumentError> {
        parse::parse_document(source, origin)
    }

    /// Root body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Mutable root body.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Serialize in canonical form.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    pub(crate) fn from_body(body: Body) -> Self {
        Self { body }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format::format_body(&self.body).map_err(|_| fmt::Error)?)
    }
}
