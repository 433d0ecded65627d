//! core::document::format
//!
//! Canonical serialization.
//!
//! The tree is converted into an `hcl::Body` and written by the `hcl`
//! pretty printer, which owns layout and string escaping (including the
//! `$${` / `%%{` template markers).
//!
//! # Rules
//!
//! - Two-space indentation per nesting level.
//! - A blank line separates a block from any neighbouring item.
//! - Empty top-level blocks are written as `ident "label" {}`.
//! - Non-empty output ends with exactly one newline; an empty body is empty.

use hcl::format::{Format, Formatter};
use hcl::{Expression, Identifier};

use super::{Block, Body, Structure, Value};

/// Serialize a body at the top level.
pub(super) fn format_body(body: &Body) -> hcl::Result<String> {
    let mut formatter = Formatter::builder().indent(b"  ").dense(false).build_vec();
    to_hcl_body(body).format_string(&mut formatter)
}

/// Literal or expression text for a value.
pub(super) fn format_value(value: &Value) -> hcl::Result<String> {
    hcl::format::to_string(&to_hcl_expression(value))
}

fn to_hcl_body(body: &Body) -> hcl::Body {
    body.items().iter().map(to_hcl_structure).collect()
}

fn to_hcl_structure(item: &Structure) -> hcl::Structure {
    match item {
        Structure::Attribute(attr) => hcl::Structure::Attribute(hcl::Attribute::new(
            Identifier::sanitized(attr.key.as_str()),
            to_hcl_expression(&attr.value),
        )),
        Structure::Block(block) => hcl::Structure::Block(to_hcl_block(block)),
    }
}

fn to_hcl_block(block: &Block) -> hcl::Block {
    hcl::Block::builder(Identifier::sanitized(block.ident.as_str()))
        .add_labels(block.labels.iter().map(String::as_str))
        .add_structures(to_hcl_body(&block.body))
        .build()
}

fn to_hcl_expression(value: &Value) -> Expression {
    match value {
        Value::String(s) => Expression::String(s.clone()),
        Value::Bool(b) => Expression::Bool(*b),
        Value::Number(n) => Expression::Number(*n),
        Value::Expression(e) => e.clone(),
    }
}
