//! core::document::parse
//!
//! Conversion from `hcl` syntax trees into the document tree.
//!
//! String, boolean and number literals keep their type. Everything else,
//! including `null`, is carried as the parsed `hcl` expression.

use hcl::{BlockLabel, Expression};

use super::{Attribute, Block, Body, Document, DocumentError, Structure, Value};

/// Parse HCL source into a [`Document`].
pub(super) fn parse_document(source: &str, origin: &str) -> Result<Document, DocumentError> {
    let parsed = hcl::parse(source).map_err(|e| DocumentError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;

    Ok(Document::from_body(convert_body(parsed)))
}

fn convert_body(body: hcl::Body) -> Body {
    let mut out = Body::default();
    for structure in body {
        let item = match structure {
            hcl::Structure::Attribute(attr) => Structure::Attribute(Attribute {
                key: attr.key.to_string(),
                value: convert_expression(attr.expr),
            }),
            hcl::Structure::Block(block) => Structure::Block(Block {
                ident: block.identifier.to_string(),
                labels: block.labels.into_iter().map(label_text).collect(),
                body: convert_body(block.body),
            }),
        };
        out.push(item);
    }
    out
}

fn label_text(label: BlockLabel) -> String {
    match label {
        BlockLabel::String(s) => s,
        BlockLabel::Identifier(ident) => ident.to_string(),
    }
}

fn convert_expression(expr: Expression) -> Value {
    match expr {
        Expression::String(s) => Value::String(s),
        Expression::Bool(b) => Value::Bool(b),
        Expression::Number(n) => Value::Number(n),
        other => Value::Expression(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_keep_their_type() {
        let doc = parse_document(
            "name = \"web\"\nenabled = true\ncount = 3\n",
            "test.tfvars",
        )
        .unwrap();
        let body = doc.body();

        assert_eq!(body.get_attribute("name"), Some(&Value::string("web")));
        assert_eq!(body.get_attribute("enabled"), Some(&Value::Bool(true)));
        assert_eq!(body.get_attribute("count"), Some(&Value::Number(hcl::Number::from(3u64))));
    }

    #[test]
    fn rich_expressions_are_carried_as_text() {
        let doc = parse_document("zones = [\"a\", \"b\"]\n", "test.tfvars").unwrap();

        match doc.body().get_attribute("zones") {
            Some(value @ Value::Expression(_)) => {
                let text = value.to_string();
                assert!(text.contains("\"a\""));
                assert!(text.contains("\"b\""));
            }
            other => panic!("expected expression, got {:?}", other),
        }
    }

    #[test]
    fn blocks_and_labels() {
        let doc = parse_document(
            "variable \"region\" {\n  type = string\n}\n\nterraform {\n  backend \"s3\" {}\n}\n",
            "main.tf",
        )
        .unwrap();

        let var = doc.body().first_block("variable").unwrap();
        assert_eq!(var.first_label(), Some("region"));

        let tf = doc.body().first_block("terraform").unwrap();
        assert!(tf.body.first_matching_block("backend", &["s3"]).is_some());
    }

    #[test]
    fn syntax_errors_name_the_origin() {
        let err = parse_document("variable \"x\" {\n", "broken.tf").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken.tf"), "message was: {}", msg);
    }

    #[test]
    fn empty_source_is_an_empty_document() {
        let doc = parse_document("", "empty.tfvars").unwrap();
        assert!(doc.body().is_empty());
    }
}
