//! core::merge
//!
//! Merging computed and remote values into a variable document.
//!
//! # Precedence
//!
//! 1. Identity values (`env`, `region`, `role_arn`, `session_name`) are
//!    always written, replacing whatever the document held.
//! 2. Remote values are written only when the key is declared by the module
//!    and the document has no non-empty value for it yet. Sources are applied
//!    from highest to lowest rank, so a higher-ranked source wins over a
//!    lower-ranked one, and any local value wins over both.
//!
//! Undeclared remote keys are dropped; Terraform would reject them.

use tracing::debug;

use super::document::{Document, Value};
use super::identity::Identity;
use super::schema::VariableSchema;

/// Variable names written from the identity.
pub const IDENTITY_KEYS: [&str; 4] = ["env", "region", "role_arn", "session_name"];

/// Remote key/value pairs with a precedence rank.
///
/// Higher ranks take precedence over lower ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalVarSource {
    /// Human-readable origin (for logs)
    pub name: String,
    /// Precedence rank
    pub rank: u32,
    /// Pairs in source order
    pub vars: Vec<(String, String)>,
}

impl ExternalVarSource {
    /// Create a source.
    pub fn new(name: impl Into<String>, rank: u32, vars: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            rank,
            vars,
        }
    }
}

/// What a merge did, for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Keys written from remote sources, in write order
    pub written: Vec<String>,
    /// Remote keys dropped because the module does not declare them
    pub undeclared: Vec<String>,
    /// Remote keys skipped because a value was already present
    pub kept: Vec<String>,
}

/// The identity values as `(key, value)` pairs in write order.
pub fn identity_values(identity: &Identity) -> [(&'static str, &str); 4] {
    [
        (IDENTITY_KEYS[0], identity.environment.as_str()),
        (IDENTITY_KEYS[1], identity.region.as_str()),
        (IDENTITY_KEYS[2], identity.role_arn.as_str()),
        (IDENTITY_KEYS[3], identity.session_name.as_str()),
    ]
}

/// Merge identity and remote values into `doc`.
pub fn merge(
    doc: &mut Document,
    schema: &VariableSchema,
    identity: &Identity,
    sources: &[ExternalVarSource],
) -> MergeReport {
    let body = doc.body_mut();
    for (key, value) in identity_values(identity) {
        body.set_attribute(key, Value::string(value));
    }

    let mut ordered: Vec<&ExternalVarSource> = sources.iter().collect();
    // stable: equal ranks keep caller order
    ordered.sort_by(|a, b| b.rank.cmp(&a.rank));

    let mut report = MergeReport::default();
    for source in ordered {
        for (key, value) in &source.vars {
            if !schema.has(key) {
                report.undeclared.push(key.clone());
                continue;
            }
            if body.has_value(key) {
                report.kept.push(key.clone());
                continue;
            }
            body.set_attribute(key.as_str(), Value::from_text(value));
            report.written.push(key.clone());
        }
        debug!(source = %source.name, rank = source.rank, count = source.vars.len(), "applied remote source");
    }

    report
}
