//! forge::vars
//!
//! Collecting a project's CI/CD variables as ranked merge sources.
//!
//! # Ranking
//!
//! Group variables are gathered for every ancestor group, outermost first,
//! and ranked by depth. The project's own variables get the highest rank.
//! Only group variables carrying the `TF_VAR_` prefix are used, with the
//! prefix removed; project variables are used as-is.

use tracing::debug;

use super::traits::{Forge, ForgeError, Project};
use crate::core::merge::ExternalVarSource;

/// Prefix marking a group variable as a Terraform input.
pub const TF_VAR_PREFIX: &str = "TF_VAR_";

/// Fetch group and project variables for `project` as merge sources.
///
/// Sources are returned in fetch order (outermost group first, project
/// last); their ranks encode precedence.
pub async fn collect_var_sources(
    forge: &dyn Forge,
    project: &Project,
) -> Result<Vec<ExternalVarSource>, ForgeError> {
    let groups = project.ancestor_groups();
    let mut sources = Vec::with_capacity(groups.len() + 1);

    for (depth, group) in groups.iter().enumerate() {
        let vars: Vec<(String, String)> = forge
            .list_group_variables(group)
            .await?
            .into_iter()
            .filter_map(|v| {
                v.key
                    .strip_prefix(TF_VAR_PREFIX)
                    .filter(|k| !k.is_empty())
                    .map(|k| (k.to_string(), v.value.clone()))
            })
            .collect();
        debug!(%group, count = vars.len(), "collected group variables");
        sources.push(ExternalVarSource::new(
            format!("group {}", group),
            depth as u32 + 1,
            vars,
        ));
    }

    let vars: Vec<(String, String)> = forge
        .list_project_variables(project.id)
        .await?
        .into_iter()
        .map(|v| (v.key, v.value))
        .collect();
    debug!(project = %project.path_with_namespace, count = vars.len(), "collected project variables");
    sources.push(ExternalVarSource::new(
        format!("project {}", project.path_with_namespace),
        groups.len() as u32 + 1,
        vars,
    ));

    Ok(sources)
}
