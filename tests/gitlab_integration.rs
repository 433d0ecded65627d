//! Integration tests for the GitLab client.
//!
//! The REST client runs against a local wiremock server. Live GitLab API
//! tests are behind the `live_gitlab_tests` feature flag.

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tfi::forge::gitlab::{GitLabForge, GitLabToken};
use tfi::forge::mock::MockForge;
use tfi::forge::{collect_var_sources, Forge, ForgeError};

fn forge(server: &MockServer) -> GitLabForge {
    GitLabForge::with_api_base(
        GitLabToken::Private("glpat-test".into()),
        format!("{}/api/v4/", server.uri()),
    )
}

fn vars(pairs: &[(&str, &str)]) -> serde_json::Value {
    serde_json::Value::Array(
        pairs
            .iter()
            .map(|(k, v)| serde_json::json!({ "key": k, "value": v, "protected": false }))
            .collect(),
    )
}

// =============================================================================
// Project lookup
// =============================================================================

mod project {
    use super::*;

    #[tokio::test]
    async fn encodes_namespaced_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/acme%2Fplatform%2Fnetwork"))
            .and(header("private-token", "glpat-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 42,
                "path": "network",
                "path_with_namespace": "acme/platform/network",
                "name": "Network"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let project = forge(&server)
            .get_project("acme/platform/network")
            .await
            .unwrap();

        assert_eq!(project.id, 42);
        assert_eq!(project.path, "network");
        assert_eq!(project.ancestor_groups(), vec!["acme", "acme/platform"]);
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "message": "404 Project Not Found" })),
            )
            .mount(&server)
            .await;

        let err = forge(&server).get_project("acme/gone").await.unwrap_err();
        assert!(matches!(err, ForgeError::NotFound(ref what) if what.contains("acme/gone")));
    }

    #[tokio::test]
    async fn rejected_token_is_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = forge(&server).get_project("acme/infra").await.unwrap_err();
        assert!(matches!(err, ForgeError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn job_token_uses_job_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/acme%2Finfra"))
            .and(header("job-token", "ci-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 7,
                "path": "infra",
                "path_with_namespace": "acme/infra"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let forge = GitLabForge::with_api_base(
            GitLabToken::Job("ci-token".into()),
            format!("{}/api/v4", server.uri()),
        );
        assert_eq!(forge.get_project("acme/infra").await.unwrap().id, 7);
    }
}

// =============================================================================
// Variable listings
// =============================================================================

mod variables {
    use super::*;

    #[tokio::test]
    async fn follows_next_page_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/42/variables"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Next-Page", "2")
                    .set_body_json(vars(&[("a", "1"), ("b", "2")])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/42/variables"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Next-Page", "")
                    .set_body_json(vars(&[("c", "3")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let listed = forge(&server).list_project_variables(42).await.unwrap();
        let keys: Vec<&str> = listed.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_listing_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/groups/acme/variables"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vars(&[])))
            .mount(&server)
            .await;

        assert!(forge(&server)
            .list_group_variables("acme")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn failing_page_fails_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/groups/acme%2Fplatform/variables"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Next-Page", "2")
                    .set_body_json(vars(&[("TF_VAR_a", "1")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/groups/acme%2Fplatform/variables"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = forge(&server)
            .list_group_variables("acme/platform")
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::ApiError { status: 500, .. }));
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = forge(&server).list_project_variables(1).await.unwrap_err();
        assert!(matches!(err, ForgeError::RateLimited));
    }
}

// =============================================================================
// Source collection over the REST client
// =============================================================================

mod sources {
    use super::*;

    #[tokio::test]
    async fn groups_then_project_with_prefix_stripping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/groups/acme/variables"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(vars(&[("TF_VAR_owner", "acme"), ("DEPLOY_KEY", "x")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/9/variables"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(vars(&[("db_password", "secret")])),
            )
            .mount(&server)
            .await;

        let forge = forge(&server);
        let project = tfi::forge::Project {
            id: 9,
            path: "infra".into(),
            path_with_namespace: "acme/infra".into(),
        };
        let sources = collect_var_sources(&forge, &project).await.unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].vars, vec![("owner".to_string(), "acme".to_string())]);
        assert_eq!(
            sources[1].vars,
            vec![("db_password".to_string(), "secret".to_string())]
        );
        assert!(sources[1].rank > sources[0].rank);
    }

    #[tokio::test]
    async fn mock_forge_matches_rest_shape() {
        let forge = MockForge::new()
            .with_project(3, "acme/infra")
            .with_group_variable("acme", "TF_VAR_owner", "acme");
        let project = forge.get_project("acme/infra").await.unwrap();
        let sources = collect_var_sources(&forge, &project).await.unwrap();

        assert_eq!(sources.len(), 2);
        assert!(sources[1].vars.is_empty());
    }
}

// =============================================================================
// Live GitLab API Tests (behind feature flag)
// =============================================================================

#[cfg(feature = "live_gitlab_tests")]
mod live_tests {
    use super::*;

    fn get_test_project() -> Option<String> {
        std::env::var("TFI_LIVE_PROJECT").ok()
    }

    #[tokio::test]
    async fn live_project_and_variables() {
        let Some(token) = GitLabToken::from_env() else {
            eprintln!("Skipping: GITLAB_TOKEN not set");
            return;
        };

        let Some(project_path) = get_test_project() else {
            eprintln!("Skipping: TFI_LIVE_PROJECT not set");
            return;
        };

        let forge = GitLabForge::new(token);
        let project = forge.get_project(&project_path).await.unwrap();
        assert_eq!(project.path_with_namespace, project_path);

        collect_var_sources(&forge, &project).await.unwrap();
    }

    #[tokio::test]
    async fn live_nonexistent_project() {
        let Some(token) = GitLabToken::from_env() else {
            eprintln!("Skipping: GITLAB_TOKEN not set");
            return;
        };

        let forge = GitLabForge::new(token);
        let result = forge
            .get_project("definitely-does-not-exist-xyz-123/none")
            .await;
        assert!(result.is_err());
    }
}
