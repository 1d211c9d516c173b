//! REST API resolution.

use super::{RefSource, ResolvedRef};
use crate::core::config::Config;
use crate::error::HttpError;
use crate::http::{GITHUB_JSON, Request, Transport, fetch_json};
use crate::locator::RepositoryRef;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RepoMetadata {
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BranchTip {
    sha: String,
}

/// Look up the default branch (or use `hint`) and its tip commit.
pub fn resolve_via_api(
    transport: &dyn Transport,
    config: &Config,
    repo: &RepositoryRef,
    hint: Option<&str>,
) -> Result<ResolvedRef, HttpError> {
    let token = config.token.as_deref();
    let repo_url = format!("{}/repos/{}/{}", config.api_base, repo.owner, repo.name);

    let meta: RepoMetadata = fetch_json(
        transport,
        &Request::new(&repo_url).accept(GITHUB_JSON).bearer(token),
    )?;
    let default_branch = meta
        .default_branch
        .filter(|b| !b.is_empty())
        .ok_or_else(|| HttpError::Decode {
            url: repo_url.clone(),
            message: "missing default_branch".to_string(),
        })?;
    let branch = hint.map(str::to_string).unwrap_or(default_branch);

    let commit_url = format!("{repo_url}/commits/{branch}");
    let tip: BranchTip = fetch_json(
        transport,
        &Request::new(&commit_url).accept(GITHUB_JSON).bearer(token),
    )?;
    if tip.sha.len() != 40 || !tip.sha.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(HttpError::Decode {
            url: commit_url,
            message: format!("'{}' is not a full commit id", tip.sha),
        });
    }

    tracing::debug!(%branch, sha = %tip.sha, "resolved via API");
    Ok(ResolvedRef {
        branch,
        commit_id: tip.sha.to_ascii_lowercase(),
        source: RefSource::Api,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::UreqTransport;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn config(server: &MockServer) -> Config {
        Config {
            api_base: server.uri(),
            ..Config::default()
        }
    }

    fn repo() -> RepositoryRef {
        RepositoryRef {
            owner: "acme".to_string(),
            name: "widget".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolves_default_branch_tip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget"))
            .and(header("accept", GITHUB_JSON))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "default_branch": "trunk"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/commits/trunk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "sha": SHA })))
            .mount(&server)
            .await;

        let transport = UreqTransport::new(&Config::default());
        let resolved = resolve_via_api(&transport, &config(&server), &repo(), None).unwrap();
        assert_eq!(resolved.branch, "trunk");
        assert_eq!(resolved.commit_id, SHA);
        assert_eq!(resolved.source, RefSource::Api);
    }

    #[tokio::test]
    async fn test_hint_overrides_default_branch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "default_branch": "main"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/commits/release"))
            .and(header("authorization", "Bearer ghp_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "sha": SHA })))
            .mount(&server)
            .await;

        let transport = UreqTransport::new(&Config::default());
        let config = config(&server).with_token(Some("ghp_test".to_string()));
        let resolved = resolve_via_api(&transport, &config, &repo(), Some("release")).unwrap();
        assert_eq!(resolved.branch, "release");
    }

    #[tokio::test]
    async fn test_unexpected_shapes_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "widget" })))
            .mount(&server)
            .await;

        let transport = UreqTransport::new(&Config::default());
        let err = resolve_via_api(&transport, &config(&server), &repo(), None).unwrap_err();
        assert!(matches!(err, HttpError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_abbreviated_sha_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "default_branch": "main"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/commits/main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "sha": "abc1234" })))
            .mount(&server)
            .await;

        let transport = UreqTransport::new(&Config::default());
        let err = resolve_via_api(&transport, &config(&server), &repo(), None).unwrap_err();
        assert!(err.to_string().contains("not a full commit id"));
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let transport = UreqTransport::new(&Config::default());
        let err = resolve_via_api(&transport, &config(&server), &repo(), None).unwrap_err();
        assert!(matches!(err, HttpError::RateLimited { .. }));
    }
}
