use super::*;
use mockito::Matcher;

#[test]
fn test_client_new_with_bare_host_defaults_to_https() {
    let client = Client::new("harbor.example.com", Credentials::anonymous()).unwrap();
    assert_eq!(client.base_url(), "https://harbor.example.com");
}

#[test]
fn test_client_keeps_explicit_scheme() {
    let client = Client::new("http://localhost:8080", Credentials::anonymous()).unwrap();
    assert_eq!(client.base_url(), "http://localhost:8080");
}

#[test]
fn test_client_removes_trailing_slashes() {
    let client = Client::new("https://harbor.example.com///", Credentials::anonymous()).unwrap();
    assert_eq!(client.base_url(), "https://harbor.example.com");
}

#[test]
fn test_client_new_with_empty_url_fails() {
    let client = Client::new("  ", Credentials::anonymous());
    assert!(matches!(client.unwrap_err(), HarbexError::Validation { .. }));
}

#[test]
fn test_client_config_default() {
    let config = ClientConfig::new();
    assert_eq!(config.timeout_seconds, 30);
    assert!(!config.insecure_tls);
}

#[test]
fn test_client_with_insecure_tls_builds() {
    let config = ClientConfig::new().with_insecure_tls(true).with_timeout(5);
    let client = Client::with_config("harbor.example.com", Credentials::anonymous(), config);
    assert!(client.is_ok());
}

#[test]
fn test_encode_repository() {
    assert_eq!(encode_repository("nginx"), "nginx");
    assert_eq!(encode_repository("tools/builder"), "tools%252Fbuilder");
}

#[test]
fn test_extract_next_link() {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::LINK,
        "</api/v2.0/projects/p/repositories?page=1&page_size=10>; rel=\"prev\", \
         </api/v2.0/projects/p/repositories?page=3&page_size=10>; rel=\"next\""
            .parse()
            .unwrap(),
    );

    assert_eq!(
        Client::extract_next_link(&headers),
        Some("/api/v2.0/projects/p/repositories?page=3&page_size=10".to_string())
    );
}

#[test]
fn test_extract_next_link_without_next() {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::LINK,
        "</api/v2.0/projects/p/repositories?page=1&page_size=10>; rel=\"prev\""
            .parse()
            .unwrap(),
    );
    assert_eq!(Client::extract_next_link(&headers), None);
    assert_eq!(
        Client::extract_next_link(&reqwest::header::HeaderMap::new()),
        None
    );
}

#[test]
fn test_artifact_with_null_tags() {
    let artifacts: Vec<Artifact> = serde_json::from_str(
        r#"[{"digest": "sha256:aaa", "tags": null}, {"digest": "sha256:bbb"}]"#,
    )
    .unwrap();

    assert!(artifacts[0].tags.is_empty());
    assert!(artifacts[1].tags.is_empty());
}

// Mock-based tests

#[tokio::test]
async fn test_list_repositories() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2.0/projects/library/repositories")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"name": "library/nginx"}, {"name": "library/redis"}]"#)
        .create_async()
        .await;

    let client = Client::new(&server.url(), Credentials::anonymous()).unwrap();
    let repositories = client.list_repositories("library").await.unwrap();

    mock.assert_async().await;
    assert_eq!(
        repositories,
        vec![
            Repository {
                name: "library/nginx".to_string()
            },
            Repository {
                name: "library/redis".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_list_repositories_follows_pagination() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/api/v2.0/projects/library/repositories")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_header(
            "link",
            "</api/v2.0/projects/library/repositories?page=2&page_size=100>; rel=\"next\"",
        )
        .with_body(r#"[{"name": "library/a"}]"#)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/api/v2.0/projects/library/repositories")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_body(r#"[{"name": "library/b"}]"#)
        .create_async()
        .await;

    let client = Client::new(&server.url(), Credentials::anonymous()).unwrap();
    let repositories = client.list_repositories("library").await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let names: Vec<_> = repositories.into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["library/a", "library/b"]);
}

#[tokio::test]
async fn test_list_artifacts_flattens_tags_in_order() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2.0/projects/library/repositories/nginx/artifacts")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("with_tag".into(), "true".into()),
            Matcher::UrlEncoded("page_size".into(), PAGE_SIZE.to_string()),
        ]))
        .with_status(200)
        .with_body(
            r#"[
                {"digest": "sha256:1", "tags": [{"name": "1.25"}, {"name": "latest"}]},
                {"digest": "sha256:2", "tags": null},
                {"digest": "sha256:3", "tags": [{"name": "1.24"}]}
            ]"#,
        )
        .create_async()
        .await;

    let client = Client::new(&server.url(), Credentials::anonymous()).unwrap();
    let artifacts = client.list_artifacts("library", "nginx").await.unwrap();

    mock.assert_async().await;
    assert_eq!(artifacts.len(), 3);
    let tags: Vec<_> = artifacts
        .iter()
        .flat_map(|a| a.tags.iter().map(|t| t.name.as_str()))
        .collect();
    assert_eq!(tags, vec!["1.25", "latest", "1.24"]);
}

#[tokio::test]
async fn test_list_artifacts_encodes_nested_repository() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock(
            "GET",
            Matcher::Regex(
                r"^/api/v2\.0/projects/team/repositories/tools%252Fbuilder/artifacts".into(),
            ),
        )
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = Client::new(&server.url(), Credentials::anonymous()).unwrap();
    let artifacts = client.list_artifacts("team", "tools/builder").await.unwrap();

    mock.assert_async().await;
    assert!(artifacts.is_empty());
}

#[tokio::test]
async fn test_basic_credentials_are_sent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2.0/projects/private/repositories")
        .match_query(Matcher::Any)
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = Client::new(&server.url(), Credentials::basic("user", "pass")).unwrap();
    let repositories = client.list_repositories("private").await.unwrap();

    mock.assert_async().await;
    assert!(repositories.is_empty());
}

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2.0/projects/private/repositories")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"errors":[{"code":"UNAUTHORIZED"}]}"#)
        .create_async()
        .await;

    let client = Client::new(&server.url(), Credentials::anonymous()).unwrap();
    let result = client.list_repositories("private").await;

    mock.assert_async().await;
    assert!(matches!(
        result.unwrap_err(),
        HarbexError::Authentication {
            status_code: Some(401),
            ..
        }
    ));
}

#[tokio::test]
async fn test_forbidden_is_authentication_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2.0/projects/private/repositories")
        .match_query(Matcher::Any)
        .with_status(403)
        .create_async()
        .await;

    let client = Client::new(&server.url(), Credentials::anonymous()).unwrap();
    let result = client.list_repositories("private").await;

    assert!(matches!(
        result.unwrap_err(),
        HarbexError::Authentication {
            status_code: Some(403),
            ..
        }
    ));
}

#[tokio::test]
async fn test_missing_project_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2.0/projects/ghost/repositories")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let client = Client::new(&server.url(), Credentials::anonymous()).unwrap();
    let result = client.list_repositories("ghost").await;

    assert!(matches!(result.unwrap_err(), HarbexError::NotFound { .. }));
}

#[tokio::test]
async fn test_server_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2.0/projects/library/repositories/nginx/artifacts")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal server error")
        .create_async()
        .await;

    let client = Client::new(&server.url(), Credentials::anonymous()).unwrap();
    let result = client.list_artifacts("library", "nginx").await;

    assert!(matches!(
        result.unwrap_err(),
        HarbexError::Server {
            status_code: 500,
            ..
        }
    ));
}

#[tokio::test]
async fn test_invalid_json_is_validation_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2.0/projects/library/repositories")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let client = Client::new(&server.url(), Credentials::anonymous()).unwrap();
    let result = client.list_repositories("library").await;

    assert!(matches!(result.unwrap_err(), HarbexError::Validation { .. }));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on port 1.
    let client = Client::new("http://127.0.0.1:1", Credentials::anonymous()).unwrap();
    let result = client.list_repositories("library").await;

    assert!(matches!(result.unwrap_err(), HarbexError::Network { .. }));
}
