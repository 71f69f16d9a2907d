//! Integration tests for the fetch fallback chain.
//!
//! Exercises the proxy-then-direct ordering against a mock server.

use folio_core::config::{AppConfig, ProxyEndpoint};
use folio_core::fetch::{FetchChain, FetchError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chain_with_proxies(server_uri: &str, proxy_paths: &[&str]) -> FetchChain {
    let config = AppConfig {
        proxies: proxy_paths
            .iter()
            .map(|p| ProxyEndpoint::new(*p, format!("{server_uri}/{p}?target=")))
            .collect(),
        ..AppConfig::default()
    };
    FetchChain::from_config(&config).expect("chain must build")
}

#[tokio::test]
async fn test_direct_path_succeeds_after_all_proxies_fail() {
    let server = MockServer::start().await;
    let target = format!("{}/files/84.txt", server.uri());

    for proxy in ["p1", "p2", "p3"] {
        Mock::given(method("GET"))
            .and(path(format!("/{proxy}")))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/files/84.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("book text"))
        .expect(1)
        .mount(&server)
        .await;

    let chain = chain_with_proxies(&server.uri(), &["p1", "p2", "p3"]);
    let resource = chain.fetch(&target).await.expect("direct path must succeed");
    assert_eq!(resource.text(), "book text");
}

#[tokio::test]
async fn test_all_four_paths_failing_is_unreachable() {
    let server = MockServer::start().await;
    let target = format!("{}/files/84.txt", server.uri());

    for proxy in ["p1", "p2", "p3"] {
        Mock::given(method("GET"))
            .and(path(format!("/{proxy}")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/files/84.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let chain = chain_with_proxies(&server.uri(), &["p1", "p2", "p3"]);
    let error = chain.fetch(&target).await.expect_err("chain must exhaust");
    match error {
        FetchError::Unreachable { url, attempts } => {
            assert_eq!(url, target);
            assert_eq!(attempts, 4, "three proxies plus direct");
        }
        other => panic!("expected Unreachable, got: {other}"),
    }
}

#[tokio::test]
async fn test_first_successful_proxy_short_circuits() {
    let server = MockServer::start().await;
    let target = format!("{}/files/84.txt", server.uri());

    Mock::given(method("GET"))
        .and(path("/p1"))
        .and(query_param("target", target.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("from-proxy"))
        .expect(1)
        .mount(&server)
        .await;
    // Neither the second proxy nor the direct path may be touched.
    Mock::given(method("GET"))
        .and(path("/p2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/84.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let chain = chain_with_proxies(&server.uri(), &["p1", "p2"]);
    let resource = chain.fetch(&target).await.expect("first proxy must win");
    assert_eq!(resource.text(), "from-proxy");
}

#[tokio::test]
async fn test_proxy_receives_percent_encoded_target() {
    let server = MockServer::start().await;
    let target = format!("{}/files/name with space.txt", server.uri());

    // query_param matches against the decoded value, proving the chain
    // sent an encoded one that survives a decode round trip.
    Mock::given(method("GET"))
        .and(path("/p1"))
        .and(query_param("target", target.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let chain = chain_with_proxies(&server.uri(), &["p1"]);
    let resource = chain.fetch(&target).await.expect("proxy must match");
    assert_eq!(resource.text(), "ok");
}

#[tokio::test]
async fn test_content_type_header_is_captured() {
    let server = MockServer::start().await;
    let target = format!("{}/images/cover.png", server.uri());

    Mock::given(method("GET"))
        .and(path("/images/cover.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![1u8, 2, 3])
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;

    let chain = chain_with_proxies(&server.uri(), &[]);
    let resource = chain.fetch(&target).await.expect("direct fetch");
    assert_eq!(resource.content_type.as_deref(), Some("image/png"));
    assert_eq!(resource.body, vec![1u8, 2, 3]);
}
