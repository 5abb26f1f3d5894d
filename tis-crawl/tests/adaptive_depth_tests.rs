mod common;

use std::time::Duration;

use common::{config_for, init_test_logging};
use serde_json::json;
use tis_crawl::{AdaptiveFetcher, CatalogClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A node whose fetch at the default depth is too slow narrows to a
/// shallower depth and succeeds there instead of failing outright.
#[tokio::test]
async fn slow_default_depth_narrows_and_succeeds() {
    init_test_logging();

    let server = MockServer::start().await;

    // childrenlevel=2 (the configured default) never responds in time.
    Mock::given(method("GET"))
        .and(path("/7"))
        .and(query_param("childrenlevel", "2"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(7)).set_body_json(json!({
            "rId": "7", "name": "big"
        })))
        .mount(&server)
        .await;

    // childrenlevel=1 responds instantly.
    Mock::given(method("GET"))
        .and(path("/7"))
        .and(query_param("childrenlevel", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "7", "name": "big"
        })))
        .mount(&server)
        .await;

    let mut config = config_for(&server.uri());
    config.optimization.children_level = 2;
    config.optimization.min_children_level = 1;
    config.optimization.depth_reduction_step = 1;
    // Negative on purpose: it cancels most of the depth-proportional slope
    // so depth 1's timeout stays sub-second while depth 2's is still long
    // enough for the mock's 7s delay to trip it.
    config.optimization.adaptive_timeout_threshold = -4.95;
    config.api.connect_timeout = 0.2;

    let client = CatalogClient::new(&config).unwrap();
    let fetcher = AdaptiveFetcher::new(&client, &config);

    let (body, depth) = fetcher.get_node("7").await;
    assert!(body.is_some(), "fetch should eventually succeed at a narrower depth");
    assert_eq!(depth.0, 1);
    assert!(fetcher.failed_components().is_empty());
    // The narrowed depth must be persisted, not just returned once: later
    // fetches for the same node should reuse it instead of retrying depth 2.
    assert_eq!(fetcher.override_for("7"), Some(1));
}

/// When every phase (iterative fetch, retry-backoff, final long-timeout
/// attempt) fails to reach a node, it is recorded as a failed component
/// rather than the fetch returning an empty body silently.
#[tokio::test]
async fn node_unreachable_at_every_phase_is_recorded_as_failed() {
    init_test_logging();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/unreachable"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut config = config_for(&server.uri());
    config.optimization.children_level = 0;
    config.optimization.min_children_level = 0;
    config.optimization.depth_reduction_step = 1;
    config.optimization.adaptive_timeout_threshold = 0.05;
    config.optimization.retry_backoff_seconds = vec![0.01];
    config.optimization.final_timeout_seconds = 0.05;
    config.api.connect_timeout = 0.2;

    let client = CatalogClient::new(&config).unwrap();
    let fetcher = AdaptiveFetcher::new(&client, &config);

    let (body, _) = fetcher.get_node("unreachable").await;
    assert!(body.is_none());
    assert_eq!(fetcher.failed_components(), vec!["unreachable".to_string()]);
}
