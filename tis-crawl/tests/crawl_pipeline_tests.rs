mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{config_for, init_test_logging};
use serde_json::json;
use tis_crawl::{aggregator, emitter, orchestrator, validator, AdaptiveFetcher, CatalogClient, RunContext};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// End-to-end: root -> project -> software line -> two artifacts, through
/// fetch, classify/extract, validate, aggregate, and emit. Covers the
/// "latest is the highest numeric id" scenario across real HTTP plumbing
/// rather than a bare in-memory artifact list.
#[tokio::test]
async fn full_crawl_emits_grouped_and_latest_files() {
    init_test_logging();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "1", "name": "root",
            "children": [{"rId": "2", "name": "P1"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "2", "name": "P1",
            "children": [{"rId": "10", "name": "SW1"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "10", "name": "SW1",
            "children": [{"rId": "11", "name": "Model", "children": [
                {
                    "rId": "100", "name": "art1.zip",
                    "component": {"name": "Binary"},
                    "attributes": [{"name": "artifact", "value": "1"}]
                },
                {
                    "rId": "101", "name": "art2.zip",
                    "component": {"name": "Binary"},
                    "attributes": [{"name": "artifact", "value": "1"}]
                }
            ]}]
        })))
        .mount(&server)
        .await;

    let config = Arc::new(config_for(&server.uri()));
    let client = CatalogClient::new(&config).unwrap();
    let fetcher = Arc::new(AdaptiveFetcher::new(&client, &config));

    let output_root = tempfile::tempdir().unwrap();
    let ctx = RunContext::create(output_root.path()).unwrap();

    let crawl = orchestrator::run(fetcher, config.clone(), &ctx).await.unwrap();
    assert_eq!(crawl.known_lines.len(), 1);
    assert_eq!(crawl.artifacts.len(), 2);

    let mut validated = Vec::new();
    for artifact in crawl.artifacts {
        let line_name = artifact.common.upload_path.split('/').nth(1).unwrap_or_default().to_string();
        let outcome = validator::validate(&artifact, &line_name, &config);
        assert!(outcome.tag.is_valid());
        validated.push(artifact);
    }

    let aggregated = aggregator::aggregate(&crawl.known_lines, &validated);
    let latest = aggregated["P1"].software_lines["SW1"].latest_artifact.as_ref().unwrap();
    assert_eq!(latest.common.id.as_str(), "101");

    emitter::emit_all(&aggregated, ctx.run_dir(), "20260101_000000").unwrap();

    let grouped_path = ctx.run_dir().join("Binary_artifacts_20260101_000000.json");
    let latest_path = ctx.run_dir().join("latest_Binary_artifacts_20260101_000000.json");
    assert!(grouped_path.exists());
    assert!(latest_path.exists());

    let grouped: serde_json::Value = serde_json::from_reader(std::fs::File::open(&grouped_path).unwrap()).unwrap();
    let sw1_artifacts = grouped["P1"]["softwareLines"]["SW1"]["artifacts"].as_array().unwrap();
    assert_eq!(sw1_artifacts.len(), 2);

    let latest_file: serde_json::Value = serde_json::from_reader(std::fs::File::open(&latest_path).unwrap()).unwrap();
    assert_eq!(latest_file["P1"]["softwareLines"]["SW1"]["latestArtifact"]["id"], "101");
    assert!(latest_file["P1"]["softwareLines"]["SW1"]["artifacts"].as_array().unwrap().is_empty());
}

/// A software line with no matching artifacts still appears in the
/// aggregated output, with an empty artifact list and no latest pointer.
#[tokio::test]
async fn empty_software_line_is_preserved_through_a_real_crawl() {
    init_test_logging();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "1", "name": "root",
            "children": [{"rId": "2", "name": "P1"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "2", "name": "P1",
            "children": [{"rId": "20", "name": "SW_EMPTY"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "20", "name": "SW_EMPTY", "children": []
        })))
        .mount(&server)
        .await;

    let config = Arc::new(config_for(&server.uri()));
    let client = CatalogClient::new(&config).unwrap();
    let fetcher = Arc::new(AdaptiveFetcher::new(&client, &config));

    let output_root = tempfile::tempdir().unwrap();
    let ctx = RunContext::create(output_root.path()).unwrap();

    let crawl = orchestrator::run(fetcher, config.clone(), &ctx).await.unwrap();
    let aggregated = aggregator::aggregate(&crawl.known_lines, &crawl.artifacts);

    let line = &aggregated["P1"].software_lines["SW_EMPTY"];
    assert!(line.artifacts.is_empty());
    assert!(line.latest_artifact.is_none());
}

/// Cancelling mid software-line stops the leaf-drain loop from enqueuing
/// further batches: a software line whose first unexplored leaf takes long
/// enough to fetch that the run gets cancelled in the meantime must never
/// go on to fetch the second-generation leaf it would otherwise discover.
#[tokio::test]
async fn cancellation_mid_software_line_halts_further_leaf_batches() {
    init_test_logging();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "1", "name": "root",
            "children": [{"rId": "2", "name": "P1"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "2", "name": "P1",
            "children": [{"rId": "10", "name": "SW1"}]
        })))
        .mount(&server)
        .await;

    // depth_used will be 1, so child "A" is left unexplored after the
    // first fetch and becomes the lone entry of leaf batch 1.
    Mock::given(method("GET"))
        .and(path("/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "10", "name": "SW1",
            "children": [{"rId": "20", "name": "A", "children": [{"rId": "21", "name": "a.txt"}]}]
        })))
        .mount(&server)
        .await;

    // Slow enough that the test's canceller fires before this resolves,
    // giving the orchestrator a chance to see the cancellation flag before
    // it would otherwise enqueue leaf batch 2 (fetching "B").
    Mock::given(method("GET"))
        .and(path("/20"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(200))
                .set_body_json(json!({
                    "rId": "20", "name": "A",
                    "children": [{"rId": "30", "name": "B", "children": [{"rId": "31", "name": "b.txt"}]}]
                })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rId": "30", "name": "B", "children": []
        })))
        .mount(&server)
        .await;

    let mut config = config_for(&server.uri());
    config.optimization.children_level = 1;
    config.optimization.min_children_level = 1;
    let config = Arc::new(config);
    let client = CatalogClient::new(&config).unwrap();
    let fetcher = Arc::new(AdaptiveFetcher::new(&client, &config));

    let output_root = tempfile::tempdir().unwrap();
    let ctx = RunContext::create(output_root.path()).unwrap();

    let cancellation = ctx.cancellation().clone();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancellation.cancel();
    });

    orchestrator::run(fetcher, config.clone(), &ctx).await.unwrap();
    canceller.await.unwrap();

    let requests_to_b = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/30")
        .count();
    assert_eq!(requests_to_b, 0, "cancellation should have stopped the drain before leaf batch 2");
}
