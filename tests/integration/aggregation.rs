//! Master aggregation against mock slaves
//!
//! These tests verify that:
//! - Slave bodies are concatenated verbatim in registry order
//! - Slow, failing and unreachable slaves are left out without failing the scrape
//! - The master authenticates to slaves with the fleet token

use std::time::Duration;

use fleet_exporter::{
    NodeAddress,
    config::Mode,
    roles::start_master_with,
    storage::MemoryNodeStore,
};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

async fn slave_with_body(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics"))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_partial_failure_keeps_healthy_nodes() {
    let healthy = slave_with_body("node_a_up 1").await;

    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("node_b_up 1")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&slow)
        .await;

    let malformed = slave_with_body("}{ not prometheus at all").await;

    let master = start_master_with(
        &create_test_config(Mode::Master),
        Box::new(MemoryNodeStore::with_nodes(vec![
            node_of(&healthy),
            node_of(&slow),
            node_of(&malformed),
        ])),
    )
    .await
    .unwrap();

    let response = scrape(master.metrics_addr, Some(TOKEN)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.text().await.unwrap(),
        "node_a_up 1\n}{ not prometheus at all"
    );

    master.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_error_status_and_unreachable_nodes_are_skipped() {
    let first = slave_with_body("first 1").await;

    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&broken)
        .await;

    let last = slave_with_body("last 1").await;

    let master = start_master_with(
        &create_test_config(Mode::Master),
        Box::new(MemoryNodeStore::with_nodes(vec![
            node_of(&first),
            node_of(&broken),
            NodeAddress::new("127.0.0.1:9"),
            node_of(&last),
        ])),
    )
    .await
    .unwrap();

    let response = scrape(master.metrics_addr, Some(TOKEN)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "first 1\nlast 1");

    master.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_all_nodes_down_yields_empty_ok() {
    let master = start_master_with(
        &create_test_config(Mode::Master),
        Box::new(MemoryNodeStore::with_nodes(vec![
            NodeAddress::new("127.0.0.1:9"),
        ])),
    )
    .await
    .unwrap();

    let response = scrape(master.metrics_addr, Some(TOKEN)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "");

    master.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_nodes_are_fetched_concurrently() {
    let mut servers = vec![];
    for i in 0..3 {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("node_{i} 1"))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        servers.push(server);
    }

    let master = start_master_with(
        &create_test_config(Mode::Master),
        Box::new(MemoryNodeStore::with_nodes(
            servers.iter().map(node_of).collect(),
        )),
    )
    .await
    .unwrap();

    let started = std::time::Instant::now();
    let response = scrape(master.metrics_addr, Some(TOKEN)).await;
    let body = response.text().await.unwrap();

    // three sequential fetches would need at least 900ms and exceed the 500ms timeout
    assert!(started.elapsed() < Duration::from_millis(850));
    assert_eq!(body, "node_0 1\nnode_1 1\nnode_2 1");

    master.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unauthenticated_scrape_does_no_fan_out() {
    let slave = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x 1"))
        .expect(0)
        .mount(&slave)
        .await;

    let master = start_master_with(
        &create_test_config(Mode::Master),
        Box::new(MemoryNodeStore::with_nodes(vec![node_of(&slave)])),
    )
    .await
    .unwrap();

    assert_eq!(
        scrape(master.metrics_addr, None).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        scrape(master.metrics_addr, Some("wrong")).await.status(),
        StatusCode::UNAUTHORIZED
    );

    slave.verify().await;
    master.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_open_metrics_when_auth_disabled() {
    let slave = slave_with_body("x 1").await;

    let mut config = create_test_config(Mode::Master);
    config.require_auth = false;

    let master = start_master_with(&config, Box::new(MemoryNodeStore::with_nodes(vec![node_of(&slave)])))
        .await
        .unwrap();

    let response = scrape(master.metrics_addr, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    // the master still presents the token to slaves
    assert_eq!(response.text().await.unwrap(), "x 1");

    master.shutdown().await.unwrap();
}
