//! End-to-end heartbeat and scrape flow between a real master and slaves
//!
//! These tests verify that:
//! - A slave's heartbeat registers `<peer ip>:<bound port>` on the master
//! - The master's `/metrics` then includes the slave's output
//! - Heartbeats are idempotent
//! - A separate heartbeat listener only serves the control routes

use fleet_exporter::{
    NodeAddress,
    config::Mode,
    roles::{start_master_with, start_slave_with},
    storage::MemoryNodeStore,
};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;

use crate::helpers::*;

#[tokio::test]
async fn test_slave_registers_and_is_aggregated() {
    let master_config = create_test_config(Mode::Master);
    let master = start_master_with(&master_config, Box::new(MemoryNodeStore::new()))
        .await
        .unwrap();

    let slave_config = create_slave_config(master.heartbeat_addr);
    let slave = start_slave_with(&slave_config, static_providers("slave_up 1"))
        .await
        .unwrap();

    slave.heartbeat.beat_now().await.unwrap();

    let expected = NodeAddress::new(format!("127.0.0.1:{}", slave.metrics_addr.port()));
    assert_eq!(master.registry.list().await.unwrap(), vec![expected]);

    let response = scrape(master.metrics_addr, Some(TOKEN)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "slave_up 1");

    slave.shutdown().await.unwrap();
    master.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_repeated_heartbeats_register_once() {
    let master = start_master_with(
        &create_test_config(Mode::Master),
        Box::new(MemoryNodeStore::new()),
    )
    .await
    .unwrap();

    let slave = start_slave_with(
        &create_slave_config(master.heartbeat_addr),
        static_providers("slave_up 1"),
    )
    .await
    .unwrap();

    for _ in 0..3 {
        slave.heartbeat.beat_now().await.unwrap();
    }

    assert_eq!(master.registry.list().await.unwrap().len(), 1);

    slave.shutdown().await.unwrap();
    master.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_two_slaves_aggregated_in_registration_order() {
    let master = start_master_with(
        &create_test_config(Mode::Master),
        Box::new(MemoryNodeStore::new()),
    )
    .await
    .unwrap();

    let first = start_slave_with(
        &create_slave_config(master.heartbeat_addr),
        static_providers("first 1"),
    )
    .await
    .unwrap();
    first.heartbeat.beat_now().await.unwrap();

    let second = start_slave_with(
        &create_slave_config(master.heartbeat_addr),
        static_providers("second 2"),
    )
    .await
    .unwrap();
    second.heartbeat.beat_now().await.unwrap();

    let response = scrape(master.metrics_addr, Some(TOKEN)).await;
    assert_eq!(response.text().await.unwrap(), "first 1\nsecond 2");

    first.shutdown().await.unwrap();
    second.shutdown().await.unwrap();
    master.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_separate_heartbeat_listener() {
    let mut config = create_test_config(Mode::Master);
    config.heartbeat_port = Some(0);

    let master = start_master_with(&config, Box::new(MemoryNodeStore::new()))
        .await
        .unwrap();
    assert_ne!(master.metrics_addr, master.heartbeat_addr);

    let client = reqwest::Client::new();

    // the public listener does not accept heartbeats
    let response = client
        .post(format!("http://{}/heartbeat", master.metrics_addr))
        .bearer_auth(TOKEN)
        .body(r#"{"port": 3035}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // the heartbeat listener does, even without a JSON content type
    let response = client
        .post(format!("http://{}/heartbeat", master.heartbeat_addr))
        .bearer_auth(TOKEN)
        .body(r#"{"port": 3035}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        master.registry.list().await.unwrap(),
        vec![NodeAddress::new("127.0.0.1:3035")]
    );

    // and it has no /metrics
    let response = scrape(master.heartbeat_addr, Some(TOKEN)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    master.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_registered_nodes_listing() {
    let master = start_master_with(
        &create_test_config(Mode::Master),
        Box::new(MemoryNodeStore::new()),
    )
    .await
    .unwrap();

    master
        .registry
        .add(NodeAddress::new("10.0.0.1:3035"))
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .get(format!("http://{}/nodes", master.heartbeat_addr))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let nodes: Vec<NodeAddress> = response.json().await.unwrap();
    assert_eq!(nodes, vec![NodeAddress::new("10.0.0.1:3035")]);

    master.shutdown().await.unwrap();
}
