//! Failure tests for startup, persistence and degraded operation
//!
//! These tests verify that the system handles failures gracefully:
//! - Missing slave configuration is fatal at startup
//! - An unreachable master does not affect the slave's own endpoint
//! - The node list survives a master restart
//! - A broken node list file is not fatal

use fleet_exporter::{
    NodeAddress,
    config::Mode,
    roles::{start_master_with, start_slave_with},
    storage::FileNodeStore,
};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use tempfile::tempdir;

use crate::helpers::*;

#[tokio::test]
async fn test_slave_without_token_fails_to_start() {
    let mut config = create_slave_config("127.0.0.1:9".parse().unwrap());
    config.token = None;

    let result = start_slave_with(&config, static_providers("x 1")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_slave_without_master_fails_to_start() {
    let mut config = create_test_config(Mode::Slave);
    config.master_url = None;

    let err = start_slave_with(&config, static_providers("x 1"))
        .await
        .err()
        .expect("slave must not start without a master");
    assert!(format!("{err:#}").contains("master_url"));
}

#[tokio::test]
async fn test_slave_serves_metrics_while_master_is_down() {
    // nothing listens on the discard port
    let config = create_slave_config("127.0.0.1:9".parse().unwrap());
    let slave = start_slave_with(&config, static_providers("local_up 1"))
        .await
        .unwrap();

    assert!(slave.heartbeat.beat_now().await.is_err());

    let response = scrape(slave.metrics_addr, Some(TOKEN)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "local_up 1");

    assert_eq!(
        scrape(slave.metrics_addr, None).await.status(),
        StatusCode::UNAUTHORIZED
    );

    // the loop is still alive after the failed beat
    assert!(slave.heartbeat.beat_now().await.is_err());

    slave.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_registry_survives_master_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nodes.json");
    let config = create_test_config(Mode::Master);

    let master = start_master_with(&config, Box::new(FileNodeStore::new(&path).unwrap()))
        .await
        .unwrap();

    let client = reqwest::Client::new();
    for port in [3035, 3036] {
        let response = client
            .post(format!("http://{}/heartbeat", master.heartbeat_addr))
            .bearer_auth(TOKEN)
            .json(&serde_json::json!({ "port": port }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    master.shutdown().await.unwrap();

    let restarted = start_master_with(&config, Box::new(FileNodeStore::new(&path).unwrap()))
        .await
        .unwrap();

    assert_eq!(
        restarted.registry.list().await.unwrap(),
        vec![
            NodeAddress::new("127.0.0.1:3035"),
            NodeAddress::new("127.0.0.1:3036")
        ]
    );

    restarted.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_master_with_broken_node_file_starts_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nodes.json");
    std::fs::write(&path, "[\"10.0.0.1:3035\",").unwrap();

    let master = start_master_with(
        &create_test_config(Mode::Master),
        Box::new(FileNodeStore::new(&path).unwrap()),
    )
    .await
    .unwrap();

    assert!(master.registry.list().await.unwrap().is_empty());

    let response = scrape(master.metrics_addr, Some(TOKEN)).await;
    assert_eq!(response.status(), StatusCode::OK);

    master.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_master_without_token_rejects_heartbeats() {
    let mut config = create_test_config(Mode::Master);
    config.token = None;

    let dir = tempdir().unwrap();
    let master = start_master_with(
        &config,
        Box::new(FileNodeStore::new(dir.path().join("nodes.json")).unwrap()),
    )
    .await
    .unwrap();

    let response = reqwest::Client::new()
        .post(format!("http://{}/heartbeat", master.heartbeat_addr))
        .bearer_auth("anything")
        .json(&serde_json::json!({ "port": 3035 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(master.registry.list().await.unwrap().is_empty());

    master.shutdown().await.unwrap();
}
