pub mod heartbeat;
pub mod metrics;
pub mod nodes;
