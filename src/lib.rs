pub mod actors;
pub mod config;
pub mod node;
pub mod providers;
pub mod roles;
pub mod scrape;
pub mod server;
pub mod storage;
pub mod util;

pub use config::{Config, Mode};
pub use node::NodeAddress;
