//! HeartbeatActor - Announces this slave to the master
//!
//! Sends `POST {master}/heartbeat` with `{"port": <metrics port>}` and the
//! fleet token, then sleeps for the beat interval. Failures are logged and the
//! loop carries on at the same fixed interval.
//!
//! ## Message Flow
//!
//! ```text
//! POST /heartbeat → log outcome → sleep(interval)
//!     ↑
//!     └─── Commands (BeatNow, Shutdown)
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, instrument, trace, warn};

use super::messages::HeartbeatCommand;
use crate::config::Config;

/// Body of a heartbeat request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub port: u16,
}

/// Everything a slave needs to heartbeat
#[derive(Debug, Clone)]
pub struct HeartbeatSettings {
    /// Base URL of the master, without trailing slash
    pub master_url: String,
    pub token: String,
    /// Port this node's metrics endpoint listens on
    pub port: u16,
    pub interval: Duration,
    pub timeout: Duration,
}

impl HeartbeatSettings {
    /// Extract heartbeat settings, failing if the master URL or token is
    /// missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let master_url = config
            .master_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .context("master_url must be set for a slave to heartbeat")?;

        let token = config
            .token
            .as_deref()
            .filter(|token| !token.is_empty())
            .context("token must be set for a slave to heartbeat")?;

        Ok(Self {
            master_url: master_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            port: config.port,
            interval: config.beat_interval(),
            timeout: config.fetch_timeout(),
        })
    }

    pub fn heartbeat_url(&self) -> String {
        format!("{}/heartbeat", self.master_url)
    }
}

/// Actor that periodically heartbeats to the master
pub struct HeartbeatActor {
    settings: HeartbeatSettings,

    /// HTTP client (reused across beats)
    client: reqwest::Client,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<HeartbeatCommand>,

    /// Number of beats the master acknowledged
    accepted: u64,
}

impl HeartbeatActor {
    pub fn new(
        settings: HeartbeatSettings,
        command_rx: mpsc::Receiver<HeartbeatCommand>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            settings,
            client,
            command_rx,
            accepted: 0,
        })
    }

    /// Run the actor's main loop
    ///
    /// The first beat goes out immediately; each later one waits a full
    /// interval after the previous beat completed. The loop only ends on a
    /// Shutdown command or when every handle has been dropped.
    #[instrument(skip(self), fields(master = %self.settings.master_url))]
    pub async fn run(mut self) {
        info!(
            "heartbeating to {} every {:?}",
            self.settings.master_url, self.settings.interval
        );

        // the next beat is due one interval after the previous one finished
        let next_beat = sleep(Duration::ZERO);
        tokio::pin!(next_beat);

        loop {
            tokio::select! {
                _ = &mut next_beat => {
                    if let Err(e) = self.beat().await {
                        error!("heartbeat failed: {:#}", e);
                    }
                    next_beat.as_mut().reset(Instant::now() + self.settings.interval);
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(HeartbeatCommand::BeatNow { respond_to }) => {
                            debug!("received BeatNow command");
                            let result = self.beat().await;
                            let _ = respond_to.send(result);
                        }

                        Some(HeartbeatCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("heartbeat actor stopped after {} accepted beats", self.accepted);
    }

    /// Send a single heartbeat
    async fn beat(&mut self) -> Result<()> {
        let url = self.settings.heartbeat_url();
        trace!("sending heartbeat to {url}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.token)
            .json(&HeartbeatRequest {
                port: self.settings.port,
            })
            .send()
            .await
            .context("failed to send heartbeat")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("master rejected heartbeat: {status}");
        }

        self.accepted += 1;
        trace!("heartbeat accepted");
        Ok(())
    }
}

/// Handle for controlling a HeartbeatActor
#[derive(Clone)]
pub struct HeartbeatHandle {
    sender: mpsc::Sender<HeartbeatCommand>,
}

impl HeartbeatHandle {
    /// Validate the configuration and spawn the heartbeat loop.
    ///
    /// Fails if the master URL or token is missing; a slave cannot run
    /// unregistered.
    pub fn spawn(config: &Config) -> Result<Self> {
        let settings = HeartbeatSettings::from_config(config)?;
        Self::spawn_with(settings)
    }

    pub fn spawn_with(settings: HeartbeatSettings) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let actor = HeartbeatActor::new(settings, cmd_rx)?;

        tokio::spawn(actor.run());

        Ok(Self { sender: cmd_tx })
    }

    /// Send a heartbeat now and report whether the master accepted it
    pub async fn beat_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HeartbeatCommand::BeatNow { respond_to: tx })
            .await
            .context("failed to send BeatNow command")?;

        rx.await.context("failed to receive response")??;
        Ok(())
    }

    /// Gracefully stop heartbeating
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(HeartbeatCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
