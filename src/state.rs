//! Shared application state.
//!
//! Every generation request is independent and all pipeline entities are
//! request-scoped, so the state carries only configuration, the outbound
//! client, and a start instant for uptime reporting. No cross-request
//! mutable data lives here.

use crate::client::GenerationClient;
use crate::config::ServerConfig;
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;

pub struct AppState {
    config: Arc<ServerConfig>,
    client: GenerationClient,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>) -> Result<Self> {
        let client = GenerationClient::new(config.clone())?;
        Ok(Self {
            config,
            client,
            started_at: Instant::now(),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
