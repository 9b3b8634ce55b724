//! Per-token channel registry
//!
//! Maps watch-list tokens to sink channels. Names are normalized so lookups
//! are stable across restarts, and existing channels are reused instead of
//! recreated.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::sink::{welcome_embed, ChannelHandle, NotificationSink};
use crate::utils::error::Result;

const CHANNEL_NAME_PREFIX: &str = "token-";

/// Channel name for a token mint. Lowercased because Discord lowercases
/// channel names on creation, which would otherwise break restart lookup.
pub fn channel_name(token: &str) -> String {
    format!("{}{}", CHANNEL_NAME_PREFIX, token.to_lowercase())
}

/// Append-only binding of tokens to their notification channels.
pub struct ChannelRegistry {
    sink: Arc<dyn NotificationSink>,
    category: ChannelHandle,
    bindings: Mutex<HashMap<String, ChannelHandle>>,
}

impl ChannelRegistry {
    pub fn new(sink: Arc<dyn NotificationSink>, category: ChannelHandle) -> Self {
        Self { sink, category, bindings: Mutex::new(HashMap::new()) }
    }

    pub fn category(&self) -> &ChannelHandle {
        &self.category
    }

    /// Channel for a token, creating it (with a welcome embed) on first use.
    /// Tokens removed from the watch-list keep their channels and history.
    pub async fn ensure_channel(&self, token: &str) -> Result<ChannelHandle> {
        let name = channel_name(token);

        // The lock stays held across the sink calls so two callers cannot
        // race duplicate creation of the same channel.
        let mut bindings = self.bindings.lock().await;
        if let Some(handle) = bindings.get(&name) {
            return Ok(handle.clone());
        }

        let handle = match self.sink.find_channel(&self.category, &name).await? {
            Some(handle) => {
                log::info!("Reusing existing channel #{} for {}", name, token);
                handle
            }
            None => {
                let topic = format!("Monitoring {}", token);
                let handle = self.sink.create_channel(&self.category, &name, &topic).await?;
                self.sink.send_message(&handle, &welcome_embed(token)).await?;
                log::info!("Opened channel #{} for {}", name, token);
                handle
            }
        };

        bindings.insert(name, handle.clone());
        Ok(handle)
    }
}
