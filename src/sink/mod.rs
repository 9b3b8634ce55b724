//! Notification sink abstraction and message models
//!
//! The monitor pushes embeds through the [`NotificationSink`] trait. The one
//! production implementation targets Discord; tests substitute an in-memory
//! recorder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod discord;

pub use discord::DiscordSink;

/// Opaque channel identifier assigned by the sink.
pub type ChannelHandle = String;

/// Accent color for all embeds (Discord "blue").
pub const EMBED_COLOR_BLUE: u32 = 0x3498db;

/// A guild (server) the sink's bot account belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildInfo {
    pub id: String,
    pub name: String,
}

/// One name/value pair inside an embed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Rich message payload in Discord's embed shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

fn coin_link(token: &str) -> String {
    format!("[{0}](https://pump.fun/coin/{0})", token)
}

/// Embed posted once when a token's channel is created.
pub fn welcome_embed(token: &str) -> Embed {
    Embed {
        title: "🔍 New Token Monitor".to_string(),
        description: Some("Starting token graduation monitoring".to_string()),
        color: EMBED_COLOR_BLUE,
        fields: vec![
            EmbedField {
                name: "Token Address".to_string(),
                value: coin_link(token),
                inline: false,
            },
            EmbedField {
                name: "Status".to_string(),
                value: "Monitoring for graduation progress...".to_string(),
                inline: false,
            },
        ],
        footer: Some(EmbedFooter { text: "Monitor started".to_string() }),
        timestamp: None,
    }
}

/// Embed posted every poll cycle with current graduation progress.
pub fn status_embed(status: &crate::blockchain::TokenStatus) -> Embed {
    Embed {
        title: "📊 Token Status Update".to_string(),
        description: None,
        color: EMBED_COLOR_BLUE,
        fields: vec![
            EmbedField {
                name: "Token".to_string(),
                value: coin_link(&status.mint),
                inline: false,
            },
            EmbedField {
                name: "Graduation Progress".to_string(),
                value: format!("{:.2}%", status.percentage),
                inline: false,
            },
        ],
        footer: None,
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
    }
}

/// Destination for monitor notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short sink name used in logs.
    fn name(&self) -> &'static str;

    /// Establish the session. Must succeed before any other call.
    async fn connect(&self) -> crate::Result<()>;

    /// Guilds visible to the connected session.
    async fn guilds(&self) -> crate::Result<Vec<GuildInfo>>;

    /// Resolve the category that holds token channels, creating it if the
    /// configured id is absent or stale.
    async fn get_or_create_category(
        &self,
        configured_id: Option<&str>,
        name: &str,
    ) -> crate::Result<ChannelHandle>;

    /// Look up an existing channel by name under the category.
    async fn find_channel(
        &self,
        category: &ChannelHandle,
        name: &str,
    ) -> crate::Result<Option<ChannelHandle>>;

    /// Create a channel under the category.
    async fn create_channel(
        &self,
        category: &ChannelHandle,
        name: &str,
        topic: &str,
    ) -> crate::Result<ChannelHandle>;

    /// Post an embed to a channel.
    async fn send_message(&self, channel: &ChannelHandle, embed: &Embed) -> crate::Result<()>;
}
