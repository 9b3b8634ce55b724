//! Discord REST sink
//!
//! Talks to the Discord HTTP API (v10) with a bot token. No gateway
//! connection is held; channel management and message posting are plain
//! request/response calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::DiscordConfig;
use crate::sink::{ChannelHandle, Embed, GuildInfo, NotificationSink};
use crate::utils::error::{Error, Result};

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

const CHANNEL_TYPE_TEXT: u8 = 0;
const CHANNEL_TYPE_CATEGORY: u8 = 4;

#[derive(Debug, Deserialize)]
struct BotUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: u8,
    parent_id: Option<String>,
    guild_id: Option<String>,
}

struct Session {
    guilds: Vec<GuildInfo>,
}

/// Discord implementation of [`NotificationSink`].
pub struct DiscordSink {
    client: Client,
    token: String,
    session: RwLock<Option<Session>>,
}

impl DiscordSink {
    pub fn new(config: &DiscordConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            token: config.bot_token.clone(),
            session: RwLock::new(None),
        })
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn check(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        Err(Error::SinkConnectionError(format!(
            "{} failed with HTTP {}: {}",
            context, status, snippet
        )))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", DISCORD_API_BASE, path))
            .header("Authorization", self.auth())
            .send()
            .await?;
        let response = Self::check(response, context).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
        context: &str,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", DISCORD_API_BASE, path))
            .header("Authorization", self.auth())
            .json(body)
            .send()
            .await?;
        Self::check(response, context).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
        context: &str,
    ) -> Result<T> {
        Ok(self.post(path, body, context).await?.json::<T>().await?)
    }

    /// Fetch a channel by id, mapping 404 to `None`.
    async fn try_get_channel(&self, id: &str) -> Result<Option<ChannelInfo>> {
        let response = self
            .client
            .get(format!("{}/channels/{}", DISCORD_API_BASE, id))
            .header("Authorization", self.auth())
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response, "fetch channel").await?;
        Ok(Some(response.json::<ChannelInfo>().await?))
    }

    /// Guild owning the given category.
    async fn guild_of(&self, category: &ChannelHandle) -> Result<String> {
        self.try_get_channel(category)
            .await?
            .and_then(|info| info.guild_id)
            .ok_or_else(|| {
                Error::SinkConnectionError(format!(
                    "cannot resolve guild for category {}",
                    category
                ))
            })
    }
}

#[async_trait]
impl NotificationSink for DiscordSink {
    fn name(&self) -> &'static str {
        "Discord"
    }

    async fn connect(&self) -> Result<()> {
        let user: BotUser = self.get_json("/users/@me", "bot identity lookup").await?;
        let guilds: Vec<GuildInfo> = self.get_json("/users/@me/guilds", "guild list").await?;

        if guilds.is_empty() {
            return Err(Error::SinkConnectionError(format!(
                "bot {} is not a member of any guild",
                user.username
            )));
        }

        log::info!("Connected to Discord as {} ({} guild(s))", user.username, guilds.len());
        *self.session.write().await = Some(Session { guilds });
        Ok(())
    }

    async fn guilds(&self) -> Result<Vec<GuildInfo>> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.guilds.clone())
            .ok_or_else(|| Error::SinkConnectionError("Discord session not connected".to_string()))
    }

    async fn get_or_create_category(
        &self,
        configured_id: Option<&str>,
        name: &str,
    ) -> Result<ChannelHandle> {
        if let Some(id) = configured_id {
            match self.try_get_channel(id).await? {
                Some(info) if info.kind == CHANNEL_TYPE_CATEGORY => return Ok(info.id),
                Some(_) => {
                    log::warn!("Configured channel {} is not a category, creating one", id)
                }
                None => log::warn!("Configured category {} not found, creating one", id),
            }
        }

        let guilds = self.guilds().await?;
        let guild = guilds.first().ok_or_else(|| {
            Error::SinkConnectionError("no guild available for category creation".to_string())
        })?;

        let body = serde_json::json!({ "name": name, "type": CHANNEL_TYPE_CATEGORY });
        let created: ChannelInfo = self
            .post_json(&format!("/guilds/{}/channels", guild.id), &body, "create category")
            .await?;
        log::info!("Created category '{}' in guild '{}'", name, guild.name);
        Ok(created.id)
    }

    async fn find_channel(
        &self,
        category: &ChannelHandle,
        name: &str,
    ) -> Result<Option<ChannelHandle>> {
        let guild_id = self.guild_of(category).await?;
        let channels: Vec<ChannelInfo> = self
            .get_json(&format!("/guilds/{}/channels", guild_id), "guild channel list")
            .await?;

        Ok(channels
            .into_iter()
            .find(|channel| {
                channel.kind == CHANNEL_TYPE_TEXT
                    && channel.parent_id.as_deref() == Some(category.as_str())
                    && channel.name == name
            })
            .map(|channel| channel.id))
    }

    async fn create_channel(
        &self,
        category: &ChannelHandle,
        name: &str,
        topic: &str,
    ) -> Result<ChannelHandle> {
        let guild_id = self.guild_of(category).await?;
        let body = serde_json::json!({
            "name": name,
            "type": CHANNEL_TYPE_TEXT,
            "parent_id": category,
            "topic": topic,
        });
        let created: ChannelInfo = self
            .post_json(&format!("/guilds/{}/channels", guild_id), &body, "create channel")
            .await?;
        log::info!("Created channel '#{}' under category {}", name, category);
        Ok(created.id)
    }

    async fn send_message(&self, channel: &ChannelHandle, embed: &Embed) -> Result<()> {
        let body = serde_json::json!({ "embeds": [embed] });
        self.post(&format!("/channels/{}/messages", channel), &body, "message post")
            .await?;
        Ok(())
    }
}
