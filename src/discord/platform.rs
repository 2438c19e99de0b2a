//! [`Platform`] over the Discord REST API

use crate::error::{RankedError, Result};
use crate::platform::{
    Button, ButtonStyle, Panel, Platform, Post, PostedMessage, RoomRequest, UserProfile,
};
use crate::types::{MessageId, RoomId};
use async_trait::async_trait;
use serenity::all::{
    ButtonStyle as DiscordButtonStyle, ChannelId, ChannelType, CreateActionRow, CreateButton,
    CreateChannel, CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage, GuildId, Http,
    PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, Timestamp, UserId,
};
use serenity::http::HttpError;
use std::num::NonZeroU64;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Parse a snowflake id kept as a string
pub fn snowflake<T: From<NonZeroU64>>(id: &str) -> Result<T> {
    NonZeroU64::from_str(id)
        .map(T::from)
        .map_err(|_| RankedError::InvalidInput {
            reason: format!("'{}' is not a valid Discord id", id),
        })
}

pub fn to_embed(panel: &Panel) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title(&panel.title).color(panel.color);
    if let Some(description) = &panel.description {
        embed = embed.description(description);
    }
    for field in &panel.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &panel.footer {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(url) = &panel.thumbnail_url {
        embed = embed.thumbnail(url);
    }
    if panel.timestamp {
        embed = embed.timestamp(Timestamp::now());
    }
    embed
}

/// Buttons laid out in a single row
pub fn to_components(buttons: &[Button]) -> Vec<CreateActionRow> {
    if buttons.is_empty() {
        return Vec::new();
    }
    let row = buttons
        .iter()
        .map(|button| {
            CreateButton::new(&button.custom_id)
                .label(&button.label)
                .style(match button.style {
                    ButtonStyle::Primary => DiscordButtonStyle::Primary,
                    ButtonStyle::Secondary => DiscordButtonStyle::Secondary,
                    ButtonStyle::Success => DiscordButtonStyle::Success,
                    ButtonStyle::Danger => DiscordButtonStyle::Danger,
                })
        })
        .collect();
    vec![CreateActionRow::Buttons(row)]
}

fn create_message(post: &Post) -> CreateMessage {
    let mut message = CreateMessage::new().components(to_components(&post.buttons));
    if let Some(content) = &post.content {
        message = message.content(content);
    }
    if let Some(panel) = &post.panel {
        message = message.embed(to_embed(panel));
    }
    message
}

fn edit_message(post: &Post) -> EditMessage {
    let mut message = EditMessage::new()
        .content(post.content.clone().unwrap_or_default())
        .components(to_components(&post.buttons));
    if let Some(panel) = &post.panel {
        message = message.embed(to_embed(panel));
    }
    message
}

fn is_not_found(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

/// Discord implementation of the platform port
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    async fn member_roles(&self, guild_id: GuildId, user_id: UserId) -> Result<Vec<RoleId>> {
        let member = guild_id
            .member(self.http.as_ref(), user_id)
            .await
            .map_err(|e| RankedError::external("fetch_member", e))?;
        Ok(member.roles)
    }
}

#[async_trait]
impl Platform for SerenityPlatform {
    async fn is_administrator(&self, guild_id: &str, user_id: &str) -> Result<bool> {
        let guild_id: GuildId = snowflake(guild_id)?;
        let user_id: UserId = snowflake(user_id)?;

        let guild = guild_id
            .to_partial_guild(self.http.as_ref())
            .await
            .map_err(|e| RankedError::external("fetch_guild", e))?;
        if guild.owner_id == user_id {
            return Ok(true);
        }

        let everyone = RoleId::new(guild_id.get());
        let roles = self.member_roles(guild_id, user_id).await?;
        Ok(guild.roles.iter().any(|(role_id, role)| {
            (*role_id == everyone || roles.contains(role_id))
                && role.permissions.contains(Permissions::ADMINISTRATOR)
        }))
    }

    async fn has_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<bool> {
        let role_id: RoleId = snowflake(role_id)?;
        let roles = self
            .member_roles(snowflake(guild_id)?, snowflake(user_id)?)
            .await?;
        Ok(roles.contains(&role_id))
    }

    async fn create_room(&self, request: RoomRequest) -> Result<RoomId> {
        let guild_id: GuildId = snowflake(&request.guild_id)?;
        let creator_id: UserId = snowflake(&request.creator_id)?;
        let bot = self
            .http
            .get_current_user()
            .await
            .map_err(|e| RankedError::external("create_room", e))?;

        let member_access =
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY;
        let manager_access = member_access | Permissions::MANAGE_CHANNELS;

        let mut overwrites = vec![
            PermissionOverwrite {
                allow: Permissions::empty(),
                deny: Permissions::VIEW_CHANNEL,
                kind: PermissionOverwriteType::Role(RoleId::new(guild_id.get())),
            },
            PermissionOverwrite {
                allow: member_access,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Member(creator_id),
            },
            PermissionOverwrite {
                allow: manager_access,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Member(bot.id),
            },
        ];
        for role_id in &request.host_role_ids {
            overwrites.push(PermissionOverwrite {
                allow: manager_access,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(snowflake(role_id)?),
            });
        }

        let mut builder = CreateChannel::new(&request.name)
            .kind(ChannelType::Text)
            .permissions(overwrites);
        if let Some(category_id) = &request.category_id {
            builder = builder.category(snowflake::<ChannelId>(category_id)?);
        }

        let channel = guild_id
            .create_channel(self.http.as_ref(), builder)
            .await
            .map_err(|e| RankedError::external("create_room", e))?;
        debug!("Created channel '{}' ({})", channel.name, channel.id);
        Ok(channel.id.to_string())
    }

    async fn grant_access(&self, room_id: &str, user_id: &str) -> Result<()> {
        let channel_id: ChannelId = snowflake(room_id)?;
        channel_id
            .create_permission(
                self.http.as_ref(),
                PermissionOverwrite {
                    allow: Permissions::VIEW_CHANNEL
                        | Permissions::SEND_MESSAGES
                        | Permissions::READ_MESSAGE_HISTORY,
                    deny: Permissions::empty(),
                    kind: PermissionOverwriteType::Member(snowflake(user_id)?),
                },
            )
            .await
            .map_err(|e| RankedError::external("grant_access", e))
    }

    async fn delete_room(&self, room_id: &str) -> Result<()> {
        let channel_id: ChannelId = snowflake(room_id)?;
        channel_id
            .delete(self.http.as_ref())
            .await
            .map(|_| ())
            .map_err(|e| RankedError::external("delete_room", e))
    }

    async fn send_message(&self, channel_id: &str, post: &Post) -> Result<MessageId> {
        let channel_id: ChannelId = snowflake(channel_id)?;
        let message = channel_id
            .send_message(self.http.as_ref(), create_message(post))
            .await
            .map_err(|e| RankedError::external("send_message", e))?;
        Ok(message.id.to_string())
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        post: &Post,
    ) -> Result<bool> {
        let channel_id: ChannelId = snowflake(channel_id)?;
        let message_id: serenity::all::MessageId = snowflake(message_id)?;
        match channel_id
            .edit_message(self.http.as_ref(), message_id, edit_message(post))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(RankedError::external("edit_message", e)),
        }
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<PostedMessage>> {
        let channel: ChannelId = snowflake(channel_id)?;
        let id: serenity::all::MessageId = snowflake(message_id)?;
        match channel.message(self.http.as_ref(), id).await {
            Ok(message) => Ok(Some(PostedMessage {
                id: message.id.to_string(),
                channel_id: message.channel_id.to_string(),
            })),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(RankedError::external("fetch_message", e)),
        }
    }

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile> {
        let user_id: UserId = snowflake(user_id)?;
        let user = user_id
            .to_user(self.http.as_ref())
            .await
            .map_err(|e| RankedError::external("user_profile", e))?;
        Ok(UserProfile {
            id: user.id.to_string(),
            display_name: user.name.clone(),
            avatar_url: user.avatar_url(),
        })
    }
}
