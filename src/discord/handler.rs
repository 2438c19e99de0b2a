//! Gateway event handler
//!
//! Slash commands and button presses are turned into [`Invocation`]s. Each
//! interaction is acknowledged with a deferred response before the router
//! runs, then the deferred response is filled in with the reply.

use crate::commands::{Command, CommandRouter, Invocation, Reply};
use crate::discord::platform::{to_components, to_embed};
use crate::discord::schema::{commands, parse_command, CommandOptions};
use crate::matches::MemberAccess;
use async_trait::async_trait;
use serenity::all::{
    Command as ApplicationCommand, CommandInteraction, ComponentInteraction, Context,
    CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, EditInteractionResponse, EventHandler, Http, Interaction,
    Member, Permissions, Ready,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const GUILD_ONLY: &str = "This bot can only be used inside a server.";

/// Build the interaction response for a reply
pub fn to_response(reply: &Reply) -> CreateInteractionResponse {
    let mut message = CreateInteractionResponseMessage::new()
        .ephemeral(reply.ephemeral)
        .components(to_components(&reply.buttons));
    if let Some(content) = &reply.content {
        message = message.content(content);
    }
    if let Some(panel) = &reply.panel {
        message = message.embed(to_embed(panel));
    }
    CreateInteractionResponse::Message(message)
}

/// Acknowledge an interaction, showing a loading state until the reply is ready
pub fn to_deferral(ephemeral: bool) -> CreateInteractionResponse {
    CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new().ephemeral(ephemeral))
}

/// Fill in a deferred response
pub fn to_edit(reply: &Reply) -> EditInteractionResponse {
    let mut message = EditInteractionResponse::new().components(to_components(&reply.buttons));
    if let Some(content) = &reply.content {
        message = message.content(content);
    }
    if let Some(panel) = &reply.panel {
        message = message.embed(to_embed(panel));
    }
    message
}

/// Send a reply whose visibility differs from the deferred response
pub fn to_followup(reply: &Reply) -> CreateInteractionResponseFollowup {
    let mut message = CreateInteractionResponseFollowup::new()
        .ephemeral(reply.ephemeral)
        .components(to_components(&reply.buttons));
    if let Some(content) = &reply.content {
        message = message.content(content);
    }
    if let Some(panel) = &reply.panel {
        message = message.embed(to_embed(panel));
    }
    message
}

/// Roles and permissions Discord resolved for the invoking member
pub fn member_access(member: Option<&Member>) -> Option<MemberAccess> {
    let member = member?;
    Some(MemberAccess {
        is_administrator: member
            .permissions
            .is_some_and(|permissions| permissions.contains(Permissions::ADMINISTRATOR)),
        role_ids: member.roles.iter().map(|id| id.to_string()).collect(),
    })
}

/// The interaction kinds the handler answers
enum Pending {
    Command(CommandInteraction),
    Component(ComponentInteraction),
}

impl Pending {
    async fn respond(&self, http: &Http, response: CreateInteractionResponse) -> serenity::Result<()> {
        match self {
            Pending::Command(interaction) => interaction.create_response(http, response).await,
            Pending::Component(interaction) => interaction.create_response(http, response).await,
        }
    }

    async fn edit(&self, http: &Http, reply: &Reply) -> serenity::Result<()> {
        match self {
            Pending::Command(interaction) => {
                interaction.edit_response(http, to_edit(reply)).await?;
            }
            Pending::Component(interaction) => {
                interaction.edit_response(http, to_edit(reply)).await?;
            }
        }
        Ok(())
    }

    async fn replace(&self, http: &Http, reply: &Reply) -> serenity::Result<()> {
        match self {
            Pending::Command(interaction) => {
                interaction.delete_response(http).await?;
                interaction.create_followup(http, to_followup(reply)).await?;
            }
            Pending::Component(interaction) => {
                interaction.delete_response(http).await?;
                interaction.create_followup(http, to_followup(reply)).await?;
            }
        }
        Ok(())
    }
}

pub struct Handler {
    router: Arc<CommandRouter>,
    register_commands: bool,
}

impl Handler {
    pub fn new(router: Arc<CommandRouter>, register_commands: bool) -> Self {
        Self {
            router,
            register_commands,
        }
    }

    /// Turn interaction data into an invocation, or the reply explaining why not
    fn invocation(
        guild_id: Option<String>,
        channel_id: String,
        user_id: String,
        command: Option<Command>,
        source: &str,
    ) -> Result<Invocation, Reply> {
        let Some(guild_id) = guild_id else {
            return Err(Reply::error(GUILD_ONLY));
        };
        let Some(command) = command else {
            warn!("Unrecognized interaction '{}' from '{}'", source, user_id);
            return Err(Reply::error("Unknown command."));
        };

        Ok(Invocation::new(&guild_id, &channel_id, &user_id, command))
    }

    async fn answer(
        &self,
        http: &Http,
        pending: Pending,
        invocation: Result<Invocation, Reply>,
        source: &str,
    ) {
        let invocation = match invocation {
            Ok(invocation) => invocation,
            Err(reply) => {
                if let Err(e) = pending.respond(http, to_response(&reply)).await {
                    warn!("Cannot respond to '{}': {}", source, e);
                }
                return;
            }
        };

        let deferred_ephemeral = invocation.command.replies_ephemerally();
        if let Err(e) = pending.respond(http, to_deferral(deferred_ephemeral)).await {
            warn!("Cannot acknowledge '{}': {}", source, e);
            return;
        }

        let reply = self.router.dispatch(invocation).await;

        let delivered = if reply.ephemeral == deferred_ephemeral {
            pending.edit(http, &reply).await
        } else {
            pending.replace(http, &reply).await
        };
        if let Err(e) = delivered {
            warn!("Cannot deliver reply to '{}': {}", source, e);
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "Connected as {} to {} guild(s)",
            ready.user.name,
            ready.guilds.len()
        );

        if !self.register_commands {
            info!("Skipping slash command registration");
            return;
        }

        match ApplicationCommand::set_global_commands(&ctx.http, commands()).await {
            Ok(registered) => info!("Registered {} slash commands", registered.len()),
            Err(e) => error!("Failed to register slash commands: {}", e),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                let name = command.data.name.clone();
                debug!("Received command '{}' from '{}'", name, command.user.id);

                let options = CommandOptions::from_resolved(&command.data.options());
                let access = member_access(command.member.as_deref());
                let invocation = Self::invocation(
                    command.guild_id.map(|id| id.to_string()),
                    command.channel_id.to_string(),
                    command.user.id.to_string(),
                    parse_command(&name, &options),
                    &name,
                )
                .map(|invocation| invocation.with_access(access));

                self.answer(&ctx.http, Pending::Command(command), invocation, &name)
                    .await;
            }
            Interaction::Component(component) => {
                let custom_id = component.data.custom_id.clone();
                debug!("Received button '{}' from '{}'", custom_id, component.user.id);

                let access = member_access(component.member.as_ref());
                let invocation = Self::invocation(
                    component.guild_id.map(|id| id.to_string()),
                    component.channel_id.to_string(),
                    component.user.id.to_string(),
                    Command::from_button(&custom_id),
                    &custom_id,
                )
                .map(|invocation| invocation.with_access(access));

                self.answer(&ctx.http, Pending::Component(component), invocation, &custom_id)
                    .await;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::render;

    #[test]
    fn test_error_response() {
        let json = serde_json::to_value(to_response(&Reply::error("Only hosts can use this command.")))
            .unwrap();
        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["content"], "Only hosts can use this command.");
    }

    #[test]
    fn test_deferral_keeps_visibility() {
        let json = serde_json::to_value(to_deferral(true)).unwrap();
        assert_eq!(json["type"], 5);
        assert_eq!(json["data"]["flags"], 64);

        let json = serde_json::to_value(to_deferral(false)).unwrap();
        assert_eq!(json["type"], 5);
        assert!(json["data"].get("flags").map_or(true, |flags| flags == 0));
    }

    #[test]
    fn test_edit_fills_deferred_response() {
        let reply = Reply::panel(render::confirmation_panel("Category Set", "done"));
        let json = serde_json::to_value(to_edit(&reply)).unwrap();
        assert_eq!(json["embeds"][0]["title"], "Category Set");

        let json = serde_json::to_value(to_followup(&Reply::error("nope"))).unwrap();
        assert_eq!(json["content"], "nope");
        assert_eq!(json["flags"], 64);
    }

    #[test]
    fn test_invocation_requires_guild_and_command() {
        let missing_guild = Handler::invocation(
            None,
            "c".to_string(),
            "u".to_string(),
            Some(Command::ViewHosts),
            "viewhosts",
        );
        assert_eq!(
            missing_guild.unwrap_err().content.as_deref(),
            Some(GUILD_ONLY)
        );

        let unknown = Handler::invocation(
            Some("g".to_string()),
            "c".to_string(),
            "u".to_string(),
            None,
            "start_3v3",
        );
        assert!(unknown.unwrap_err().ephemeral);
    }

    #[test]
    fn test_setup_response_has_buttons() {
        let (panel, buttons) = render::setup_panel();
        let reply = Reply::panel(panel).with_buttons(buttons);
        let json = serde_json::to_value(to_response(&reply)).unwrap();
        assert_eq!(json["data"]["embeds"][0]["title"], "🎮 Ranked Matches");
        assert_eq!(json["data"]["components"].as_array().map(Vec::len), Some(1));
    }
}
