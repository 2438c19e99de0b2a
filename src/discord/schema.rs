//! Slash command definitions and option parsing

use crate::commands::Command;
use crate::types::{AutoStreakKind, CounterField, MatchType};
use serenity::all::{
    ChannelType, CommandOptionType, CreateCommand, CreateCommandOption, Permissions,
    ResolvedOption, ResolvedValue,
};
use std::collections::HashMap;

/// One option value, detached from the interaction payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    User(String),
    Role(String),
    Channel { id: String, is_category: bool },
    Integer(i64),
    String(String),
}

/// Options of one invocation keyed by name
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    values: HashMap<String, OptionValue>,
}

impl CommandOptions {
    pub fn from_resolved(options: &[ResolvedOption<'_>]) -> Self {
        let values = options
            .iter()
            .filter_map(|option| {
                let value = match &option.value {
                    ResolvedValue::User(user, _) => OptionValue::User(user.id.to_string()),
                    ResolvedValue::Role(role) => OptionValue::Role(role.id.to_string()),
                    ResolvedValue::Channel(channel) => OptionValue::Channel {
                        id: channel.id.to_string(),
                        is_category: channel.kind == ChannelType::Category,
                    },
                    ResolvedValue::Integer(value) => OptionValue::Integer(*value),
                    ResolvedValue::String(value) => OptionValue::String(value.to_string()),
                    _ => return None,
                };
                Some((option.name.to_string(), value))
            })
            .collect();
        Self { values }
    }

    pub fn with(mut self, name: &str, value: OptionValue) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    fn user(&self, name: &str) -> Option<String> {
        match self.values.get(name) {
            Some(OptionValue::User(id)) => Some(id.clone()),
            _ => None,
        }
    }

    fn role(&self, name: &str) -> Option<String> {
        match self.values.get(name) {
            Some(OptionValue::Role(id)) => Some(id.clone()),
            _ => None,
        }
    }

    fn channel(&self, name: &str) -> Option<(String, bool)> {
        match self.values.get(name) {
            Some(OptionValue::Channel { id, is_category }) => Some((id.clone(), *is_category)),
            _ => None,
        }
    }

    fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(OptionValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    fn string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptionValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    fn mode(&self) -> Option<MatchType> {
        self.string("mode").and_then(|mode| mode.parse().ok())
    }
}

/// Turn a slash command into a typed [`Command`]; `None` for unknown names
/// or missing required options
pub fn parse_command(name: &str, options: &CommandOptions) -> Option<Command> {
    let command = match name {
        "setup" => Command::Setup,
        "sethosts" => Command::SetHosts {
            role_ids: ["role1", "role2", "role3"]
                .iter()
                .filter_map(|option| options.role(option))
                .collect(),
        },
        "setcategory" => {
            let (channel_id, is_category) = options.channel("category")?;
            Command::SetCategory {
                channel_id,
                is_category,
            }
        }
        "setlogchannel" => Command::SetLogChannel {
            channel_id: options.channel("channel")?.0,
        },
        "setleaderboardchannel" => Command::SetLeaderboardChannel {
            channel_id: options.channel("channel")?.0,
        },
        "setdodgechannel" => Command::SetDodgeChannel {
            channel_id: options.channel("channel")?.0,
        },
        "viewhosts" => Command::ViewHosts,
        "stats" => Command::Stats {
            player_id: options.user("player"),
        },
        "eloleaderboard" => Command::EloLeaderboard {
            mode: options.mode(),
        },
        "add" => Command::Add {
            user_id: options.user("user")?,
        },
        "close" => Command::Close,
        "win" => Command::Win {
            user_id: options.user("winner")?,
        },
        "lose" => Command::Lose {
            user_id: options.user("loser")?,
        },
        "setstreak" => Command::SetStreak {
            user_id: options.user("player")?,
            kind: match options.string("type")? {
                "win" => AutoStreakKind::Win,
                "lose" => AutoStreakKind::Lose,
                _ => return None,
            },
            count: options.integer("count")?,
        },
        "clearstreak" => Command::ClearStreak {
            user_id: options.user("player")?,
        },
        "addelo" => Command::AddElo {
            user_id: options.user("user")?,
            amount: options.integer("amount")?,
            mode: options.mode(),
        },
        "removeelo" => Command::RemoveElo {
            user_id: options.user("user")?,
            amount: options.integer("amount")?,
            mode: options.mode(),
        },
        "adjustrecord" => Command::AdjustRecord {
            user_id: options.user("player")?,
            field: match options.string("field")? {
                "wins" => CounterField::Wins,
                "losses" => CounterField::Losses,
                _ => return None,
            },
            amount: options.integer("amount")?,
        },
        "dodge" => Command::Dodge {
            user_id: options.user("player")?,
        },
        "updateleaderboard" => Command::UpdateLeaderboard {
            mode: options.mode(),
        },
        _ => return None,
    };
    Some(command)
}

fn mode_option(description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "mode", description)
        .add_string_choice("1v1", "1v1")
        .add_string_choice("2v2", "2v2")
}

fn channel_option(description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Channel, "channel", description).required(true)
}

fn user_option(name: &str, description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::User, name, description).required(true)
}

fn amount_option(description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Integer, "amount", description)
        .required(true)
        .min_int_value(1)
        .max_int_value(1000)
}

fn admin(command: CreateCommand) -> CreateCommand {
    command.default_member_permissions(Permissions::ADMINISTRATOR)
}

/// Every slash command the bot registers
pub fn commands() -> Vec<CreateCommand> {
    vec![
        admin(CreateCommand::new("setup").description("Set up the ranked panel with match buttons")),
        admin(
            CreateCommand::new("sethosts")
                .description("Set the host roles that can manage matches")
                .add_option(
                    CreateCommandOption::new(CommandOptionType::Role, "role1", "First host role")
                        .required(true),
                )
                .add_option(CreateCommandOption::new(
                    CommandOptionType::Role,
                    "role2",
                    "Second host role",
                ))
                .add_option(CreateCommandOption::new(
                    CommandOptionType::Role,
                    "role3",
                    "Third host role",
                )),
        ),
        admin(
            CreateCommand::new("setcategory")
                .description("Set the category where match channels will be created")
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::Channel,
                        "category",
                        "The category for match channels",
                    )
                    .required(true),
                ),
        ),
        admin(
            CreateCommand::new("setlogchannel")
                .description("Set the channel where match results are logged")
                .add_option(channel_option("The channel for match logs")),
        ),
        admin(
            CreateCommand::new("setleaderboardchannel")
                .description("Set the channel where the ELO leaderboards are kept up to date")
                .add_option(channel_option("The channel for leaderboard panels")),
        ),
        admin(
            CreateCommand::new("setdodgechannel")
                .description("Set the channel where dodge alerts are posted")
                .add_option(channel_option("The channel for dodge alerts")),
        ),
        CreateCommand::new("close").description("Close the current match (hosts only)"),
        CreateCommand::new("add")
            .description("Add a user to the current match")
            .add_option(user_option("user", "The user to add")),
        CreateCommand::new("win")
            .description("Record a win for a player (hosts only)")
            .add_option(user_option("winner", "The player who won")),
        CreateCommand::new("lose")
            .description("Record a loss for a player (hosts only)")
            .add_option(user_option("loser", "The player who lost")),
        CreateCommand::new("setstreak")
            .description("Set an auto win or lose streak for a player (hosts only)")
            .add_option(user_option("player", "The player"))
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "type", "Streak type")
                    .required(true)
                    .add_string_choice("Auto Win", "win")
                    .add_string_choice("Auto Lose", "lose"),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "count",
                    "Number of games (0 to clear)",
                )
                .required(true)
                .min_int_value(0)
                .max_int_value(100),
            ),
        CreateCommand::new("clearstreak")
            .description("Clear all streaks for a player (hosts only)")
            .add_option(user_option("player", "The player")),
        CreateCommand::new("stats")
            .description("View player statistics")
            .add_option(CreateCommandOption::new(
                CommandOptionType::User,
                "player",
                "The player to view (defaults to you)",
            )),
        CreateCommand::new("viewhosts").description("View the current host roles"),
        CreateCommand::new("addelo")
            .description("Add ELO to a player (hosts only)")
            .add_option(amount_option("Amount of ELO to add"))
            .add_option(user_option("user", "The player"))
            .add_option(mode_option("ELO track (defaults to 1v1)")),
        CreateCommand::new("removeelo")
            .description("Remove ELO from a player (hosts only)")
            .add_option(amount_option("Amount of ELO to remove"))
            .add_option(user_option("user", "The player"))
            .add_option(mode_option("ELO track (defaults to 1v1)")),
        CreateCommand::new("adjustrecord")
            .description("Correct a player's wins or losses (hosts only)")
            .add_option(user_option("player", "The player"))
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "field", "Counter to adjust")
                    .required(true)
                    .add_string_choice("Wins", "wins")
                    .add_string_choice("Losses", "losses"),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "amount",
                    "Signed amount to add",
                )
                .required(true),
            ),
        CreateCommand::new("dodge")
            .description("Record a dodge against a player (hosts only)")
            .add_option(user_option("player", "The player who dodged")),
        CreateCommand::new("eloleaderboard")
            .description("View the top ELO leaderboard")
            .add_option(mode_option("Leaderboard to show (defaults to 1v1)")),
        CreateCommand::new("updateleaderboard")
            .description("Refresh the leaderboard panels (hosts only)")
            .add_option(mode_option("Only refresh this leaderboard")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_registered_command_parses() {
        let options = CommandOptions::default()
            .with("role1", OptionValue::Role("r".into()))
            .with(
                "category",
                OptionValue::Channel {
                    id: "c".into(),
                    is_category: true,
                },
            )
            .with(
                "channel",
                OptionValue::Channel {
                    id: "c".into(),
                    is_category: false,
                },
            )
            .with("user", OptionValue::User("u".into()))
            .with("winner", OptionValue::User("u".into()))
            .with("loser", OptionValue::User("u".into()))
            .with("player", OptionValue::User("u".into()))
            .with("type", OptionValue::String("win".into()))
            .with("field", OptionValue::String("losses".into()))
            .with("count", OptionValue::Integer(3))
            .with("amount", OptionValue::Integer(25));

        for command in commands() {
            let json = serde_json::to_value(&command).unwrap();
            let name = json["name"].as_str().unwrap().to_string();
            assert!(
                parse_command(&name, &options).is_some(),
                "{} did not parse",
                name
            );
        }
    }

    #[test]
    fn test_sethosts_collects_optional_roles() {
        let options = CommandOptions::default()
            .with("role1", OptionValue::Role("a".into()))
            .with("role3", OptionValue::Role("c".into()));
        assert_eq!(
            parse_command("sethosts", &options),
            Some(Command::SetHosts {
                role_ids: vec!["a".to_string(), "c".to_string()]
            })
        );
    }

    #[test]
    fn test_mode_and_missing_options() {
        let options = CommandOptions::default()
            .with("user", OptionValue::User("u".into()))
            .with("amount", OptionValue::Integer(50))
            .with("mode", OptionValue::String("2v2".into()));
        assert_eq!(
            parse_command("removeelo", &options),
            Some(Command::RemoveElo {
                user_id: "u".to_string(),
                amount: 50,
                mode: Some(MatchType::TwoVsTwo),
            })
        );

        assert_eq!(parse_command("win", &CommandOptions::default()), None);
        assert_eq!(parse_command("unknown", &options), None);
    }

    #[test]
    fn test_admin_commands_hidden_by_default() {
        let setup = serde_json::to_value(&commands()[0]).unwrap();
        assert_eq!(setup["name"], "setup");
        assert!(!setup["default_member_permissions"].is_null());

        let stats = commands()
            .iter()
            .map(|command| serde_json::to_value(command).unwrap())
            .find(|json| json["name"] == "stats")
            .unwrap();
        assert!(stats["default_member_permissions"].is_null());
    }
}
