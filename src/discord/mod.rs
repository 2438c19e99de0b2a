//! Discord adapter
//!
//! The serenity gateway handler, the slash command schema and the REST
//! implementation of [`crate::platform::Platform`].

pub mod handler;
pub mod platform;
pub mod schema;

pub use handler::Handler;
pub use platform::SerenityPlatform;
pub use schema::{commands, parse_command, CommandOptions, OptionValue};
