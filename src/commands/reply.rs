//! Reply payloads returned to the requester

use crate::platform::{Button, Post};
use serde::Serialize;

pub use crate::platform::{Panel, PanelField};

/// Response to one command or button press
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub content: Option<String>,
    pub panel: Option<Panel>,
    pub buttons: Vec<Button>,
    /// Only visible to the requester
    pub ephemeral: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn panel(panel: Panel) -> Self {
        Self {
            panel: Some(panel),
            ..Default::default()
        }
    }

    /// Private explanatory message
    pub fn error(message: impl Into<String>) -> Self {
        Self::text(message).ephemeral()
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    /// The same payload as a channel message
    pub fn to_post(&self) -> Post {
        Post {
            content: self.content.clone(),
            panel: self.panel.clone(),
            buttons: self.buttons.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reply_is_ephemeral() {
        let reply = Reply::error("Only hosts can use this command.");
        assert!(reply.ephemeral);
        assert_eq!(reply.content.as_deref(), Some("Only hosts can use this command."));
        assert!(reply.panel.is_none());
    }

    #[test]
    fn test_to_post_keeps_body() {
        let reply = Reply::panel(Panel::new("Match Closed", 0xED4245)).ephemeral();
        let post = reply.to_post();
        assert_eq!(post.panel.unwrap().title, "Match Closed");
    }
}
