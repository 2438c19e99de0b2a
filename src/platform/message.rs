//! Platform-neutral message payloads

use serde::Serialize;

/// One name/value row of a panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Rich message body (rendered as an embed on Discord)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<PanelField>,
    pub footer: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Stamp the panel with the time it was rendered
    pub timestamp: bool,
}

impl Panel {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            color,
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(PanelField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail_url = url;
        self
    }

    pub fn timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }

    /// Field value by name (for testing and logging)
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

/// Clickable component attached below a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
}

impl Button {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            style,
        }
    }
}

/// A message to post into a channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Post {
    pub content: Option<String>,
    pub panel: Option<Panel>,
    pub buttons: Vec<Button>,
}

impl Post {
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

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_builder() {
        let panel = Panel::new("Win Recorded", 0x57F287)
            .description("<@1> won")
            .field("Total Wins", "3", true)
            .footer("Good game!")
            .timestamp();

        assert_eq!(panel.field_value("Total Wins"), Some("3"));
        assert_eq!(panel.field_value("Missing"), None);
        assert_eq!(panel.footer.as_deref(), Some("Good game!"));
        assert!(panel.timestamp);
    }

    #[test]
    fn test_post_constructors() {
        let post = Post::panel(Panel::new("t", 0)).with_content("hi");
        assert_eq!(post.content.as_deref(), Some("hi"));
        assert!(post.panel.is_some());
        assert!(Post::text("x").panel.is_none());
    }
}
