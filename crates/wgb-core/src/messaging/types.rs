use crate::domain::{ChannelId, MessageRef, UserId};

/// Cross-platform incoming update model.
///
/// Platform-specific payloads stay in the adapter; by the time an update
/// reaches the handlers it is one of these.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(Command),
    Text(TextMessage),
    ButtonClick(ButtonClick),
}

/// A slash-style command (`/hangman`, `/join`, `/top`, ...).
#[derive(Clone, Debug)]
pub struct Command {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub name: String,
    pub args: String,
}

/// Free text in a channel with a running game (guesses, word submissions).
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: String,
}

/// A tap on one of the lobby buttons.
#[derive(Clone, Debug)]
pub struct ButtonClick {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub click_id: String,
    pub data: String,
    pub message: Option<MessageRef>,
}

/// One row of tappable buttons attached to a message.
#[derive(Clone, Debug)]
pub struct ButtonRow {
    pub buttons: Vec<Button>,
}

#[derive(Clone, Debug)]
pub struct Button {
    pub label: String,
    pub callback_data: String,
}

impl ButtonRow {
    pub fn new(buttons: Vec<Button>) -> Self {
        Self { buttons }
    }

    /// The standard lobby row: join / start / cancel, keyed by session id.
    pub fn lobby(session_id: &str) -> Self {
        Self::new(vec![
            Button {
                label: "Join".to_string(),
                callback_data: format!("lobby:{session_id}:join"),
            },
            Button {
                label: "Start".to_string(),
                callback_data: format!("lobby:{session_id}:start"),
            },
            Button {
                label: "Cancel".to_string(),
                callback_data: format!("lobby:{session_id}:cancel"),
            },
        ])
    }
}

/// Capabilities / feature flags of a platform adapter.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_edit: bool,
    pub supports_buttons: bool,
    pub supports_dm: bool,
    pub max_message_len: usize,
}
