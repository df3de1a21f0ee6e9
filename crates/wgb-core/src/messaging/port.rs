use async_trait::async_trait;

use crate::{
    domain::{ChannelId, MessageRef, UserId},
    messaging::types::{ButtonRow, MessagingCapabilities},
    Result,
};

/// Cross-platform chat port.
///
/// The game logic only ever talks to this trait; a platform adapter maps it
/// onto its real API and declares what it can do via capability flags.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Post into a channel (the shared game surface).
    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef>;

    /// Direct message a single player (secret-word prompts and the like).
    async fn send_dm(&self, user_id: UserId, text: &str) -> Result<MessageRef>;

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()>;
    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    /// Post a message carrying tappable buttons (join/start/cancel).
    async fn send_buttons(
        &self,
        channel_id: ChannelId,
        text: &str,
        buttons: ButtonRow,
    ) -> Result<MessageRef>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn answer_button(&self, click_id: &str, text: Option<&str>) -> Result<()>;
}
