//! Console adapter for local play.
//!
//! Implements the messaging port over stdout and parses stdin lines into
//! updates. Input format is `<user_id> <text>`, where text starting with `/`
//! is a command; everything happens in a single pretend channel. Real
//! deployments swap this for a platform adapter behind the same port.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use wgb_core::{
    domain::{ChannelId, MessageId, MessageRef, UserId},
    messaging::{
        port::MessagingPort,
        types::{ButtonRow, Command, IncomingUpdate, MessagingCapabilities, TextMessage},
    },
    Result,
};

pub const CONSOLE_CHANNEL: ChannelId = ChannelId(1);

pub struct ConsoleMessenger;

#[async_trait]
impl MessagingPort for ConsoleMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_edit: false,
            supports_buttons: false,
            supports_dm: false,
            max_message_len: usize::MAX,
        }
    }

    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef> {
        println!("[bot] {text}");
        Ok(MessageRef {
            channel_id,
            message_id: MessageId(0),
        })
    }

    async fn send_dm(&self, user_id: UserId, text: &str) -> Result<MessageRef> {
        println!("[bot -> player {}] {text}", user_id.0);
        Ok(MessageRef {
            channel_id: ChannelId(user_id.0),
            message_id: MessageId(0),
        })
    }

    async fn edit_text(&self, _msg: MessageRef, text: &str) -> Result<()> {
        println!("[bot, edited] {text}");
        Ok(())
    }

    async fn delete_message(&self, _msg: MessageRef) -> Result<()> {
        Ok(())
    }

    async fn send_buttons(
        &self,
        channel_id: ChannelId,
        text: &str,
        buttons: ButtonRow,
    ) -> Result<MessageRef> {
        let labels: Vec<&str> = buttons.buttons.iter().map(|b| b.label.as_str()).collect();
        println!("[bot] {text}  ({})", labels.join(" / "));
        Ok(MessageRef {
            channel_id,
            message_id: MessageId(0),
        })
    }

    async fn answer_button(&self, _click_id: &str, text: Option<&str>) -> Result<()> {
        if let Some(t) = text {
            println!("[bot] {t}");
        }
        Ok(())
    }
}

/// Parse one console line into an update, or None for blank/malformed input.
pub fn parse_line(line: &str) -> Option<IncomingUpdate> {
    let line = line.trim();
    let (user, rest) = line.split_once(' ')?;
    let user_id = UserId(user.parse().ok()?);
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    if let Some(cmd) = rest.strip_prefix('/') {
        let (name, args) = match cmd.split_once(' ') {
            Some((n, a)) => (n.to_string(), a.to_string()),
            None => (cmd.to_string(), String::new()),
        };
        return Some(IncomingUpdate::Command(Command {
            channel_id: CONSOLE_CHANNEL,
            user_id,
            username: None,
            name,
            args,
        }));
    }

    Some(IncomingUpdate::Text(TextMessage {
        channel_id: CONSOLE_CHANNEL,
        user_id,
        username: None,
        text: rest.to_string(),
    }))
}

/// Read stdin until EOF, feeding parsed updates to `on_update`.
pub async fn run_input_loop<F, Fut>(on_update: F)
where
    F: Fn(IncomingUpdate) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(update) = parse_line(&line) {
                    on_update(update).await;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_text() {
        match parse_line("1 /hangman") {
            Some(IncomingUpdate::Command(c)) => {
                assert_eq!(c.user_id, UserId(1));
                assert_eq!(c.name, "hangman");
                assert!(c.args.is_empty());
            }
            other => panic!("unexpected parse: {other:?}"),
        }

        match parse_line("42 crumble") {
            Some(IncomingUpdate::Text(t)) => {
                assert_eq!(t.user_id, UserId(42));
                assert_eq!(t.text, "crumble");
            }
            other => panic!("unexpected parse: {other:?}"),
        }

        assert!(parse_line("").is_none());
        assert!(parse_line("notanumber hi").is_none());
        assert!(parse_line("7").is_none());
    }
}
