pub mod telegram;

pub use telegram::*;

use crate::error::AppResult;
use crate::models::BotReply;
use async_trait::async_trait;

/// Outbound side of the chat bot.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send_reply(&self, chat_id: i64, reply: &BotReply) -> AppResult<()>;
}
