use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppResult, VerificationError};
use crate::models::BotReply;
use crate::repositories::VerificationStore;
use crate::utils::normalize_phone;

/// Chat side of the verification handshake. Store failures propagate as
/// errors; every protocol failure becomes a `BotReply::Rejected`.
#[derive(Clone)]
pub struct BotService {
    verifications: Arc<dyn VerificationStore>,
}

/// `/start` and `/start@bot_name`, as sent by Telegram clients.
pub fn is_start_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(|cmd| cmd == "/start" || cmd.starts_with("/start@"))
        .unwrap_or(false)
}

impl BotService {
    pub fn new(verifications: Arc<dyn VerificationStore>) -> Self {
        Self { verifications }
    }

    /// `/start <token>` from a deep link. Binds the chat to the pending record.
    pub async fn handle_start(&self, chat_id: i64, text: &str) -> AppResult<BotReply> {
        let args: Vec<&str> = text.split_whitespace().collect();
        let [_, token] = args.as_slice() else {
            return Ok(BotReply::Rejected(VerificationError::MissingStartToken));
        };

        let Ok(token) = token.parse::<Uuid>() else {
            return Ok(BotReply::Rejected(VerificationError::InvalidToken));
        };

        let Some(mut record) = self.verifications.find_unused_by_token(token).await? else {
            log::info!("Chat {chat_id} presented an unknown token");
            return Ok(BotReply::Rejected(VerificationError::InvalidToken));
        };

        let previous_chat = record.chat_id;
        if let Err(e) = record.bind_chat(chat_id, Utc::now()) {
            return Ok(BotReply::Rejected(e));
        }
        if let Some(prev) = previous_chat
            && prev != chat_id
        {
            log::warn!(
                "Verification {} re-bound from chat {prev} to chat {chat_id}",
                record.id
            );
        }

        self.verifications.set_chat(record.id, chat_id).await?;
        log::info!("Verification {} bound to chat {chat_id}", record.id);
        Ok(BotReply::RequestPhone)
    }

    /// Contact share. Reveals the code when the phone matches the record
    /// most recently bound to this chat. A mismatch leaves the record pending.
    pub async fn handle_contact(&self, chat_id: i64, phone_number: &str) -> AppResult<BotReply> {
        let phone = normalize_phone(phone_number);

        let Some(record) = self.verifications.latest_unused_for_chat(chat_id).await? else {
            return Ok(BotReply::Rejected(VerificationError::NoPendingVerification));
        };

        match record.reveal_code(&phone, Utc::now()) {
            Ok(code) => {
                log::info!("Code for verification {} revealed to chat {chat_id}", record.id);
                Ok(BotReply::RevealCode(code.to_string()))
            }
            Err(e) => {
                log::info!("Chat {chat_id} contact rejected: {e}");
                Ok(BotReply::Rejected(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewVerification;
    use crate::repositories::InMemoryVerificationStore;
    use chrono::Duration;

    const PHONE: &str = "+998901234567";

    async fn setup() -> (Arc<InMemoryVerificationStore>, BotService, Uuid, i64) {
        let store = Arc::new(InMemoryVerificationStore::new());
        let record = store
            .insert(NewVerification::issue(PHONE, Duration::minutes(10), Utc::now()))
            .await
            .unwrap();
        let bot = BotService::new(store.clone());
        (store, bot, record.token, record.id)
    }

    #[test]
    fn test_is_start_command() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("/start abc"));
        assert!(is_start_command("/start@scommerce_bot abc"));
        assert!(!is_start_command("/started"));
        assert!(!is_start_command("hello /start"));
        assert!(!is_start_command(""));
    }

    #[tokio::test]
    async fn test_start_without_token() {
        let (_, bot, _, _) = setup().await;
        assert_eq!(
            bot.handle_start(1, "/start").await.unwrap(),
            BotReply::Rejected(VerificationError::MissingStartToken)
        );
        assert_eq!(
            bot.handle_start(1, "/start a b").await.unwrap(),
            BotReply::Rejected(VerificationError::MissingStartToken)
        );
    }

    #[tokio::test]
    async fn test_start_with_unknown_token() {
        let (_, bot, _, _) = setup().await;
        for text in [
            format!("/start {}", Uuid::new_v4()),
            "/start not-a-uuid".to_string(),
        ] {
            assert_eq!(
                bot.handle_start(1, &text).await.unwrap(),
                BotReply::Rejected(VerificationError::InvalidToken)
            );
        }
    }

    #[tokio::test]
    async fn test_start_binds_chat() {
        let (store, bot, token, id) = setup().await;
        let reply = bot.handle_start(77, &format!("/start {token}")).await.unwrap();
        assert_eq!(reply, BotReply::RequestPhone);
        assert_eq!(store.get(id).await.unwrap().chat_id, Some(77));
    }

    #[tokio::test]
    async fn test_start_with_expired_token() {
        let store = Arc::new(InMemoryVerificationStore::new());
        let now = Utc::now();
        let record = store
            .insert(NewVerification {
                token: Uuid::new_v4(),
                phone_number: PHONE.into(),
                code: "123456".into(),
                created_at: now - Duration::minutes(11),
                expires_at: now - Duration::minutes(1),
            })
            .await
            .unwrap();
        let bot = BotService::new(store.clone());

        let reply = bot
            .handle_start(5, &format!("/start {}", record.token))
            .await
            .unwrap();
        assert_eq!(reply, BotReply::Rejected(VerificationError::ExpiredOrUsedToken));
        assert_eq!(store.get(record.id).await.unwrap().chat_id, None);
    }

    #[tokio::test]
    async fn test_start_with_used_token_is_invalid_link() {
        // used records are filtered out of the lookup, so they read as unknown
        let (store, bot, token, id) = setup().await;
        store.mark_used(id).await.unwrap();
        assert_eq!(
            bot.handle_start(5, &format!("/start {token}")).await.unwrap(),
            BotReply::Rejected(VerificationError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_second_start_rebinds_to_new_chat() {
        // No re-bind guard: the latest chat to present the token owns it.
        let (store, bot, token, id) = setup().await;
        bot.handle_start(1, &format!("/start {token}")).await.unwrap();
        let reply = bot.handle_start(2, &format!("/start {token}")).await.unwrap();
        assert_eq!(reply, BotReply::RequestPhone);
        assert_eq!(store.get(id).await.unwrap().chat_id, Some(2));

        assert_eq!(
            bot.handle_contact(1, PHONE).await.unwrap(),
            BotReply::Rejected(VerificationError::NoPendingVerification)
        );
        assert!(matches!(
            bot.handle_contact(2, PHONE).await.unwrap(),
            BotReply::RevealCode(_)
        ));
    }

    #[tokio::test]
    async fn test_contact_without_binding() {
        let (_, bot, _, _) = setup().await;
        assert_eq!(
            bot.handle_contact(9, PHONE).await.unwrap(),
            BotReply::Rejected(VerificationError::NoPendingVerification)
        );
    }

    #[tokio::test]
    async fn test_contact_reveals_code_after_normalizing() {
        let (store, bot, token, id) = setup().await;
        bot.handle_start(3, &format!("/start {token}")).await.unwrap();
        let code = store.get(id).await.unwrap().code;
        assert_eq!(
            bot.handle_contact(3, "998901234567").await.unwrap(),
            BotReply::RevealCode(code)
        );
    }

    #[tokio::test]
    async fn test_mismatch_leaves_record_pending() {
        let (store, bot, token, id) = setup().await;
        bot.handle_start(3, &format!("/start {token}")).await.unwrap();

        assert_eq!(
            bot.handle_contact(3, "+998900000000").await.unwrap(),
            BotReply::Rejected(VerificationError::PhoneMismatch)
        );
        let record = store.get(id).await.unwrap();
        assert!(!record.is_used);
        assert!(record.is_valid());

        assert_eq!(
            bot.handle_contact(3, PHONE).await.unwrap(),
            BotReply::RevealCode(record.code)
        );
    }

    #[tokio::test]
    async fn test_contact_uses_most_recent_binding() {
        let (store, bot, first_token, _) = setup().await;
        let second = store
            .insert(NewVerification::issue(
                "+998911111111",
                Duration::minutes(10),
                Utc::now() + Duration::seconds(1),
            ))
            .await
            .unwrap();
        bot.handle_start(4, &format!("/start {first_token}")).await.unwrap();
        bot.handle_start(4, &format!("/start {}", second.token))
            .await
            .unwrap();

        assert_eq!(
            bot.handle_contact(4, PHONE).await.unwrap(),
            BotReply::Rejected(VerificationError::PhoneMismatch)
        );
        assert_eq!(
            bot.handle_contact(4, "+998911111111").await.unwrap(),
            BotReply::RevealCode(second.code)
        );
    }
}
