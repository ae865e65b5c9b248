use crate::config::TelegramConfig;
use crate::error::{AppError, AppResult};
use crate::external::ChatGateway;
use crate::models::BotReply;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub contact: Option<Contact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub phone_number: String,
    /// Absent when the contact is not a Telegram user.
    pub user_id: Option<i64>,
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    async fn call<T: serde::de::DeserializeOwned>(&self, method: &str, body: &Value) -> AppResult<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let parsed: TelegramResponse<T> = response.json().await?;
        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            _ => {
                let description = parsed
                    .description
                    .unwrap_or_else(|| "Unknown error".to_string());
                log::error!("Telegram {method} failed ({status}): {description}");
                Err(AppError::ExternalApiError(format!(
                    "Telegram {method} failed: {description}"
                )))
            }
        }
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> AppResult<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, reply: &BotReply) -> AppResult<()> {
        let _: Value = self
            .call("sendMessage", &send_message_body(chat_id, reply))
            .await?;
        log::debug!("Reply sent to chat {chat_id}");
        Ok(())
    }
}

#[async_trait]
impl ChatGateway for TelegramClient {
    async fn send_reply(&self, chat_id: i64, reply: &BotReply) -> AppResult<()> {
        self.send_message(chat_id, reply).await
    }
}

/// `sendMessage` payload: HTML for codes, a one-time contact keyboard for the
/// phone prompt, keyboard removal otherwise.
pub fn send_message_body(chat_id: i64, reply: &BotReply) -> Value {
    let mut body = json!({
        "chat_id": chat_id,
        "text": reply.text(),
    });

    if reply.is_html() {
        body["parse_mode"] = json!("HTML");
    }

    body["reply_markup"] = if reply.requests_contact() {
        json!({
            "keyboard": [[{ "text": "📱 Share phone number", "request_contact": true }]],
            "resize_keyboard": true,
            "one_time_keyboard": true,
        })
    } else {
        json!({ "remove_keyboard": true })
    };

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerificationError;

    #[test]
    fn test_parse_contact_update() {
        let raw = r#"{
            "ok": true,
            "result": [{
                "update_id": 42,
                "message": {
                    "message_id": 7,
                    "chat": {"id": 1001, "type": "private"},
                    "from": {"id": 555, "is_bot": false, "first_name": "A"},
                    "contact": {"phone_number": "998901234567", "first_name": "A", "user_id": 555}
                }
            }]
        }"#;
        let parsed: TelegramResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(parsed.ok);
        let updates = parsed.result.unwrap();
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(updates[0].update_id, 42);
        assert_eq!(message.chat.id, 1001);
        let contact = message.contact.as_ref().unwrap();
        assert_eq!(contact.phone_number, "998901234567");
        assert_eq!(contact.user_id, Some(555));
        assert!(message.text.is_none());
    }

    #[test]
    fn test_parse_error_envelope() {
        let raw = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let parsed: TelegramResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_phone_prompt_has_contact_keyboard() {
        let body = send_message_body(9, &BotReply::RequestPhone);
        assert_eq!(body["chat_id"], 9);
        assert_eq!(
            body["reply_markup"]["keyboard"][0][0]["request_contact"],
            true
        );
        assert_eq!(body["reply_markup"]["one_time_keyboard"], true);
        assert!(body.get("parse_mode").is_none());
    }

    #[test]
    fn test_code_reply_is_html_and_removes_keyboard() {
        let body = send_message_body(9, &BotReply::RevealCode("012345".into()));
        assert_eq!(body["parse_mode"], "HTML");
        assert_eq!(body["reply_markup"]["remove_keyboard"], true);
        assert!(body["text"].as_str().unwrap().contains("<b>012345</b>"));
    }

    #[test]
    fn test_rejection_is_plain_text() {
        let body = send_message_body(
            9,
            &BotReply::Rejected(VerificationError::PhoneMismatch),
        );
        assert!(body.get("parse_mode").is_none());
        assert_eq!(body["reply_markup"]["remove_keyboard"], true);
    }

    #[test]
    fn test_method_url() {
        let client = TelegramClient::new(TelegramConfig {
            bot_token: "123:abc".into(),
            bot_username: "shop_bot".into(),
            deep_link_base: "https://t.me".into(),
            api_base: "https://api.telegram.org/".into(),
            mode: crate::config::BotMode::Polling,
            webhook_secret: None,
            poll_timeout_secs: 30,
            require_own_contact: true,
        });
        assert_eq!(
            client.method_url("getUpdates"),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
    }
}
