use crate::error::{AppResult, VerificationError};
use crate::external::{ChatGateway, Message, Update};
use crate::models::BotReply;
use crate::services::{BotService, is_start_command};
use actix_web::{HttpRequest, HttpResponse, Result, web};
use log::{error, info, warn};
use std::sync::Arc;

pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Routes inbound updates to the bot service and sends the reply back.
/// Shared by the long-poll task and the webhook endpoint.
#[derive(Clone)]
pub struct BotDispatcher {
    bot: BotService,
    gateway: Arc<dyn ChatGateway>,
    require_own_contact: bool,
}

impl BotDispatcher {
    pub fn new(bot: BotService, gateway: Arc<dyn ChatGateway>, require_own_contact: bool) -> Self {
        Self {
            bot,
            gateway,
            require_own_contact,
        }
    }

    /// Returns the reply that was sent, `None` for ignored updates.
    pub async fn dispatch(&self, update: &Update) -> AppResult<Option<BotReply>> {
        let Some(message) = &update.message else {
            return Ok(None);
        };
        let chat_id = message.chat.id;

        let reply = if let Some(contact) = &message.contact {
            if self.require_own_contact && !is_own_contact(message) {
                warn!("Chat {chat_id} shared someone else's contact");
                BotReply::Rejected(VerificationError::ForeignContact)
            } else {
                self.bot.handle_contact(chat_id, &contact.phone_number).await?
            }
        } else if let Some(text) = message.text.as_deref()
            && is_start_command(text)
        {
            self.bot.handle_start(chat_id, text).await?
        } else {
            return Ok(None);
        };

        self.gateway.send_reply(chat_id, &reply).await?;
        Ok(Some(reply))
    }
}

fn is_own_contact(message: &Message) -> bool {
    match (&message.contact, &message.from) {
        (Some(contact), Some(sender)) => contact.user_id == Some(sender.id),
        _ => false,
    }
}

/// Expected value of the secret header, when one is configured.
#[derive(Clone, Debug, Default)]
pub struct WebhookSecret(pub Option<String>);

/// Telegram webhook. Processing failures still answer 200 so the update is
/// not redelivered forever.
pub async fn telegram_webhook(
    req: HttpRequest,
    update: web::Json<Update>,
    dispatcher: web::Data<BotDispatcher>,
    secret: web::Data<WebhookSecret>,
) -> Result<HttpResponse> {
    if let Some(expected) = secret.0.as_deref() {
        let provided = req
            .headers()
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            warn!("Telegram webhook called with a bad secret token");
            return Ok(HttpResponse::Unauthorized().json(serde_json::json!({
                "ok": false
            })));
        }
    }

    info!("Received Telegram update {}", update.update_id);
    if let Err(e) = dispatcher.dispatch(&update).await {
        error!("Failed to process Telegram update {}: {e}", update.update_id);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/webhook/telegram", web::post().to(telegram_webhook));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{Chat, Contact, User};
    use crate::models::NewVerification;
    use crate::repositories::{InMemoryVerificationStore, VerificationStore};
    use actix_web::{App, test};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<(i64, BotReply)>>,
    }

    #[async_trait]
    impl ChatGateway for RecordingGateway {
        async fn send_reply(&self, chat_id: i64, reply: &BotReply) -> AppResult<()> {
            self.sent.lock().await.push((chat_id, reply.clone()));
            Ok(())
        }
    }

    const PHONE: &str = "+998901234567";

    async fn setup(require_own: bool) -> (Arc<RecordingGateway>, BotDispatcher, uuid::Uuid, String) {
        let store = Arc::new(InMemoryVerificationStore::new());
        let record = store
            .insert(NewVerification::issue(PHONE, Duration::minutes(10), Utc::now()))
            .await
            .unwrap();
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher =
            BotDispatcher::new(BotService::new(store), gateway.clone(), require_own);
        (gateway, dispatcher, record.token, record.code)
    }

    fn text_update(chat_id: i64, text: &str) -> Update {
        Update {
            update_id: 1,
            message: Some(Message {
                message_id: 1,
                chat: Chat { id: chat_id },
                from: Some(User { id: chat_id }),
                text: Some(text.to_string()),
                contact: None,
            }),
        }
    }

    fn contact_update(chat_id: i64, sender: i64, owner: Option<i64>, phone: &str) -> Update {
        Update {
            update_id: 2,
            message: Some(Message {
                message_id: 2,
                chat: Chat { id: chat_id },
                from: Some(User { id: sender }),
                text: None,
                contact: Some(Contact {
                    phone_number: phone.to_string(),
                    user_id: owner,
                }),
            }),
        }
    }

    #[tokio::test]
    async fn test_full_chat_exchange() {
        let (gateway, dispatcher, token, code) = setup(true).await;

        let reply = dispatcher
            .dispatch(&text_update(10, &format!("/start {token}")))
            .await
            .unwrap();
        assert_eq!(reply, Some(BotReply::RequestPhone));

        let reply = dispatcher
            .dispatch(&contact_update(10, 10, Some(10), "998901234567"))
            .await
            .unwrap();
        assert_eq!(reply, Some(BotReply::RevealCode(code.clone())));

        let sent = gateway.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], (10, BotReply::RevealCode(code)));
    }

    #[tokio::test]
    async fn test_other_messages_are_ignored() {
        let (gateway, dispatcher, _, _) = setup(true).await;
        assert_eq!(dispatcher.dispatch(&text_update(10, "hello")).await.unwrap(), None);
        let empty = Update {
            update_id: 3,
            message: None,
        };
        assert_eq!(dispatcher.dispatch(&empty).await.unwrap(), None);
        assert!(gateway.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_contact_is_rejected() {
        let (_, dispatcher, token, _) = setup(true).await;
        dispatcher
            .dispatch(&text_update(10, &format!("/start {token}")))
            .await
            .unwrap();

        let reply = dispatcher
            .dispatch(&contact_update(10, 10, Some(99), PHONE))
            .await
            .unwrap();
        assert_eq!(
            reply,
            Some(BotReply::Rejected(VerificationError::ForeignContact))
        );

        let reply = dispatcher
            .dispatch(&contact_update(10, 10, None, PHONE))
            .await
            .unwrap();
        assert_eq!(
            reply,
            Some(BotReply::Rejected(VerificationError::ForeignContact))
        );
    }

    #[tokio::test]
    async fn test_foreign_contact_allowed_when_check_disabled() {
        let (_, dispatcher, token, code) = setup(false).await;
        dispatcher
            .dispatch(&text_update(10, &format!("/start {token}")))
            .await
            .unwrap();
        let reply = dispatcher
            .dispatch(&contact_update(10, 10, Some(99), PHONE))
            .await
            .unwrap();
        assert_eq!(reply, Some(BotReply::RevealCode(code)));
    }

    #[actix_web::test]
    async fn test_webhook_checks_secret() {
        let (gateway, dispatcher, token, _) = setup(true).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(dispatcher))
                .app_data(web::Data::new(WebhookSecret(Some("s3cret".into()))))
                .configure(webhook_config),
        )
        .await;

        let update = text_update(10, &format!("/start {token}"));

        let req = test::TestRequest::post()
            .uri("/webhook/telegram")
            .set_json(&update)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        assert!(gateway.sent.lock().await.is_empty());

        let req = test::TestRequest::post()
            .uri("/webhook/telegram")
            .insert_header((SECRET_HEADER, "s3cret"))
            .set_json(&update)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], true);
        assert_eq!(gateway.sent.lock().await.len(), 1);
    }
}
