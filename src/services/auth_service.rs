use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::config::{TelegramConfig, VerificationConfig};
use crate::error::{AppError, AppResult, VerificationError};
use crate::models::*;
use crate::repositories::{AccountStore, VerificationStore};
use crate::utils::*;

pub const CODE_MAX_LEN: usize = 6;

/// Builds `https://<chat-domain>/<bot-name>?start=<token>` links.
#[derive(Clone, Debug)]
pub struct DeepLinkBuilder {
    base: String,
    bot_username: String,
}

impl DeepLinkBuilder {
    pub fn new(base: &str, bot_username: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            bot_username: bot_username.trim_start_matches('@').to_string(),
        }
    }

    pub fn from_config(config: &TelegramConfig) -> Self {
        Self::new(&config.deep_link_base, &config.bot_username)
    }

    pub fn build(&self, token: &uuid::Uuid) -> String {
        format!("{}/{}?start={}", self.base, self.bot_username, token)
    }
}

#[derive(Clone)]
pub struct AuthService {
    verifications: Arc<dyn VerificationStore>,
    accounts: Arc<dyn AccountStore>,
    jwt_service: JwtService,
    deep_links: DeepLinkBuilder,
    ttl: Duration,
}

impl AuthService {
    pub fn new(
        verifications: Arc<dyn VerificationStore>,
        accounts: Arc<dyn AccountStore>,
        jwt_service: JwtService,
        deep_links: DeepLinkBuilder,
        verification: &VerificationConfig,
    ) -> Self {
        Self {
            verifications,
            accounts,
            jwt_service,
            deep_links,
            ttl: Duration::minutes(verification.ttl_minutes),
        }
    }

    /// Issues a fresh token and code for the phone. Earlier pending records
    /// for the same phone stay pending.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        validate_phone(&request.phone_number)?;
        let phone = request.phone_number.trim();

        let new = NewVerification::issue(phone, self.ttl, Utc::now());
        let record = self.verifications.insert(new).await?;
        log::info!(
            "Verification {} issued for {}, expires at {}",
            record.id,
            record.phone_number,
            record.expires_at
        );

        Ok(RegisterResponse {
            deep_link: self.deep_links.build(&record.token),
        })
    }

    /// Wrong code, expired code and already used code all fail the same way.
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        validate_phone(&request.phone_number)?;
        if request.verification_code.chars().count() > CODE_MAX_LEN {
            return Err(AppError::ValidationError(format!(
                "verification_code must be at most {CODE_MAX_LEN} characters"
            )));
        }
        let phone = request.phone_number.trim();

        let record = self
            .verifications
            .latest_unused_for_login(phone, &request.verification_code)
            .await?
            .ok_or(VerificationError::InvalidOrExpiredCode)?;

        record.ensure_consumable(Utc::now())?;

        // The code is spent before the account lookup; a later failure does not restore it.
        if !self.verifications.mark_used(record.id).await? {
            log::warn!("Verification {} was consumed concurrently", record.id);
            return Err(VerificationError::InvalidOrExpiredCode.into());
        }

        let user_id = self.accounts.get_or_create_by_phone(phone).await?;

        let access_token = self.jwt_service.generate_access_token(user_id, phone)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user_id, phone)?;
        log::info!("User {user_id} logged in with verification {}", record.id);

        Ok(AuthResponse {
            access_token,
            refresh_token,
            user_id,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<RefreshResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

        let access_token = self
            .jwt_service
            .generate_access_token(user_id, &claims.phone_number)?;

        Ok(RefreshResponse {
            access_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{InMemoryAccountStore, InMemoryVerificationStore};
    use crate::services::BotService;

    const PHONE: &str = "+998901234567";

    struct Harness {
        store: Arc<InMemoryVerificationStore>,
        accounts: Arc<InMemoryAccountStore>,
        auth: AuthService,
        bot: BotService,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryVerificationStore::new());
        let accounts = Arc::new(InMemoryAccountStore::new());
        let auth = AuthService::new(
            store.clone(),
            accounts.clone(),
            JwtService::new("test-secret", 300, 86_400),
            DeepLinkBuilder::new("https://t.me", "scommerce_bot"),
            &VerificationConfig::default(),
        );
        let bot = BotService::new(store.clone());
        Harness {
            store,
            accounts,
            auth,
            bot,
        }
    }

    fn token_of(deep_link: &str) -> &str {
        deep_link.split("?start=").nth(1).unwrap()
    }

    async fn register(h: &Harness, phone: &str) -> String {
        h.auth
            .register(RegisterRequest {
                phone_number: phone.to_string(),
            })
            .await
            .unwrap()
            .deep_link
    }

    async fn login(h: &Harness, phone: &str, code: &str) -> AppResult<AuthResponse> {
        h.auth
            .login(LoginRequest {
                phone_number: phone.to_string(),
                verification_code: code.to_string(),
            })
            .await
    }

    fn is_invalid_code(r: &AppResult<AuthResponse>) -> bool {
        matches!(
            r,
            Err(AppError::Verification(VerificationError::InvalidOrExpiredCode))
        )
    }

    #[test]
    fn test_deep_link_format() {
        let links = DeepLinkBuilder::new("https://t.me/", "@scommerce_bot");
        let token = uuid::Uuid::nil();
        assert_eq!(
            links.build(&token),
            "https://t.me/scommerce_bot?start=00000000-0000-0000-0000-000000000000"
        );
    }

    #[tokio::test]
    async fn test_register_creates_pending_record() {
        let h = harness();
        let link = register(&h, PHONE).await;
        assert!(link.starts_with("https://t.me/scommerce_bot?start="));

        let token: uuid::Uuid = token_of(&link).parse().unwrap();
        let record = h.store.find_unused_by_token(token).await.unwrap().unwrap();
        assert_eq!(record.phone_number, PHONE);
        assert!(!record.is_used);
        assert_eq!(record.chat_id, None);
        assert_eq!(record.expires_at - record.created_at, Duration::minutes(10));
        assert_eq!(record.code.len(), 6);
    }

    #[tokio::test]
    async fn test_register_rejects_blank_phone() {
        let h = harness();
        let result = h
            .auth
            .register(RegisterRequest {
                phone_number: "  ".into(),
            })
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(h.store.len().await, 0);
    }

    #[tokio::test]
    async fn test_full_flow_then_replay_fails() {
        let h = harness();
        let link = register(&h, PHONE).await;

        let reply = h
            .bot
            .handle_start(100, &format!("/start {}", token_of(&link)))
            .await
            .unwrap();
        assert_eq!(reply, BotReply::RequestPhone);

        let reply = h.bot.handle_contact(100, "998901234567").await.unwrap();
        let code = match reply {
            BotReply::RevealCode(code) => code,
            other => panic!("expected code, got {other:?}"),
        };

        let auth = login(&h, PHONE, &code).await.unwrap();
        assert_eq!(auth.user_id, 1);
        assert_eq!(auth.expires_in, 300);
        assert!(!auth.access_token.is_empty());
        assert!(!auth.refresh_token.is_empty());

        assert!(is_invalid_code(&login(&h, PHONE, &code).await));
        assert_eq!(h.accounts.count().await, 1);
    }

    #[tokio::test]
    async fn test_login_with_never_issued_code_fails() {
        let h = harness();
        let link = register(&h, PHONE).await;
        let token: uuid::Uuid = token_of(&link).parse().unwrap();
        let issued = h.store.find_unused_by_token(token).await.unwrap().unwrap();
        let wrong = if issued.code == "000000" { "000001" } else { "000000" };

        assert!(is_invalid_code(&login(&h, PHONE, wrong).await));
        assert!(is_invalid_code(&login(&h, PHONE, "").await));
        // the real record is untouched
        assert!(!h.store.get(issued.id).await.unwrap().is_used);
    }

    #[tokio::test]
    async fn test_code_is_bound_to_its_phone() {
        let h = harness();
        let link = register(&h, PHONE).await;
        let token: uuid::Uuid = token_of(&link).parse().unwrap();
        let code = h.store.find_unused_by_token(token).await.unwrap().unwrap().code;

        assert!(is_invalid_code(&login(&h, "+998900000000", &code).await));
        assert!(login(&h, PHONE, &code).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_and_wrong_code_look_identical() {
        let h = harness();
        let now = Utc::now();
        let expired = h
            .store
            .insert(NewVerification {
                token: uuid::Uuid::new_v4(),
                phone_number: PHONE.into(),
                code: "123456".into(),
                created_at: now - Duration::minutes(20),
                expires_at: now - Duration::minutes(10),
            })
            .await
            .unwrap();

        let expired_err = login(&h, PHONE, "123456").await.unwrap_err().to_string();
        let wrong_err = login(&h, PHONE, "654321").await.unwrap_err().to_string();
        assert_eq!(expired_err, wrong_err);
        assert_eq!(expired_err, "Invalid or expired code");
        assert!(!h.store.get(expired.id).await.unwrap().is_used);
    }

    #[tokio::test]
    async fn test_login_does_not_require_chat_binding() {
        // Only the chat reveals the code, but login itself checks phone + code.
        let h = harness();
        let link = register(&h, PHONE).await;
        let token: uuid::Uuid = token_of(&link).parse().unwrap();
        let code = h.store.find_unused_by_token(token).await.unwrap().unwrap().code;
        assert!(login(&h, PHONE, &code).await.is_ok());
    }

    #[tokio::test]
    async fn test_reregistration_keeps_previous_records_pending() {
        let h = harness();
        let first = register(&h, PHONE).await;
        let second = register(&h, PHONE).await;
        assert_ne!(first, second);

        for link in [&first, &second] {
            let token: uuid::Uuid = token_of(link).parse().unwrap();
            let record = h.store.find_unused_by_token(token).await.unwrap().unwrap();
            assert!(record.is_valid());
        }
        assert_eq!(h.store.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_logins_issue_one_credential_pair() {
        let h = harness();
        let link = register(&h, PHONE).await;
        let token: uuid::Uuid = token_of(&link).parse().unwrap();
        let code = h.store.find_unused_by_token(token).await.unwrap().unwrap().code;

        let (a, b) = tokio::join!(login(&h, PHONE, &code), login(&h, PHONE, &code));
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn test_refresh_issues_new_access_token() {
        let h = harness();
        let link = register(&h, PHONE).await;
        let token: uuid::Uuid = token_of(&link).parse().unwrap();
        let code = h.store.find_unused_by_token(token).await.unwrap().unwrap().code;
        let auth = login(&h, PHONE, &code).await.unwrap();

        let refreshed = h.auth.refresh_token(&auth.refresh_token).await.unwrap();
        assert_ne!(refreshed.access_token, auth.access_token);
        assert!(h.auth.refresh_token(&auth.access_token).await.is_err());
    }

    struct FailingAccounts;

    #[async_trait::async_trait]
    impl AccountStore for FailingAccounts {
        async fn get_or_create_by_phone(&self, _phone_number: &str) -> AppResult<i64> {
            Err(AppError::InternalError("accounts unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_code_stays_spent_when_account_lookup_fails() {
        let store = Arc::new(InMemoryVerificationStore::new());
        let auth = AuthService::new(
            store.clone(),
            Arc::new(FailingAccounts),
            JwtService::new("test-secret", 300, 86_400),
            DeepLinkBuilder::new("https://t.me", "scommerce_bot"),
            &VerificationConfig::default(),
        );
        let link = auth
            .register(RegisterRequest {
                phone_number: PHONE.to_string(),
            })
            .await
            .unwrap()
            .deep_link;
        let token: uuid::Uuid = token_of(&link).parse().unwrap();
        let record = store.find_unused_by_token(token).await.unwrap().unwrap();
        let request = || LoginRequest {
            phone_number: PHONE.to_string(),
            verification_code: record.code.clone(),
        };

        let first = auth.login(request()).await;
        assert!(matches!(first, Err(AppError::InternalError(_))));
        assert!(store.get(record.id).await.unwrap().is_used);

        let retry = auth.login(request()).await;
        assert!(is_invalid_code(&retry));
    }

    #[tokio::test]
    async fn test_login_rejects_overlong_code() {
        let h = harness();
        let result = login(&h, PHONE, "1234567").await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}
