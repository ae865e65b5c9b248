use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entities::verification_entity as verifications;
use crate::error::AppResult;
use crate::models::{NewVerification, VerificationRecord};

/// Verification records store. Every read goes to the backing store; nothing
/// is cached between calls.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn insert(&self, new: NewVerification) -> AppResult<VerificationRecord>;

    /// Unused record with exactly this token.
    async fn find_unused_by_token(&self, token: Uuid) -> AppResult<Option<VerificationRecord>>;

    /// Most recently created unused record bound to `chat_id`.
    async fn latest_unused_for_chat(&self, chat_id: i64) -> AppResult<Option<VerificationRecord>>;

    /// Most recently created unused record with this exact phone and code.
    async fn latest_unused_for_login(
        &self,
        phone_number: &str,
        code: &str,
    ) -> AppResult<Option<VerificationRecord>>;

    async fn set_chat(&self, id: i64, chat_id: i64) -> AppResult<()>;

    /// Conditional flip of `is_used` from false to true. Returns false when
    /// another caller already consumed the record.
    async fn mark_used(&self, id: i64) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct SeaOrmVerificationStore {
    pool: DatabaseConnection,
}

impl SeaOrmVerificationStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationStore for SeaOrmVerificationStore {
    async fn insert(&self, new: NewVerification) -> AppResult<VerificationRecord> {
        let model = verifications::ActiveModel {
            token: Set(new.token),
            phone_number: Set(new.phone_number),
            code: Set(new.code),
            created_at: Set(new.created_at),
            expires_at: Set(new.expires_at),
            is_used: Set(false),
            chat_id: Set(None),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(model.into())
    }

    async fn find_unused_by_token(&self, token: Uuid) -> AppResult<Option<VerificationRecord>> {
        let found = verifications::Entity::find()
            .filter(verifications::Column::Token.eq(token))
            .filter(verifications::Column::IsUsed.eq(false))
            .one(&self.pool)
            .await?;
        Ok(found.map(Into::into))
    }

    async fn latest_unused_for_chat(&self, chat_id: i64) -> AppResult<Option<VerificationRecord>> {
        let found = verifications::Entity::find()
            .filter(verifications::Column::ChatId.eq(chat_id))
            .filter(verifications::Column::IsUsed.eq(false))
            .order_by_desc(verifications::Column::CreatedAt)
            .order_by_desc(verifications::Column::Id)
            .one(&self.pool)
            .await?;
        Ok(found.map(Into::into))
    }

    async fn latest_unused_for_login(
        &self,
        phone_number: &str,
        code: &str,
    ) -> AppResult<Option<VerificationRecord>> {
        let found = verifications::Entity::find()
            .filter(verifications::Column::PhoneNumber.eq(phone_number))
            .filter(verifications::Column::Code.eq(code))
            .filter(verifications::Column::IsUsed.eq(false))
            .order_by_desc(verifications::Column::CreatedAt)
            .order_by_desc(verifications::Column::Id)
            .one(&self.pool)
            .await?;
        Ok(found.map(Into::into))
    }

    async fn set_chat(&self, id: i64, chat_id: i64) -> AppResult<()> {
        verifications::Entity::update_many()
            .col_expr(verifications::Column::ChatId, Expr::value(chat_id))
            .filter(verifications::Column::Id.eq(id))
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_used(&self, id: i64) -> AppResult<bool> {
        let result = verifications::Entity::update_many()
            .col_expr(verifications::Column::IsUsed, Expr::value(true))
            .filter(verifications::Column::Id.eq(id))
            .filter(verifications::Column::IsUsed.eq(false))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected == 1)
    }
}

/// Process-local store used by tests and single-process demos.
#[derive(Default)]
pub struct InMemoryVerificationStore {
    records: RwLock<Vec<VerificationRecord>>,
    next_id: AtomicI64,
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: i64) -> Option<VerificationRecord> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    fn latest<'a>(
        records: impl Iterator<Item = &'a VerificationRecord>,
    ) -> Option<VerificationRecord> {
        records
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned()
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    async fn insert(&self, new: NewVerification) -> AppResult<VerificationRecord> {
        let record = VerificationRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            token: new.token,
            phone_number: new.phone_number,
            code: new.code,
            created_at: new.created_at,
            expires_at: new.expires_at,
            is_used: false,
            chat_id: None,
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_unused_by_token(&self, token: Uuid) -> AppResult<Option<VerificationRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.token == token && !r.is_used)
            .cloned())
    }

    async fn latest_unused_for_chat(&self, chat_id: i64) -> AppResult<Option<VerificationRecord>> {
        let records = self.records.read().await;
        Ok(Self::latest(
            records
                .iter()
                .filter(|r| r.chat_id == Some(chat_id) && !r.is_used),
        ))
    }

    async fn latest_unused_for_login(
        &self,
        phone_number: &str,
        code: &str,
    ) -> AppResult<Option<VerificationRecord>> {
        let records = self.records.read().await;
        Ok(Self::latest(records.iter().filter(|r| {
            r.phone_number == phone_number && r.code == code && !r.is_used
        })))
    }

    async fn set_chat(&self, id: i64, chat_id: i64) -> AppResult<()> {
        let mut records = self.records.write().await;
        if let Some(r) = records.iter_mut().find(|r| r.id == id) {
            r.chat_id = Some(chat_id);
        }
        Ok(())
    }

    async fn mark_used(&self, id: i64) -> AppResult<bool> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(r) if !r.is_used => {
                r.is_used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn new_record(phone: &str, code: &str, offset_secs: i64) -> NewVerification {
        let now = Utc::now() + Duration::seconds(offset_secs);
        NewVerification {
            token: Uuid::new_v4(),
            phone_number: phone.to_string(),
            code: code.to_string(),
            created_at: now,
            expires_at: now + Duration::minutes(10),
        }
    }

    #[tokio::test]
    async fn test_mark_used_only_succeeds_once() {
        let store = InMemoryVerificationStore::new();
        let r = store.insert(new_record("+1", "111111", 0)).await.unwrap();
        assert!(store.mark_used(r.id).await.unwrap());
        assert!(!store.mark_used(r.id).await.unwrap());
        assert!(store.find_unused_by_token(r.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_for_chat_prefers_newest() {
        let store = InMemoryVerificationStore::new();
        let older = store.insert(new_record("+1", "111111", -30)).await.unwrap();
        let newer = store.insert(new_record("+2", "222222", 0)).await.unwrap();
        store.set_chat(older.id, 7).await.unwrap();
        store.set_chat(newer.id, 7).await.unwrap();

        let found = store.latest_unused_for_chat(7).await.unwrap().unwrap();
        assert_eq!(found.id, newer.id);

        store.mark_used(newer.id).await.unwrap();
        let found = store.latest_unused_for_chat(7).await.unwrap().unwrap();
        assert_eq!(found.id, older.id);
    }

    #[tokio::test]
    async fn test_login_lookup_requires_exact_pair() {
        let store = InMemoryVerificationStore::new();
        store.insert(new_record("+1", "123456", 0)).await.unwrap();
        assert!(store
            .latest_unused_for_login("+1", "123456")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .latest_unused_for_login("+1", "654321")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .latest_unused_for_login("+2", "123456")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_concurrent_consumers_have_one_winner() {
        let store = std::sync::Arc::new(InMemoryVerificationStore::new());
        let r = store.insert(new_record("+1", "000001", 0)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.mark_used(r.id).await.unwrap() }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
