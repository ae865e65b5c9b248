use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};

/// User accounts keyed by phone number.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Returns the id of the account for `phone_number`, creating it first if needed.
    async fn get_or_create_by_phone(&self, phone_number: &str) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct SeaOrmAccountStore {
    pool: DatabaseConnection,
}

impl SeaOrmAccountStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    async fn find_id(&self, phone_number: &str) -> AppResult<Option<i64>> {
        Ok(users::Entity::find()
            .filter(users::Column::PhoneNumber.eq(phone_number))
            .one(&self.pool)
            .await?
            .map(|u| u.id))
    }
}

#[async_trait]
impl AccountStore for SeaOrmAccountStore {
    async fn get_or_create_by_phone(&self, phone_number: &str) -> AppResult<i64> {
        if let Some(id) = self.find_id(phone_number).await? {
            return Ok(id);
        }

        let inserted = users::ActiveModel {
            phone_number: Set(phone_number.to_string()),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            is_active: Set(true),
            is_staff: Set(false),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await;

        match inserted {
            Ok(user) => {
                log::info!("Created account {} for {}", user.id, phone_number);
                Ok(user.id)
            }
            // lost a race on the unique phone index
            Err(e) => self.find_id(phone_number).await?.ok_or_else(|| {
                AppError::InternalError(format!("Failed to create account: {e}"))
            }),
        }
    }
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, i64>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_or_create_by_phone(&self, phone_number: &str) -> AppResult<i64> {
        let mut accounts = self.accounts.write().await;
        let next_id = accounts.len() as i64 + 1;
        Ok(*accounts.entry(phone_number.to_string()).or_insert(next_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_is_keyed_by_phone() {
        let store = InMemoryAccountStore::new();
        let a = store.get_or_create_by_phone("+1").await.unwrap();
        let b = store.get_or_create_by_phone("+2").await.unwrap();
        let again = store.get_or_create_by_phone("+1").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(a, again);
        assert_eq!(store.count().await, 2);
    }
}
