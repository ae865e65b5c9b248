//! Verification records and the lifecycle they move through.
//!
//! A record is issued by registration, bound to a chat by the bot's start
//! command, disclosed over that chat once the shared contact matches, and
//! finally consumed by a successful login. Expiry is evaluated lazily against
//! the caller's clock; nothing sweeps old records.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::entities::verification_entity;
use crate::error::VerificationError;
use crate::utils::generate_six_digit_code;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// Valid and waiting for the chat client to present the token.
    Issued,
    /// Valid and bound to a chat; the code may be revealed there.
    ChatBound,
    /// Used by a login. Terminal.
    Consumed,
    /// Past `expires_at` without being used. Terminal.
    Expired,
}

impl std::fmt::Display for VerificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationState::Issued => write!(f, "issued"),
            VerificationState::ChatBound => write!(f, "chat_bound"),
            VerificationState::Consumed => write!(f, "consumed"),
            VerificationState::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    pub id: i64,
    pub token: Uuid,
    pub phone_number: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub chat_id: Option<i64>,
}

impl VerificationRecord {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && now <= self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> VerificationState {
        if self.is_used {
            VerificationState::Consumed
        } else if now > self.expires_at {
            VerificationState::Expired
        } else if self.chat_id.is_some() {
            VerificationState::ChatBound
        } else {
            VerificationState::Issued
        }
    }

    /// Start command. A record that is already bound is re-bound to the new
    /// chat: the last `/start` wins.
    pub fn bind_chat(
        &mut self,
        chat_id: i64,
        now: DateTime<Utc>,
    ) -> Result<VerificationState, VerificationError> {
        match self.state_at(now) {
            VerificationState::Issued | VerificationState::ChatBound => {
                self.chat_id = Some(chat_id);
                Ok(VerificationState::ChatBound)
            }
            VerificationState::Consumed | VerificationState::Expired => {
                Err(VerificationError::ExpiredOrUsedToken)
            }
        }
    }

    /// Contact share. Returns the code only for a bound, live record whose
    /// phone number equals the shared one.
    pub fn reveal_code(
        &self,
        shared_phone: &str,
        now: DateTime<Utc>,
    ) -> Result<&str, VerificationError> {
        if self.phone_number != shared_phone {
            return Err(VerificationError::PhoneMismatch);
        }
        match self.state_at(now) {
            VerificationState::ChatBound => Ok(&self.code),
            VerificationState::Consumed | VerificationState::Expired => {
                Err(VerificationError::ExpiredOrUsedToken)
            }
            from @ VerificationState::Issued => Err(VerificationError::IllegalTransition {
                from,
                action: "reveal the code of",
            }),
        }
    }

    /// Login precondition. The persisted flip happens in the store so that
    /// only one caller can win.
    pub fn ensure_consumable(&self, now: DateTime<Utc>) -> Result<(), VerificationError> {
        match self.state_at(now) {
            VerificationState::Issued | VerificationState::ChatBound => Ok(()),
            VerificationState::Consumed | VerificationState::Expired => {
                Err(VerificationError::InvalidOrExpiredCode)
            }
        }
    }
}

impl From<verification_entity::Model> for VerificationRecord {
    fn from(m: verification_entity::Model) -> Self {
        Self {
            id: m.id,
            token: m.token,
            phone_number: m.phone_number,
            code: m.code,
            created_at: m.created_at,
            expires_at: m.expires_at,
            is_used: m.is_used,
            chat_id: m.chat_id,
        }
    }
}

/// A record about to be inserted.
#[derive(Debug, Clone)]
pub struct NewVerification {
    pub token: Uuid,
    pub phone_number: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewVerification {
    pub fn issue(phone_number: &str, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::new_v4(),
            phone_number: phone_number.to_string(),
            code: generate_six_digit_code(),
            created_at: now,
            expires_at: now + ttl,
        }
    }
}
