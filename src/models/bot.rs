use crate::error::VerificationError;

/// What the bot says back to a chat after handling an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotReply {
    /// Chat is bound; ask the user to share the phone number.
    RequestPhone,
    /// Contact matched; disclose the one-time code.
    RevealCode(String),
    Rejected(VerificationError),
}

impl BotReply {
    pub fn text(&self) -> String {
        match self {
            BotReply::RequestPhone => "Hello! Please share your phone number.".to_string(),
            BotReply::RevealCode(code) => format!(
                "✅ Your verification code: <b>{code}</b>\n\nPlease enter it on the website."
            ),
            BotReply::Rejected(err) => match err {
                VerificationError::MissingStartToken => {
                    "Please register through the website to use this bot.".to_string()
                }
                VerificationError::InvalidToken => "❌ Invalid link.".to_string(),
                VerificationError::ExpiredOrUsedToken => {
                    "⏰ This link has expired or was already used.".to_string()
                }
                VerificationError::NoPendingVerification => {
                    "❌ No verification request was found for you.".to_string()
                }
                VerificationError::PhoneMismatch => {
                    "❌ The phone number does not match.".to_string()
                }
                VerificationError::ForeignContact => {
                    "❌ Please share your own phone number using the button.".to_string()
                }
                VerificationError::InvalidOrExpiredCode
                | VerificationError::IllegalTransition { .. } => {
                    "❌ Something went wrong, please start again from the website.".to_string()
                }
            },
        }
    }

    /// Replies that expect the user to press the share-contact button next.
    pub fn requests_contact(&self) -> bool {
        matches!(self, BotReply::RequestPhone)
    }

    pub fn is_html(&self) -> bool {
        matches!(self, BotReply::RevealCode(_))
    }
}
