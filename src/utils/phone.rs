use crate::error::{AppError, AppResult};

pub const PHONE_MAX_LEN: usize = 20;

/// Registration only constrains length, any non-empty string up to 20 chars is accepted.
pub fn validate_phone(phone: &str) -> AppResult<()> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(AppError::ValidationError(
            "phone_number may not be blank".to_string(),
        ));
    }
    if phone.chars().count() > PHONE_MAX_LEN {
        return Err(AppError::ValidationError(format!(
            "phone_number must be at most {PHONE_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Chat clients report contacts without the leading `+`.
pub fn normalize_phone(phone: &str) -> String {
    let phone = phone.trim();
    if phone.starts_with('+') {
        phone.to_string()
    } else {
        format!("+{phone}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+998901234567").is_ok());
        assert!(validate_phone("998901234567").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("   ").is_err());
        assert!(validate_phone("+1234567890123456789012").is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("998901234567"), "+998901234567");
        assert_eq!(normalize_phone("+998901234567"), "+998901234567");
        assert_eq!(normalize_phone(" 998901234567 "), "+998901234567");
    }
}
