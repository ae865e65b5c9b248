use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

/// How inbound chat events reach the bot handler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
    Disabled,
}

impl std::str::FromStr for BotMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "polling" => Ok(BotMode::Polling),
            "webhook" => Ok(BotMode::Webhook),
            "disabled" | "off" => Ok(BotMode::Disabled),
            other => Err(format!("unknown bot mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub bot_username: String,
    #[serde(default = "default_deep_link_base")]
    pub deep_link_base: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub mode: BotMode,
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Opt-in: reject shared contacts whose owner is not the sender.
    #[serde(default)]
    pub require_own_contact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    pub ttl_minutes: i64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { ttl_minutes: 10 }
    }
}

fn default_deep_link_base() -> String {
    "https://t.me".to_string()
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // A missing file means everything comes from the environment.
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("Failed to parse config file: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 300i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            86_400i64,
                        ),
                    },
                    telegram: TelegramConfig {
                        bot_token: get_env("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
                        bot_username: get_env("TELEGRAM_BOT_USERNAME")
                            .unwrap_or_else(|| "scommerce_bot".to_string()),
                        deep_link_base: get_env("TELEGRAM_DEEP_LINK_BASE")
                            .unwrap_or_else(default_deep_link_base),
                        api_base: get_env("TELEGRAM_API_BASE").unwrap_or_else(default_api_base),
                        mode: get_env_parse("TELEGRAM_BOT_MODE", BotMode::Polling),
                        webhook_secret: get_env("TELEGRAM_WEBHOOK_SECRET"),
                        poll_timeout_secs: get_env_parse("TELEGRAM_POLL_TIMEOUT", 30u64),
                        require_own_contact: get_env_parse("TELEGRAM_REQUIRE_OWN_CONTACT", false),
                    },
                    verification: VerificationConfig {
                        ttl_minutes: get_env_parse("VERIFICATION_TTL_MINUTES", 10i64),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        // Environment always wins over the file.
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("TELEGRAM_BOT_TOKEN") {
            config.telegram.bot_token = v;
        }
        if let Ok(v) = env::var("TELEGRAM_BOT_USERNAME") {
            config.telegram.bot_username = v;
        }
        if let Ok(v) = env::var("TELEGRAM_DEEP_LINK_BASE") {
            config.telegram.deep_link_base = v;
        }
        if let Ok(v) = env::var("TELEGRAM_API_BASE") {
            config.telegram.api_base = v;
        }
        if let Ok(v) = env::var("TELEGRAM_BOT_MODE")
            && let Ok(m) = v.parse()
        {
            config.telegram.mode = m;
        }
        if let Ok(v) = env::var("TELEGRAM_WEBHOOK_SECRET") {
            config.telegram.webhook_secret = Some(v);
        }
        if let Ok(v) = env::var("TELEGRAM_POLL_TIMEOUT")
            && let Ok(n) = v.parse()
        {
            config.telegram.poll_timeout_secs = n;
        }
        if let Ok(v) = env::var("TELEGRAM_REQUIRE_OWN_CONTACT")
            && let Ok(b) = v.parse()
        {
            config.telegram.require_own_contact = b;
        }
        if let Ok(v) = env::var("VERIFICATION_TTL_MINUTES")
            && let Ok(n) = v.parse()
        {
            config.verification.ttl_minutes = n;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/shop"
            max_connections = 5

            [jwt]
            secret = "s"
            access_token_expires_in = 60
            refresh_token_expires_in = 120

            [telegram]
            bot_token = "123:abc"
            bot_username = "shop_bot"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.telegram.deep_link_base, "https://t.me");
        assert_eq!(config.telegram.mode, BotMode::Polling);
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert!(!config.telegram.require_own_contact);
        assert_eq!(config.verification.ttl_minutes, 10);
    }

    #[test]
    fn test_own_contact_check_is_opt_in() {
        let raw = r#"
            bot_token = "123:abc"
            bot_username = "shop_bot"
            require_own_contact = true
        "#;
        let telegram: TelegramConfig = toml::from_str(raw).unwrap();
        assert!(telegram.require_own_contact);
    }

    #[test]
    fn test_bot_mode_from_str() {
        assert_eq!("webhook".parse::<BotMode>().unwrap(), BotMode::Webhook);
        assert_eq!("OFF".parse::<BotMode>().unwrap(), BotMode::Disabled);
        assert!("push".parse::<BotMode>().is_err());
    }
}
