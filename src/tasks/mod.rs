//! Background jobs launched once at startup.

use crate::external::{TelegramClient, Update};
use crate::handlers::BotDispatcher;
use std::time::Duration;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Offset that acknowledges every update in the batch.
pub fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map_or(current, |next| next.max(current))
}

/// Long-polls the Bot API and handles updates one at a time in delivery order.
pub fn spawn_telegram_poller(client: TelegramClient, dispatcher: BotDispatcher, timeout_secs: u64) {
    tokio::spawn(async move {
        log::info!("Telegram poller started");
        let mut offset = 0;
        loop {
            let updates = match client.get_updates(offset, timeout_secs).await {
                Ok(updates) => updates,
                Err(e) => {
                    log::error!("Failed to fetch Telegram updates: {e}");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for update in &updates {
                if let Err(e) = dispatcher.dispatch(update).await {
                    log::error!("Failed to handle Telegram update {}: {e}", update.update_id);
                }
            }
            offset = next_offset(offset, &updates);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: i64) -> Update {
        Update {
            update_id: id,
            message: None,
        }
    }

    #[test]
    fn test_next_offset() {
        assert_eq!(next_offset(0, &[]), 0);
        assert_eq!(next_offset(0, &[update(10), update(11)]), 12);
        assert_eq!(next_offset(50, &[update(7)]), 50);
    }
}
