//! Most recent raider
//!
//! Single slot, last writer wins. Owned by the bot loop and lent to the
//! dispatcher when a command needs a default target.

use tracing::info;

use crate::models::RaidNotice;

#[derive(Debug, Clone, Default)]
pub struct RaidTracker {
    last_raider: String,
}

impl RaidTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored raider
    pub fn on_raid(&mut self, raider_login: impl Into<String>) {
        self.last_raider = raider_login.into();
    }

    /// Record a raid notice from chat
    pub fn record(&mut self, notice: &RaidNotice) {
        info!(
            raider = %notice.login,
            display_name = %notice.display_name,
            viewers = notice.viewer_count,
            "raided"
        );
        self.on_raid(notice.login.clone());
    }

    /// Login of the last raider, or `""` before the first raid
    pub fn current_raider(&self) -> &str {
        &self.last_raider
    }
}
