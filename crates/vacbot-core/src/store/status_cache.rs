// ── Last-known robot status ──

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use vacbot_api::RobotStatus;

/// Most recent successfully read status. Lock-free reads and swaps.
#[derive(Default)]
pub struct StatusCache {
    last: ArcSwapOption<RobotStatus>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, status: RobotStatus) {
        self.last.store(Some(Arc::new(status)));
    }

    pub fn get(&self) -> Option<RobotStatus> {
        self.last.load_full().map(|s| (*s).clone())
    }

    /// Last known status, or the synthetic default, marked offline.
    pub fn fallback(&self) -> RobotStatus {
        self.get()
            .unwrap_or_else(RobotStatus::synthetic)
            .offline()
    }
}
