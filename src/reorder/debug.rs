use itertools::Itertools as _;

use crate::store::BookmarkStore;
use crate::tree::integrity_issues;

use super::ReorderEngine;

impl<S: BookmarkStore> ReorderEngine<S> {
    pub(super) fn debug_log_event(&mut self, message: impl Into<String>) {
        if !self.options.debug_event_log {
            return;
        }
        self.push_debug_log_line(message.into());
    }

    fn push_debug_log_line(&mut self, message: String) {
        let cap = self.options.debug_event_log_capacity.clamp(1, 10_000);
        while self.debug_log.len() >= cap {
            self.debug_log.pop_front();
        }
        self.debug_log
            .push_back(format!("[event {}] {}", self.debug_event, message));
    }

    /// Recorded engine events, oldest first, one per line.
    pub fn debug_log_text(&self) -> String {
        self.debug_log.iter().join("\n")
    }

    pub fn debug_log_clear(&mut self) {
        self.debug_log.clear();
    }

    /// Event number of every recorded line, in order.
    #[cfg(test)]
    pub(super) fn debug_log_event_numbers(&self) -> Vec<u64> {
        self.debug_log
            .iter()
            .filter_map(|line| line.strip_prefix("[event ")?.split(']').next()?.parse().ok())
            .collect()
    }

    /// Log structural problems in a freshly received snapshot.
    pub(super) fn debug_check_integrity(&mut self) {
        if !self.options.debug_event_log {
            return;
        }
        let issues = integrity_issues(self.model.snapshot());
        if issues.is_empty() {
            return;
        }
        for issue in &issues {
            log::warn!("{issue}");
        }
        self.debug_log_event(format!(
            "snapshot revision={} has {} integrity issue(s)",
            self.model.revision(),
            issues.len()
        ));
    }
}
