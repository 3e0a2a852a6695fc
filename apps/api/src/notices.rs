//! User-facing notices.
//!
//! Every stage failure is routed through a `Notifier` before the stage degrades
//! or propagates. With `LOG_LEVEL=off` nothing is recorded; with `on` each notice
//! is emitted through `tracing` and collected so the HTTP layer can return it
//! alongside the wizard response.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Gate for user-facing notices. Anything other than `on` is treated as `off`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Off,
    On,
}

impl LogLevel {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("on") {
            LogLevel::On
        } else {
            LogLevel::Off
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Request-scoped notice collector. Cheap to clone; clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    level: LogLevel,
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl Notifier {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            notices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(NoticeLevel::Info, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(NoticeLevel::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(NoticeLevel::Error, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(NoticeLevel::Success, message.into());
    }

    /// Takes every notice recorded so far, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut notices) => std::mem::take(&mut *notices),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn emit(&self, level: NoticeLevel, message: String) {
        if self.level == LogLevel::Off {
            return;
        }

        match level {
            NoticeLevel::Info | NoticeLevel::Success => info!("{message}"),
            NoticeLevel::Warning => warn!("{message}"),
            NoticeLevel::Error => error!("{message}"),
        }

        if let Ok(mut notices) = self.notices.lock() {
            notices.push(Notice { level, message });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("on"), LogLevel::On);
        assert_eq!(LogLevel::parse(" ON "), LogLevel::On);
        assert_eq!(LogLevel::parse("off"), LogLevel::Off);
        assert_eq!(LogLevel::parse("verbose"), LogLevel::Off);
        assert_eq!(LogLevel::parse(""), LogLevel::Off);
    }

    #[test]
    fn test_off_suppresses_everything() {
        let notifier = Notifier::new(LogLevel::Off);
        notifier.error("boom");
        notifier.success("done");
        assert!(notifier.drain().is_empty());
    }

    #[test]
    fn test_on_records_in_order_and_drain_empties() {
        let notifier = Notifier::new(LogLevel::On);
        notifier.warning("slow down");
        notifier.error("boom");

        let clone = notifier.clone();
        clone.success("recovered");

        let notices = notifier.drain();
        assert_eq!(notices.len(), 3);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notices[1].message, "boom");
        assert_eq!(notices[2].level, NoticeLevel::Success);
        assert!(notifier.drain().is_empty());
    }
}
