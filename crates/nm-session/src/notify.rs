use nm_api_types::{Notice, NoticeLevel};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Fire-and-forget user notices. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.notify(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }

    fn alert(&self, message: &str) {
        self.notify(NoticeLevel::Alert, message);
    }
}

/// Writes notices to the log and nowhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => info!(?level, "{message}"),
            NoticeLevel::Error | NoticeLevel::Alert => warn!(?level, "{message}"),
        }
    }
}

pub const DEFAULT_NOTICE_CAPACITY: usize = 128;

struct LogInner {
    next_seq: u64,
    entries: VecDeque<Notice>,
}

/// Bounded buffer of recent notices, numbered so pollers can ask for
/// everything after the last one they saw. Oldest entries are dropped first.
pub struct NoticeLog {
    capacity: usize,
    inner: Mutex<LogInner>,
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_CAPACITY)
    }
}

impl NoticeLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(LogInner {
                next_seq: 1,
                entries: VecDeque::new(),
            }),
        }
    }

    pub fn since(&self, after: u64) -> Vec<Notice> {
        self.lock()
            .entries
            .iter()
            .filter(|notice| notice.seq > after)
            .cloned()
            .collect()
    }

    /// Sequence number of the newest notice, 0 when nothing was posted yet.
    pub fn last_seq(&self) -> u64 {
        self.lock().next_seq - 1
    }

    pub fn messages(&self) -> Vec<(NoticeLevel, String)> {
        self.lock()
            .entries
            .iter()
            .map(|notice| (notice.level, notice.message.clone()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, level: NoticeLevel, message: &str) {
        TracingNotifier.notify(level, message);

        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        if inner.entries.len() == self.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(Notice {
            seq,
            level,
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pollers_only_see_newer_notices() {
        let log = NoticeLog::default();
        assert_eq!(log.last_seq(), 0);

        log.info("Minting...");
        log.success("Domain minted");
        log.alert("Transaction failed! Please try again");

        let newer = log.since(1);
        assert_eq!(newer.len(), 2);
        assert_eq!(newer[0].seq, 2);
        assert_eq!(newer[1].level, NoticeLevel::Alert);
        assert_eq!(log.last_seq(), 3);
        assert!(log.since(3).is_empty());
    }

    #[test]
    fn oldest_notices_fall_off() {
        let log = NoticeLog::new(2);
        log.info("one");
        log.info("two");
        log.info("three");

        let kept: Vec<_> = log.since(0).into_iter().map(|n| n.message).collect();
        assert_eq!(kept, vec!["two", "three"]);
        assert_eq!(log.last_seq(), 3);
    }
}
