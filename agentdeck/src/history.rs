//! Bounded log buffer kept by the application.

use std::collections::VecDeque;

use crate::types::LogRecord;
use crate::ui::controls::LevelFilter;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    while dq.len() >= cap.max(1) {
        dq.pop_front();
    }
    dq.push_back(v);
}

// Append-only, most recent last; oldest lines drop off past `cap`.
#[derive(Debug, Default)]
pub struct LogHistory {
    records: VecDeque<LogRecord>,
    cap: usize,
}

impl LogHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Shrinking the cap drops the oldest records right away.
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap.max(1);
        while self.records.len() > self.cap {
            self.records.pop_front();
        }
    }

    pub fn extend<I: IntoIterator<Item = LogRecord>>(&mut self, records: I) {
        for r in records {
            push_capped(&mut self.records, r, self.cap);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn filtered(&self, filter: LevelFilter) -> Vec<&LogRecord> {
        self.records
            .iter()
            .filter(|r| filter.admits(r.level))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogLevel;

    fn rec(i: usize, level: LogLevel) -> LogRecord {
        LogRecord {
            timestamp: format!("t{i}"),
            level,
            message: format!("m{i}"),
        }
    }

    #[test]
    fn push_capped_evicts_oldest() {
        let mut dq = VecDeque::new();
        for i in 0..5 {
            push_capped(&mut dq, i, 3);
        }
        assert_eq!(dq.into_iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn shrinking_cap_trims_front() {
        let mut h = LogHistory::new(10);
        h.extend((0..8).map(|i| rec(i, LogLevel::Info)));
        h.set_cap(3);
        let kept: Vec<_> = h.filtered(LevelFilter::All).iter().map(|r| r.message.clone()).collect();
        assert_eq!(kept, vec!["m5", "m6", "m7"]);
    }

    #[test]
    fn filter_by_level_keeps_order() {
        let mut h = LogHistory::new(10);
        h.extend([
            rec(0, LogLevel::Info),
            rec(1, LogLevel::Error),
            rec(2, LogLevel::Info),
            rec(3, LogLevel::Error),
        ]);
        let errs: Vec<_> = h
            .filtered(LevelFilter::Only(LogLevel::Error))
            .iter()
            .map(|r| r.timestamp.clone())
            .collect();
        assert_eq!(errs, vec!["t1", "t3"]);
        h.clear();
        assert!(h.is_empty());
    }
}
