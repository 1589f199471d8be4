//! In-memory log of received events

use std::collections::VecDeque;

use serde_json::Value;

use nbridge_core::{Event, RecordShape};

/// Ordered, append-only sequence of events.
///
/// Unbounded unless `max_entries` is set, in which case the oldest entry is
/// evicted on overflow. Entries are never mutated after insertion.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: VecDeque<Event>,
    max_entries: Option<usize>,
}

impl EventLog {
    /// Create a log. A bound of zero is treated as unbounded.
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.filter(|n| *n > 0),
        }
    }

    pub fn push(&mut self, event: Event) {
        if let Some(max) = self.max_entries {
            while self.entries.len() >= max {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Point-in-time copy of the entries
    pub fn snapshot(&self) -> Vec<Event> {
        self.entries.iter().cloned().collect()
    }

    /// Entries rendered as records of the given shape
    pub fn records(&self, shape: RecordShape) -> Value {
        Value::Array(self.entries.iter().map(|e| e.to_record(shape)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbridge_core::SmsEvent;
    use serde_json::json;

    fn sms(n: i64) -> Event {
        Event::MessageReceived(SmsEvent {
            from: "+1".into(),
            message: format!("m{}", n),
            timestamp: n,
            service_center_address: None,
        })
    }

    #[test]
    fn test_unbounded_log_keeps_everything_in_order() {
        let mut log = EventLog::default();
        for n in 0..5 {
            log.push(sms(n));
        }
        assert_eq!(log.len(), 5);
        assert_eq!(log.snapshot()[0], sms(0));
        assert_eq!(log.snapshot()[4], sms(4));
    }

    #[test]
    fn test_bounded_log_evicts_oldest() {
        let mut log = EventLog::new(Some(2));
        log.push(sms(1));
        log.push(sms(2));
        log.push(sms(3));
        assert_eq!(log.snapshot(), vec![sms(2), sms(3)]);
    }

    #[test]
    fn test_zero_bound_is_unbounded() {
        let mut log = EventLog::new(Some(0));
        log.push(sms(1));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut log = EventLog::default();
        log.push(sms(1));
        let snapshot = log.snapshot();
        log.push(sms(2));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_records_shapes() {
        let mut log = EventLog::default();
        log.push(sms(7));

        assert_eq!(
            log.records(RecordShape::Map),
            json!([{"from": "+1", "message": "m7", "timestamp": "7"}])
        );
        assert_eq!(
            log.records(RecordShape::String),
            json!(["{from=+1, message=m7, timestamp=7}"])
        );
    }
}
