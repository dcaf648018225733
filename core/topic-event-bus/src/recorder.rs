//! Raise recording for debugging and tooling

use crate::dispatch::RaiseReport;
use crate::topic::TopicPath;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// One recorded raise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaiseRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub topic: TopicPath,
    /// Callbacks attempted
    pub invoked: usize,
    /// Callbacks that returned an error or panicked
    pub failed: usize,
}

impl RaiseRecord {
    pub fn from_report(report: &RaiseReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            topic: report.topic.clone(),
            invoked: report.invoked,
            failed: report.failures.len(),
        }
    }
}

/// Keeps the most recent raises, oldest dropped first
pub struct RaiseRecorder {
    records: Mutex<VecDeque<RaiseRecord>>,
    capacity: usize,
}

impl RaiseRecorder {
    /// Create new recorder with given capacity (at least one record)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, record: RaiseRecord) {
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// All records, oldest first
    pub fn records(&self) -> Vec<RaiseRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Records raised on `topic` or any topic below it
    pub fn records_under(&self, topic: &str) -> Vec<RaiseRecord> {
        let topic = TopicPath::parse(topic);
        self.records
            .lock()
            .iter()
            .filter(|r| r.topic == topic || topic.is_ancestor_of(&r.topic))
            .cloned()
            .collect()
    }

    /// Records with `start <= timestamp <= end`
    pub fn records_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<RaiseRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.timestamp >= start && r.timestamp <= end)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(topic: &str, invoked: usize) -> RaiseReport {
        RaiseReport {
            invoked,
            ..RaiseReport::new(TopicPath::parse(topic))
        }
    }

    #[test]
    fn test_record_and_retrieve() {
        let recorder = RaiseRecorder::new(8);
        let record = RaiseRecord::from_report(&report("/combat/hit", 2));
        recorder.record(record.clone());

        let records = recorder.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, record.id);
        assert_eq!(records[0].invoked, 2);
        assert_eq!(records[0].failed, 0);
    }

    #[test]
    fn test_circular_buffer() {
        let recorder = RaiseRecorder::new(2);
        for topic in ["/a", "/b", "/c", "/d", "/e"] {
            recorder.record(RaiseRecord::from_report(&report(topic, 0)));
        }

        let topics: Vec<String> = recorder.records().into_iter().map(|r| r.topic.into()).collect();
        assert_eq!(topics, vec!["/d", "/e"]); // Only keeps last 2
    }

    #[test]
    fn test_records_under_topic() {
        let recorder = RaiseRecorder::new(8);
        for topic in ["/combat/hit", "/combat", "/ui/click", "/combatant"] {
            recorder.record(RaiseRecord::from_report(&report(topic, 0)));
        }

        assert_eq!(recorder.records_under("/combat").len(), 2);
        assert_eq!(recorder.records_under("/").len(), 4);
    }

    #[test]
    fn test_range_and_clear() {
        let recorder = RaiseRecorder::new(4);
        let start = Utc::now();
        recorder.record(RaiseRecord::from_report(&report("/a", 0)));
        let end = Utc::now();

        assert_eq!(recorder.records_in_range(start, end).len(), 1);
        let later = end + chrono::Duration::seconds(1);
        assert!(recorder.records_in_range(later, later).is_empty());

        recorder.clear();
        assert!(recorder.is_empty());
        assert_eq!(recorder.capacity(), 4);
    }
}
