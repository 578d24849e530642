//! Sinks notified after every resolution attempt.
//!
//! The server passes one in; the resolution engine never reaches for a
//! global log.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

/// How a resolution attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOutcome {
    Ok,
    NoEndpoint,
    NoRule,
    Error,
}

impl ResponseOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseOutcome::Ok => "ok",
            ResponseOutcome::NoEndpoint => "no_endpoint",
            ResponseOutcome::NoRule => "no_rule",
            ResponseOutcome::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseRecord {
    pub timestamp: DateTime<Utc>,
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query_string: String,
    pub outcome: ResponseOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub trait ResponseObserver: Send + Sync {
    fn record(&self, record: ResponseRecord);
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl ResponseObserver for NoOpObserver {
    fn record(&self, _record: ResponseRecord) {}
}

/// Keeps the most recent records, oldest first.
#[derive(Debug)]
pub struct ResponseLog {
    entries: Mutex<VecDeque<ResponseRecord>>,
    capacity: usize,
}

impl ResponseLog {
    /// A capacity of zero keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn entries(&self) -> Vec<ResponseRecord> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl ResponseObserver for ResponseLog {
    fn record(&self, record: ResponseRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
    }
}
