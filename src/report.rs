// Copyright 2026 hogp contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Input report buffers and the outbound report queue.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// One HID input or output report.
///
/// The byte layout depends on the device variant: 4 bytes for a relative
/// mouse, 6 for an absolute mouse, 5 for a joystick, 8 for a keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report(Vec<u8>);

impl Report {
    /// Create a report from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Report payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length payload.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[u8; N]> for Report {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&[u8]> for Report {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// FIFO queue of pending input reports.
///
/// Producers are input-event handlers and must never block, so the queue is
/// unbounded; the scheduler drains at most one element per tick, which bounds
/// work per tick and lets a backlog drain over subsequent ticks. If producers
/// outpace the scheduler the queue grows without limit - an accepted
/// limitation, reports are never silently dropped.
#[derive(Debug, Default)]
pub struct ReportQueue {
    inner: Mutex<VecDeque<Report>>,
}

impl ReportQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a report to the tail. Empty reports are ignored.
    pub fn push(&self, report: Report) {
        if report.is_empty() {
            return;
        }
        self.inner.lock().push_back(report);
    }

    /// Pop the head report, if any. Called once per scheduler tick.
    pub fn drain_one(&self) -> Option<Report> {
        self.inner.lock().pop_front()
    }

    /// Number of queued reports.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when no reports are queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let queue = ReportQueue::new();
        for i in 1u8..=5 {
            queue.push(Report::from([i, 0, 0, 0]));
        }
        for i in 1u8..=5 {
            assert_eq!(queue.drain_one(), Some(Report::from([i, 0, 0, 0])));
        }
        assert_eq!(queue.drain_one(), None);
    }

    #[test]
    fn test_empty_reports_dropped() {
        let queue = ReportQueue::new();
        queue.push(Report::new(Vec::new()));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_on_empty_queue() {
        let queue = ReportQueue::new();
        assert_eq!(queue.drain_one(), None);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_concurrent_producers_keep_per_producer_order() {
        let queue = Arc::new(ReportQueue::new());
        let mut handles = Vec::new();

        for producer in 0u8..4 {
            let queue = queue.clone();
            handles.push(std::thread::spawn(move || {
                for seq in 0u8..50 {
                    queue.push(Report::from([producer, seq]));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 200);
        let mut last_seq = [None::<u8>; 4];
        while let Some(report) = queue.drain_one() {
            let bytes = report.as_bytes();
            let (producer, seq) = (bytes[0] as usize, bytes[1]);
            if let Some(prev) = last_seq[producer] {
                assert!(seq > prev, "producer {producer} order broken");
            }
            last_seq[producer] = Some(seq);
        }
        for prev in last_seq {
            assert_eq!(prev, Some(49));
        }
    }
}
