//! Integration tests for the report delivery pipeline.
//!
//! Exercises the queue, registry, scheduler and encoders together, using a
//! recording notifier in place of the BlueZ-backed one.

use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;

use hogp::bluetooth::{ConnectionRegistry, LinkEvent, Notifier, Scheduler};
use hogp::hid::keyboard;
use hogp::hid::mouse::MouseEncoder;
use hogp::report::{Report, ReportQueue};

const CENTRAL: &str = "AA:BB:CC:DD:EE:FF";

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, Vec<u8>)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, address: &str, value: &[u8]) -> Result<()> {
        self.sent.lock().push((address.to_owned(), value.to_vec()));
        Ok(())
    }
}

fn pipeline() -> (
    Arc<ReportQueue>,
    Arc<ConnectionRegistry>,
    Arc<RecordingNotifier>,
    Scheduler,
) {
    let queue = Arc::new(ReportQueue::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = Scheduler::new(queue.clone(), registry.clone(), notifier.clone());
    (queue, registry, notifier, scheduler)
}

#[test]
fn test_one_tick_delivers_one_report() {
    let (queue, registry, notifier, scheduler) = pipeline();
    registry.handle_event(LinkEvent::Connected {
        address: CENTRAL.to_owned(),
        bonded: true,
    });

    for i in 1u8..=3 {
        queue.push(Report::from([i, 0, 0, 0]));
    }

    assert_eq!(scheduler.tick(), 1);
    assert_eq!(queue.len(), 2);
    assert_eq!(notifier.sent.lock().len(), 1);
}

#[test]
fn test_three_ticks_drain_the_queue_in_push_order() {
    let (queue, registry, notifier, scheduler) = pipeline();
    registry.handle_event(LinkEvent::Connected {
        address: CENTRAL.to_owned(),
        bonded: true,
    });

    for i in 1u8..=3 {
        queue.push(Report::from([i, 0, 0, 0]));
    }
    for _ in 0..3 {
        scheduler.tick();
    }

    assert!(queue.is_empty());
    let sent = notifier.sent.lock();
    assert_eq!(sent.len(), 3);
    for (i, (address, value)) in sent.iter().enumerate() {
        assert_eq!(address, CENTRAL);
        assert_eq!(value, &[i as u8 + 1, 0, 0, 0]);
    }
}

#[test]
fn test_unbonded_central_receives_nothing() {
    let (queue, registry, notifier, scheduler) = pipeline();
    registry.handle_event(LinkEvent::Connected {
        address: CENTRAL.to_owned(),
        bonded: false,
    });

    queue.push(Report::from([1, 0, 0, 0]));
    scheduler.tick();
    assert!(notifier.sent.lock().is_empty());

    // Reports start flowing once the bond lands.
    registry.handle_event(LinkEvent::BondEstablished {
        address: CENTRAL.to_owned(),
    });
    queue.push(Report::from([2, 0, 0, 0]));
    scheduler.tick();
    assert_eq!(notifier.sent.lock().len(), 1);
}

#[test]
fn test_disconnect_stops_delivery_until_reconnect() {
    let (queue, registry, notifier, scheduler) = pipeline();
    registry.handle_event(LinkEvent::Connected {
        address: CENTRAL.to_owned(),
        bonded: true,
    });
    registry.handle_event(LinkEvent::Disconnected {
        address: CENTRAL.to_owned(),
    });

    queue.push(Report::from([1, 0, 0, 0]));
    scheduler.tick();
    assert!(notifier.sent.lock().is_empty());

    registry.handle_event(LinkEvent::Connected {
        address: CENTRAL.to_owned(),
        bonded: true,
    });
    queue.push(Report::from([2, 0, 0, 0]));
    scheduler.tick();
    assert_eq!(notifier.sent.lock().len(), 1);
}

#[test]
fn test_mouse_encoder_through_the_pipeline() {
    let (queue, registry, notifier, scheduler) = pipeline();
    registry.handle_event(LinkEvent::Connected {
        address: CENTRAL.to_owned(),
        bonded: true,
    });

    let mut encoder = MouseEncoder::default();
    // Movement, idle, idle again: the second idle report is suppressed.
    for (dx, dy) in [(5, 0), (0, 0), (0, 0)] {
        if let Some(report) = encoder.encode(dx, dy, 0, false, false, false) {
            queue.push(Report::from(report));
        }
    }
    assert_eq!(queue.len(), 2);

    while scheduler.tick() > 0 {}
    let sent = notifier.sent.lock();
    assert_eq!(sent[0].1, vec![0, 5, 0, 0]);
    assert_eq!(sent[1].1, vec![0, 0, 0, 0]);
}

#[test]
fn test_keyboard_text_through_the_pipeline() {
    let (queue, registry, notifier, scheduler) = pipeline();
    registry.handle_event(LinkEvent::Connected {
        address: CENTRAL.to_owned(),
        bonded: true,
    });

    for report in keyboard::encode_text("Hi") {
        queue.push(Report::from(report));
    }
    while scheduler.tick() > 0 {}

    let sent = notifier.sent.lock();
    let values: Vec<_> = sent.iter().map(|(_, v)| v.clone()).collect();
    assert_eq!(
        values,
        vec![
            vec![keyboard::MODIFIER_KEY_SHIFT, 0, 0x0B, 0, 0, 0, 0, 0],
            vec![0, 0, 0x0C, 0, 0, 0, 0, 0],
            keyboard::EMPTY_REPORT.to_vec(),
        ]
    );
}
