// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests of the bridge against an in-memory chat transport.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Local, TimeZone};
use inverter_bot::chat::{ChatTransport, InboundMessage, Update};
use inverter_bot::{Bridge, Notification, ProtocolError};
use parking_lot::Mutex;

const CHAT_ID: i64 = -100_200;

/// A message the bridge posted.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Sent {
    chat_id: i64,
    text: String,
    reply_to: Option<i64>,
}

#[derive(Debug, Default)]
struct Recorder {
    batches: Mutex<VecDeque<Vec<Update>>>,
    offsets: Mutex<Vec<i64>>,
    sent: Mutex<Vec<Sent>>,
    fail_sends: AtomicBool,
    fail_fetch: AtomicBool,
    slow_text: Mutex<Option<(String, std::time::Duration)>>,
}

/// Chat transport serving queued batches and recording sent messages.
#[derive(Debug, Clone, Default)]
struct FakeChat(Arc<Recorder>);

impl std::ops::Deref for FakeChat {
    type Target = Recorder;

    fn deref(&self) -> &Recorder {
        &self.0
    }
}

impl FakeChat {
    fn queue(&self, batch: Vec<Update>) {
        self.batches.lock().push_back(batch);
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    fn delay_text(&self, text: &str, delay: std::time::Duration) {
        *self.slow_text.lock() = Some((text.to_string(), delay));
    }

    fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|s| s.text.clone()).collect()
    }
}

impl ChatTransport for FakeChat {
    async fn fetch_updates(&self, offset: i64) -> Result<Vec<Update>, ProtocolError> {
        self.offsets.lock().push(offset);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ProtocolError::ConnectionFailed("unreachable".to_string()));
        }
        Ok(self.batches.lock().pop_front().unwrap_or_default())
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), ProtocolError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ProtocolError::ConnectionFailed("unreachable".to_string()));
        }
        let delay = self
            .slow_text
            .lock()
            .as_ref()
            .filter(|(slow, _)| slow == text)
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().push(Sent {
            chat_id,
            text: text.to_string(),
            reply_to,
        });
        Ok(())
    }
}

fn command(update_id: i64, message_id: i64, text: &str) -> Update {
    Update {
        id: update_id,
        message: Some(InboundMessage {
            message_id,
            chat_id: CHAT_ID,
            text: Some(text.to_string()),
        }),
    }
}

fn t0() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 10, 19, 8, 30, 0)
        .single()
        .unwrap()
}

fn payload(mode: &str) -> Vec<u8> {
    serde_json::json!({
        "Mode": mode,
        "BatteryCapacity": 42,
        "BatteryVoltage": 51.2,
        "BatteryDischargeCurrent": 3.1,
        "BatteryChargeCurrent": 1.0,
        "LoadPercentage": 9,
        "LoadWatt": 420,
        "GridVoltage": 0,
        "GridFrequency": 0,
        "OutputVoltage": 230.1,
        "OutputFrequency": 50
    })
    .to_string()
    .into_bytes()
}

fn setup() -> (FakeChat, Bridge<FakeChat>) {
    let chat = FakeChat::default();
    let bridge = Bridge::new(chat.clone(), CHAT_ID, Some("InverterBot".to_string()));
    (chat, bridge)
}

// ============================================================================
// Notifications
// ============================================================================

mod notifications {
    use super::*;

    #[tokio::test]
    async fn first_line_reading_only_announces_online() {
        let (chat, bridge) = setup();
        let ingestion = bridge.ingestion();

        let sent = ingestion
            .ingest_payload_at(&payload("Line"), t0())
            .await
            .unwrap();

        assert_eq!(sent, vec![Notification::Online]);
        assert_eq!(chat.texts(), vec!["Inverter Monitor Online"]);
        assert_eq!(chat.sent()[0].chat_id, CHAT_ID);
        assert_eq!(chat.sent()[0].reply_to, None);
    }

    #[tokio::test]
    async fn mode_change_is_announced_once() {
        let (chat, bridge) = setup();
        let ingestion = bridge.ingestion();

        for minute in 0..3 {
            ingestion
                .ingest_payload_at(&payload("Battery"), t0() + Duration::minutes(minute))
                .await
                .unwrap();
        }
        ingestion
            .ingest_payload_at(&payload("Line"), t0() + Duration::minutes(3))
            .await
            .unwrap();

        assert_eq!(
            chat.texts(),
            vec![
                "Inverter Status Change=Battery",
                "Inverter Monitor Online",
                "Inverter Status Change=Line",
            ]
        );
    }

    #[tokio::test]
    async fn offline_is_announced_once_after_silence() {
        let (chat, mut bridge) = setup();
        bridge
            .ingestion()
            .ingest_payload_at(&payload("Line"), t0())
            .await
            .unwrap();

        bridge.tick_at(t0() + Duration::minutes(5)).await;
        assert_eq!(chat.texts(), vec!["Inverter Monitor Online"]);

        bridge.tick_at(t0() + Duration::minutes(5) + Duration::seconds(1)).await;
        bridge.tick_at(t0() + Duration::minutes(10)).await;

        assert_eq!(
            chat.texts(),
            vec!["Inverter Monitor Online", "Inverter Monitor Offline"]
        );
        assert!(!bridge.store().snapshot().is_online());
    }

    #[tokio::test]
    async fn telemetry_after_offline_announces_online_again() {
        let (chat, mut bridge) = setup();
        let ingestion = bridge.ingestion();

        ingestion.ingest_payload_at(&payload("Line"), t0()).await.unwrap();
        bridge.tick_at(t0() + Duration::minutes(6)).await;
        ingestion
            .ingest_payload_at(&payload("Line"), t0() + Duration::minutes(7))
            .await
            .unwrap();

        assert_eq!(
            chat.texts(),
            vec![
                "Inverter Monitor Online",
                "Inverter Monitor Offline",
                "Inverter Monitor Online",
            ]
        );
    }

    #[tokio::test]
    async fn slow_offline_send_keeps_presence_order() {
        let (chat, mut bridge) = setup();
        let ingestion = bridge.ingestion();
        ingestion.ingest_payload_at(&payload("Line"), t0()).await.unwrap();
        chat.delay_text("Inverter Monitor Offline", std::time::Duration::from_millis(200));

        let tick = tokio::spawn(async move {
            bridge.tick_at(t0() + Duration::minutes(6)).await;
            bridge
        });
        // Let the tick decide Offline and start its slow send
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let emitted = ingestion
            .ingest_payload_at(&payload("Line"), t0() + Duration::minutes(6))
            .await
            .unwrap();
        let bridge = tick.await.unwrap();

        assert_eq!(emitted, vec![Notification::Online]);
        assert_eq!(
            chat.texts(),
            vec![
                "Inverter Monitor Online",
                "Inverter Monitor Offline",
                "Inverter Monitor Online",
            ]
        );
        assert!(bridge.store().snapshot().is_online());
    }

    #[tokio::test]
    async fn malformed_payload_is_ignored() {
        let (chat, bridge) = setup();
        let ingestion = bridge.ingestion();

        assert!(ingestion.ingest_payload_at(b"{not json", t0()).await.is_err());
        assert!(ingestion.ingest_payload_at(b"null", t0()).await.is_err());
        ingestion.handle_payload(b"\xff\xfe").await;

        assert!(chat.sent().is_empty());
        assert!(bridge.store().snapshot().current().is_none());
        assert!(!bridge.store().snapshot().is_online());
    }

    #[tokio::test]
    async fn failed_send_still_advances_state() {
        let (chat, mut bridge) = setup();
        chat.fail_sends.store(true, Ordering::SeqCst);

        let emitted = bridge
            .ingestion()
            .ingest_payload_at(&payload("Battery"), t0())
            .await
            .unwrap();
        assert_eq!(emitted.len(), 2);

        chat.fail_sends.store(false, Ordering::SeqCst);
        bridge
            .ingestion()
            .ingest_payload_at(&payload("Battery"), t0() + Duration::minutes(1))
            .await
            .unwrap();
        bridge.tick_at(t0() + Duration::minutes(2)).await;

        assert!(chat.sent().is_empty());
        assert!(bridge.store().snapshot().is_online());
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn unknown_replies_before_any_telemetry() {
        let (chat, mut bridge) = setup();
        chat.queue(vec![
            command(1, 11, "/battery"),
            command(2, 12, "/status"),
            command(3, 13, "/info"),
        ]);

        bridge.tick_at(t0()).await;

        assert_eq!(
            chat.sent(),
            vec![
                Sent {
                    chat_id: CHAT_ID,
                    text: "Unknown Battery Status".to_string(),
                    reply_to: Some(11),
                },
                Sent {
                    chat_id: CHAT_ID,
                    text: "Unknown Status".to_string(),
                    reply_to: Some(12),
                },
                Sent {
                    chat_id: CHAT_ID,
                    text: "Unknown Status".to_string(),
                    reply_to: Some(13),
                },
            ]
        );
    }

    #[tokio::test]
    async fn replies_reflect_latest_status() {
        let (chat, mut bridge) = setup();
        bridge
            .ingestion()
            .ingest_payload_at(&payload("Battery"), t0())
            .await
            .unwrap();
        chat.queue(vec![
            command(1, 11, "/BATTERY@inverterbot"),
            command(2, 12, "/status"),
            command(3, 13, "/info"),
        ]);

        bridge.tick_at(t0() + Duration::seconds(1)).await;

        let texts = chat.texts();
        assert_eq!(texts.len(), 5);
        assert_eq!(texts[2], "Battery is 42% at 2026-10-19 08:30:00");
        assert_eq!(texts[3], "Online status Battery at 2026-10-19 08:30:00");
        assert_eq!(
            texts[4],
            "Status at 2026-10-19 08:30:00\n\
             Online status: Battery\n\
             Load: 9% 420W\n\
             AC Input: 0V 0Hz\n\
             Output: 230.1V 50Hz\n\
             Battery: 42% 51.2V (Discharging: 3.1A)"
        );
    }

    #[tokio::test]
    async fn info_on_line_reports_charge_current() {
        let (chat, mut bridge) = setup();
        bridge
            .ingestion()
            .ingest_payload_at(&payload("Line"), t0())
            .await
            .unwrap();
        chat.queue(vec![command(1, 11, "/info")]);

        bridge.tick_at(t0()).await;

        let reply = chat.texts().pop().unwrap();
        assert!(reply.ends_with("Battery: 42% 51.2V (Charging: 1A)"));
    }

    #[tokio::test]
    async fn other_messages_are_ignored_but_consumed() {
        let (chat, mut bridge) = setup();
        chat.queue(vec![
            command(5, 1, "hello"),
            command(6, 2, "/battery@SomeOtherBot"),
            command(7, 3, "/reboot"),
            Update {
                id: 8,
                message: None,
            },
        ]);

        bridge.tick_at(t0()).await;

        assert!(chat.sent().is_empty());
        assert_eq!(bridge.dispatcher().cursor(), 9);
    }

    #[tokio::test]
    async fn commands_are_not_dispatched_twice() {
        let (chat, mut bridge) = setup();
        chat.queue(vec![command(20, 1, "/status")]);
        chat.queue(vec![command(20, 1, "/status"), command(21, 2, "/battery")]);

        bridge.tick_at(t0()).await;
        bridge.tick_at(t0()).await;
        bridge.tick_at(t0()).await;

        assert_eq!(
            chat.texts(),
            vec!["Unknown Status", "Unknown Battery Status"]
        );
        assert_eq!(*chat.offsets.lock(), vec![0, 21, 22]);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_cursor_and_checks_presence() {
        let (chat, mut bridge) = setup();
        bridge
            .ingestion()
            .ingest_payload_at(&payload("Line"), t0())
            .await
            .unwrap();
        chat.fail_fetch.store(true, Ordering::SeqCst);

        bridge.tick_at(t0() + Duration::minutes(6)).await;

        assert_eq!(bridge.dispatcher().cursor(), 0);
        assert_eq!(
            chat.texts(),
            vec!["Inverter Monitor Online", "Inverter Monitor Offline"]
        );
    }
}

// ============================================================================
// Run loop
// ============================================================================

mod run_loop {
    use super::*;

    async fn wait_for_sent(chat: &FakeChat, count: usize) {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while chat.sent().len() < count {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn run_ingests_and_stops_on_shutdown() {
        let (chat, bridge) = setup();
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(bridge.run(rx, async {
            let _ = stop_rx.await;
        }));

        tx.send(payload("Battery")).await.unwrap();
        wait_for_sent(&chat, 2).await;

        chat.queue(vec![command(1, 11, "/status")]);
        wait_for_sent(&chat, 3).await;

        stop_tx.send(()).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        let sent = chat.sent();
        assert_eq!(sent[0].text, "Inverter Status Change=Battery");
        assert_eq!(sent[1].text, "Inverter Monitor Online");
        assert!(sent[2].text.starts_with("Online status Battery at "));
        assert_eq!(sent[2].reply_to, Some(11));
    }
}
