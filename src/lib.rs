// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inverter Bot - bridge inverter telemetry from MQTT to a Telegram chat.
//!
//! The inverter publishes its status as JSON on a message broker. This
//! library keeps the latest status, tracks whether telemetry is still
//! arriving, and relays what matters to a single Telegram conversation.
//!
//! # Features
//!
//! - **Change notifications**: one message per operating mode transition
//! - **Presence tracking**: online on first telemetry, offline after five
//!   silent minutes
//! - **Commands**: `/battery`, `/status` and `/info` answered as threaded
//!   replies from the latest status
//!
//! # Quick Start
//!
//! ```no_run
//! use inverter_bot::{Bridge, Command, TelegramConfig, TelemetrySubscriber};
//!
//! #[tokio::main]
//! async fn main() -> inverter_bot::Result<()> {
//!     let chat = TelegramConfig::new("123456:ABC-DEF").into_client()?;
//!     let me = chat.get_me().await?;
//!     chat.set_my_commands(&Command::menu()).await?;
//!
//!     let (subscriber, payloads) = TelemetrySubscriber::builder()
//!         .host("192.168.1.50")
//!         .credentials("inverter", "secret")
//!         .build()
//!         .await?;
//!
//!     Bridge::new(chat, -1001234567890, me.username)
//!         .run(payloads, async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!
//!     subscriber.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Reading the status directly
//!
//! ```
//! use chrono::Local;
//! use inverter_bot::{DeviceStatus, Mode, Notification, StatusStore};
//!
//! let store = StatusStore::new();
//! let notifications = store.ingest(DeviceStatus::with_mode(Mode::battery()), Local::now());
//!
//! assert_eq!(
//!     notifications,
//!     vec![
//!         Notification::ModeChanged {
//!             previous: Mode::line(),
//!             current: Mode::battery(),
//!         },
//!         Notification::Online,
//!     ]
//! );
//! assert!(store.snapshot().is_online());
//! ```

pub mod bridge;
pub mod chat;
pub mod command;
pub mod config;
pub mod error;
pub mod notification;
pub mod status;
pub mod telemetry;

pub use bridge::{Bridge, IngestionAdapter, Notifier, POLL_INTERVAL};
pub use chat::{ChatTransport, InboundMessage, TelegramClient, TelegramConfig, Update};
pub use command::{Command, CommandDispatcher, DispatchedCommand, format_reply};
pub use config::Config;
pub use error::{ConfigError, Error, ParseError, ProtocolError, Result};
pub use notification::Notification;
pub use status::{DeviceStatus, Mode, MonitorState, OFFLINE_AFTER, Presence, StatusStore};
pub use telemetry::{TelemetrySubscriber, TelemetrySubscriberBuilder, decode_status};
