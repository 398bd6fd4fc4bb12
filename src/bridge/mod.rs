// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge between telemetry and chat.
//!
//! Two activities share the [`StatusStore`]:
//!
//! ```text
//! MQTT payloads ──► IngestionAdapter ──► StatusStore ──► Notifier ──► chat
//!                                            ▲
//! chat updates ──► CommandDispatcher ──► format_reply ──► threaded reply
//!                         (one tick per POLL_INTERVAL, then staleness check)
//! ```
//!
//! The ingestion side runs in its own task and reacts to every payload. The
//! polling side runs one tick per [`POLL_INTERVAL`]: fetch commands, answer
//! them, then check for staleness. A failing tick is logged and the loop
//! goes on.

mod ingest;
mod notifier;

pub use ingest::IngestionAdapter;
pub use notifier::Notifier;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::chat::ChatTransport;
use crate::command::{CommandDispatcher, DispatchedCommand, format_reply};
use crate::error::ProtocolError;
use crate::status::StatusStore;

/// Delay between two ticks of the polling loop.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Telemetry-to-chat bridge.
///
/// # Examples
///
/// ```no_run
/// use inverter_bot::bridge::Bridge;
/// use inverter_bot::chat::TelegramConfig;
/// use inverter_bot::telemetry::TelemetrySubscriber;
///
/// # async fn example() -> inverter_bot::Result<()> {
/// let chat = TelegramConfig::new("123456:ABC-DEF").into_client()?;
/// let (subscriber, payloads) = TelemetrySubscriber::builder()
///     .host("192.168.1.50")
///     .build()
///     .await?;
///
/// let bridge = Bridge::new(chat, -1001234567890, Some("InverterBot".to_string()));
/// bridge.run(payloads, async { let _ = tokio::signal::ctrl_c().await; }).await;
///
/// subscriber.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bridge<T> {
    store: StatusStore,
    chat: Arc<T>,
    notifier: Notifier<T>,
    dispatcher: CommandDispatcher,
}

impl<T: ChatTransport + 'static> Bridge<T> {
    /// Creates a bridge notifying `chat_id` and answering commands
    /// addressed to `bot_username`.
    #[must_use]
    pub fn new(chat: T, chat_id: i64, bot_username: Option<String>) -> Self {
        let chat = Arc::new(chat);
        Self {
            store: StatusStore::new(),
            notifier: Notifier::new(Arc::clone(&chat), chat_id),
            chat,
            dispatcher: CommandDispatcher::new(bot_username),
        }
    }

    /// Returns the shared status store.
    #[must_use]
    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// Returns the command dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Returns a handle for feeding telemetry into this bridge.
    #[must_use]
    pub fn ingestion(&self) -> IngestionAdapter<T> {
        IngestionAdapter::new(self.store.clone(), self.notifier.clone())
    }

    /// Runs one tick of the polling loop now.
    pub async fn tick(&mut self) {
        self.tick_at(Local::now()).await;
    }

    /// Runs one tick of the polling loop, using `now` for the staleness check.
    ///
    /// A failure to retrieve commands is logged; the staleness check runs
    /// regardless.
    pub async fn tick_at(&mut self, now: DateTime<Local>) {
        if let Err(e) = self.answer_commands().await {
            tracing::error!(error = %e, "Error in chat client");
        }

        self.notifier
            .deliver(|| self.store.check_presence(now))
            .await;
    }

    /// Fetches the next batch of commands and answers each of them.
    ///
    /// Returns the number of commands answered.
    ///
    /// # Errors
    ///
    /// Returns error if the batch cannot be fetched. Failed replies are
    /// logged and do not abort the batch.
    pub async fn answer_commands(&mut self) -> Result<usize, ProtocolError> {
        let commands = self.dispatcher.fetch_next_batch(self.chat.as_ref()).await?;
        for command in &commands {
            self.answer(command).await;
        }
        Ok(commands.len())
    }

    async fn answer(&self, command: &DispatchedCommand) {
        let reply = self.store.read(|state| format_reply(command.command, state));

        if let Err(e) = self
            .chat
            .send_text(command.chat_id, &reply, Some(command.message_id))
            .await
        {
            tracing::warn!(
                update_id = command.update_id,
                command = %command.command,
                chat_id = command.chat_id,
                error = %e,
                "Failed to send reply"
            );
        }
    }

    /// Runs the bridge until `shutdown` completes.
    ///
    /// Spawns the ingestion task for `payloads`, then ticks every
    /// [`POLL_INTERVAL`]. Shutdown is observed between ticks, so it can wait
    /// for one in-flight `fetch_updates` call; the ingestion task is stopped
    /// on every exit path.
    pub async fn run(mut self, payloads: mpsc::Receiver<Vec<u8>>, shutdown: impl Future<Output = ()>) {
        let _ingestion = AbortOnDrop(tokio::spawn(self.ingestion().run(payloads)));
        tokio::pin!(shutdown);

        tracing::info!(chat_id = self.notifier.chat_id(), "Inverter bot running");

        loop {
            self.tick().await;

            tokio::select! {
                () = &mut shutdown => break,
                () = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }

        tracing::info!(cursor = self.dispatcher.cursor(), "Inverter bot stopping");
    }
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
