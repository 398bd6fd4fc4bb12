// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Delivery of proactive notifications to the destination chat.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::chat::ChatTransport;
use crate::notification::Notification;

/// Sends notifications to the single configured conversation.
///
/// Delivery is best effort: a failed send is logged and never retried.
///
/// Clones share one delivery guard. [`Notifier::deliver`] holds it from the
/// moment the notifications are decided until the last one is sent, so the
/// chat sees them in the order the status store emitted them even when
/// ingestion and the staleness check overlap.
#[derive(Debug)]
pub struct Notifier<T> {
    chat: Arc<T>,
    chat_id: i64,
    delivery: Arc<Mutex<()>>,
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self {
            chat: Arc::clone(&self.chat),
            chat_id: self.chat_id,
            delivery: Arc::clone(&self.delivery),
        }
    }
}

impl<T: ChatTransport> Notifier<T> {
    /// Creates a notifier posting to `chat_id`.
    #[must_use]
    pub fn new(chat: Arc<T>, chat_id: i64) -> Self {
        Self {
            chat,
            chat_id,
            delivery: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the destination conversation.
    #[must_use]
    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    /// Runs `decide` and sends what it returns, in order, as one unit.
    ///
    /// `decide` runs with the delivery guard held; no other `deliver` call
    /// can decide or send until this one has sent everything. Returns the
    /// notifications that were decided.
    pub async fn deliver<I>(&self, decide: impl FnOnce() -> I) -> Vec<Notification>
    where
        I: IntoIterator<Item = Notification>,
    {
        let _guard = self.delivery.lock().await;
        let notifications: Vec<Notification> = decide().into_iter().collect();
        for notification in &notifications {
            self.send(notification).await;
        }
        notifications
    }

    async fn send(&self, notification: &Notification) {
        let text = notification.text();
        match self.chat.send_text(self.chat_id, &text, None).await {
            Ok(()) => tracing::debug!(chat_id = self.chat_id, text = %text, "Notification sent"),
            Err(e) => tracing::warn!(
                chat_id = self.chat_id,
                text = %text,
                error = %e,
                "Failed to send notification"
            ),
        }
    }
}
