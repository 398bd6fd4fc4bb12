// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ingestion of telemetry payloads into the status store.

use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use super::Notifier;
use crate::chat::ChatTransport;
use crate::error::ParseError;
use crate::notification::Notification;
use crate::status::{DeviceStatus, StatusStore};
use crate::telemetry::decode_status;

/// Feeds decoded telemetry into the status store.
///
/// Each payload is decoded and adopted by the store, which runs change and
/// presence detection under its lock. The resulting notifications are sent
/// once that lock is released, inside the notifier's delivery guard.
/// Undecodable payloads are logged and dropped without touching the store.
#[derive(Debug)]
pub struct IngestionAdapter<T> {
    store: StatusStore,
    notifier: Notifier<T>,
}

impl<T> Clone for IngestionAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<T: ChatTransport> IngestionAdapter<T> {
    /// Creates an adapter writing to `store` and notifying through `notifier`.
    #[must_use]
    pub fn new(store: StatusStore, notifier: Notifier<T>) -> Self {
        Self { store, notifier }
    }

    /// Consumes payloads until the channel closes.
    pub async fn run(self, mut payloads: mpsc::Receiver<Vec<u8>>) {
        while let Some(payload) = payloads.recv().await {
            self.handle_payload(&payload).await;
        }
        tracing::debug!("Telemetry channel closed");
    }

    /// Ingests one raw payload received now, logging decode failures.
    pub async fn handle_payload(&self, payload: &[u8]) {
        if let Err(e) = self.ingest_payload_at(payload, Local::now()).await {
            tracing::warn!(
                error = %e,
                payload = %String::from_utf8_lossy(payload),
                "Dropping malformed telemetry"
            );
        }
    }

    /// Decodes and ingests one raw payload received at `now`.
    ///
    /// Returns the notifications that were emitted.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the payload cannot be decoded; the store is
    /// left unchanged.
    pub async fn ingest_payload_at(
        &self,
        payload: &[u8],
        now: DateTime<Local>,
    ) -> Result<Vec<Notification>, ParseError> {
        let status = decode_status(payload)?;
        tracing::debug!(mode = %status.mode, "Received status");
        Ok(self.ingest_at(status, now).await)
    }

    /// Ingests an already decoded status received at `now`.
    pub async fn ingest_at(&self, status: DeviceStatus, now: DateTime<Local>) -> Vec<Notification> {
        self.notifier
            .deliver(|| self.store.ingest(status, now))
            .await
    }
}
