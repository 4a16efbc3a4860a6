// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue message envelope.

use crate::ids::QueueMessageId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VISIBILITY_TIMEOUT_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_MAX_RECEIVE: u32 = 3;

/// A message sitting in a durable FIFO queue. `id` encodes delivery order;
/// `visible_at_ms` implements the visibility-timeout lease: a message is
/// only eligible for `Receive` once `now_ms >= visible_at_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMessage {
    pub id: QueueMessageId,
    pub queue_name: String,
    pub body: serde_json::Value,
    pub visible_at_ms: u64,
    pub receive_count: u32,
    pub max_receive: u32,
    pub enqueued_at_ms: u64,
}

impl QueueMessage {
    pub fn new(
        id: QueueMessageId,
        queue_name: impl Into<String>,
        body: serde_json::Value,
        enqueued_at_ms: u64,
    ) -> Self {
        Self {
            id,
            queue_name: queue_name.into(),
            body,
            visible_at_ms: enqueued_at_ms,
            receive_count: 0,
            max_receive: DEFAULT_MAX_RECEIVE,
            enqueued_at_ms,
        }
    }

    pub fn is_visible_at(&self, now_ms: u64) -> bool {
        now_ms >= self.visible_at_ms
    }

    /// Lease the message: bump `receive_count` and push `visible_at_ms`
    /// forward by `timeout_ms`. Returns `true` if this receive exhausted
    /// `max_receive` and the message should be dead-lettered instead.
    pub fn receive(&mut self, now_ms: u64, timeout_ms: u64) -> bool {
        self.receive_count += 1;
        self.visible_at_ms = now_ms + timeout_ms;
        self.receive_count > self.max_receive
    }

    pub fn extend(&mut self, now_ms: u64, timeout_ms: u64) {
        self.visible_at_ms = now_ms + timeout_ms;
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
