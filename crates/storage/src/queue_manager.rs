// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable FIFO Queue Manager: `enqueue`/`receive`/`extend`/`delete` with
//! visibility-timeout leases and dead-lettering.

use crate::kv::{KvError, KvStore, Storage};
use crate::record::Record;
use quaero_core::{
    QueueMessage, QueueMessageId, DEFAULT_MAX_RECEIVE, DEFAULT_VISIBILITY_TIMEOUT_MS,
};

impl Record for QueueMessage {
    fn table() -> &'static str {
        "queue_messages"
    }

    fn key(&self) -> String {
        self.id.as_str().to_string()
    }
}

#[derive(Clone)]
pub struct QueueManager {
    messages: KvStore<QueueMessage>,
    dead_letters: KvStore<DeadLetter>,
    visibility_timeout_ms: u64,
}

/// A message that exceeded `max_receive`, parked for operator inspection.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeadLetter {
    pub id: QueueMessageId,
    pub queue_name: String,
    pub body: serde_json::Value,
    pub receive_count: u32,
    pub dead_lettered_at_ms: u64,
}

impl Record for DeadLetter {
    fn table() -> &'static str {
        "dead_letters"
    }

    fn key(&self) -> String {
        self.id.as_str().to_string()
    }
}

impl QueueManager {
    pub fn new(storage: &Storage) -> Self {
        Self {
            messages: storage.table(),
            dead_letters: storage.table(),
            visibility_timeout_ms: DEFAULT_VISIBILITY_TIMEOUT_MS,
        }
    }

    pub fn with_visibility_timeout_ms(mut self, ms: u64) -> Self {
        self.visibility_timeout_ms = ms;
        self
    }

    pub fn enqueue(
        &self,
        queue_name: &str,
        body: serde_json::Value,
        now_unix_nanos: u128,
        now_ms: u64,
    ) -> Result<QueueMessageId, KvError> {
        let id = QueueMessageId::generate(now_unix_nanos);
        let mut message = QueueMessage::new(id.clone(), queue_name, body, now_ms);
        message.max_receive = DEFAULT_MAX_RECEIVE;
        self.messages.insert(message)?;
        Ok(id)
    }

    /// Receive the oldest visible message for `queue_name`, leasing it for
    /// `visibility_timeout_ms`. Messages that exceed `max_receive` on this
    /// receive are moved to the dead-letter table instead of being
    /// returned, without blocking the rest of the queue.
    pub fn receive(&self, queue_name: &str, now_ms: u64) -> Result<Option<QueueMessage>, KvError> {
        loop {
            let mut candidates: Vec<QueueMessage> = self
                .messages
                .find(|m| m.queue_name == queue_name && m.is_visible_at(now_ms))?;
            candidates.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

            let Some(mut msg) = candidates.into_iter().next() else {
                return Ok(None);
            };

            let id = msg.id.clone();
            let dead = msg.receive(now_ms, self.visibility_timeout_ms);
            if dead {
                self.dead_letter(msg, now_ms)?;
                // keep scanning; another message may still be deliverable
                continue;
            }
            self.messages.upsert(msg.clone())?;
            let _ = id;
            return Ok(Some(msg));
        }
    }

    pub fn extend(&self, id: &QueueMessageId, now_ms: u64) -> Result<(), KvError> {
        self.messages.update(id.as_str(), |m| {
            m.extend(now_ms, self.visibility_timeout_ms);
            Ok(())
        })?;
        Ok(())
    }

    pub fn delete(&self, id: &QueueMessageId) -> Result<(), KvError> {
        self.messages.delete(id.as_str())
    }

    pub fn dead_letters(&self, queue_name: &str) -> Result<Vec<DeadLetter>, KvError> {
        self.dead_letters.find(|d| d.queue_name == queue_name)
    }

    fn dead_letter(&self, msg: QueueMessage, now_ms: u64) -> Result<(), KvError> {
        self.messages.delete(msg.id.as_str())?;
        self.dead_letters.insert(DeadLetter {
            id: msg.id,
            queue_name: msg.queue_name,
            body: msg.body,
            receive_count: msg.receive_count,
            dead_lettered_at_ms: now_ms,
        })
    }
}

#[cfg(test)]
#[path = "queue_manager_tests.rs"]
mod tests;
