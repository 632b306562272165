use crate::config::CollectorConfig;
use crate::emitter::Emitter;
use crate::feed::{self, EventLines};
use crate::normalize::{normalize_content, UserDirectory};
use crate::prompt::system_prompt;
use crate::queue::QueueStore;
use crate::types::{Identity, IncomingMessage, MessageEntry, ReplyPayload, TrainingRecord};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Owns the channel queues and turns each inbound message into queue
/// updates and, when a queue is full, a persisted training record.
pub struct Collector {
    settings: CollectorConfig,
    persona: Option<Identity>,
    queues: QueueStore,
    emitter: Emitter,
    directory: Arc<dyn UserDirectory>,
}

impl Collector {
    pub fn new(
        settings: CollectorConfig,
        persona: Option<Identity>,
        emitter: Emitter,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            settings,
            persona,
            queues: QueueStore::new(),
            emitter,
            directory,
        }
    }

    #[cfg(test)]
    pub fn queues(&self) -> &QueueStore {
        &self.queues
    }

    /// Processes events one at a time until the feed ends or ctrl-c.
    pub async fn run(mut self, mut lines: EventLines) -> Result<()> {
        loop {
            tokio::select! {
                next = lines.next() => {
                    let segment = match next {
                        Some(segment) => segment.context("failed to read event feed")?,
                        None => break,
                    };
                    match feed::parse_segment(&segment) {
                        Ok(Some(msg)) => {
                            self.handle_message(msg).await;
                        }
                        Ok(None) => {}
                        Err(err) => warn!("skipping event: {err}"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted, stopping collector");
                    break;
                }
            }
        }
        info!("event feed closed");
        Ok(())
    }

    /// Handles one message. Returns the record emitted for it, if the
    /// channel's queue was full before the message arrived.
    pub async fn handle_message(&mut self, msg: IncomingMessage) -> Option<TrainingRecord> {
        let channel = msg.channel_id.as_str();
        if !self.settings.is_allowed(channel) {
            debug!(channel, "ignoring message from channel not in allowed_channels");
            return None;
        }

        let content = normalize_content(&msg.content, self.directory.as_ref()).await;

        debug!(
            channel,
            "{} / {}",
            self.queues.size(channel),
            self.settings.queue_len
        );

        let mut emitted = None;
        if self.queues.is_full(channel, self.settings.queue_len) {
            let input = self.queues.render(channel);
            self.queues.drain(channel, self.settings.cooldown + 1);

            let responder = msg
                .responder
                .clone()
                .or_else(|| self.persona.clone())
                .unwrap_or_else(|| msg.sender.clone());

            match build_record(channel, &responder, input, &content) {
                Ok(record) => {
                    debug!(channel, ?record, "training record assembled");
                    self.emitter.emit(channel, &record).await;
                    emitted = Some(record);
                }
                Err(err) => error!(channel, "failed to encode reply payload: {err}"),
            }
        }

        let entry = MessageEntry {
            id: msg.message_id,
            sender: msg.sender.name.clone(),
            sender_id: msg.sender.id.clone(),
            content,
        };
        if !self.queues.append(channel, entry, self.settings.filters()) {
            debug!(channel, message_id = msg.message_id, "message matched filter list, not queued");
        }

        emitted
    }
}

fn build_record(
    channel: &str,
    responder: &Identity,
    input: String,
    reply: &str,
) -> Result<TrainingRecord, serde_json::Error> {
    let output = serde_json::to_string(&ReplyPayload::success(channel, reply))?;
    Ok(TrainingRecord {
        instruction: system_prompt(responder),
        input,
        output,
    })
}
