use serde::{Deserialize, Serialize};

/// A display name paired with the platform's unique id for that user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub id: String,
}

/// A chat message as delivered by the event feed, already validated.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub channel_id: String,
    pub content: String,
    pub sender: Identity,
    pub message_id: u64,
    pub responder: Option<Identity>,
}

/// One buffered message in a channel queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    pub id: u64,
    pub sender: String,
    pub sender_id: String,
    pub content: String,
}

impl MessageEntry {
    pub fn transcript_line(&self) -> String {
        format!(
            "[{}] {}<{}> 说: {}",
            self.id, self.sender, self.sender_id, self.content
        )
    }
}

/// A single training example as stored in the per-channel output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub instruction: String,
    pub input: String,
    pub output: String,
}

/// The reply shape the model is trained to produce; stored as a JSON
/// string in `TrainingRecord::output`.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyPayload<'a> {
    pub status: &'a str,
    pub session_id: &'a str,
    pub logic: &'a str,
    #[serde(rename = "finReply")]
    pub fin_reply: &'a str,
}

impl<'a> ReplyPayload<'a> {
    pub fn success(session_id: &'a str, fin_reply: &'a str) -> Self {
        Self {
            status: "success",
            session_id,
            logic: "",
            fin_reply,
        }
    }
}
