//! Turns raw chat markup into the plain text stored in transcripts.

use crate::error::LookupError;
use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::warn;

static IMAGE_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"<img.*?/>"));
static VIDEO_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"<video.*?/>"));
static AUDIO_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"<audio.*?/>"));
static MENTION_TAG: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"<at id="([^"]+)"(?:\s+name="([^"]+)")?\s*/>"#));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern is valid")
}

/// Resolves user ids to display names for mentions that carry no inline name.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn display_name(&self, user_id: &str) -> Result<String, LookupError>;
}

/// A fixed id -> name table, typically loaded from the `[users]` config section.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    names: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn display_name(&self, user_id: &str) -> Result<String, LookupError> {
        self.names
            .get(user_id)
            .cloned()
            .ok_or_else(|| LookupError::UnknownUser(user_id.to_string()))
    }
}

/// Full normalization: mentions first, then media placeholders.
pub async fn normalize_content(content: &str, directory: &dyn UserDirectory) -> String {
    let resolved = resolve_mentions(content, directory).await;
    replace_media_tags(&resolved)
}

pub fn replace_media_tags(text: &str) -> String {
    let text = IMAGE_TAG.replace_all(text, "[图片]");
    let text = VIDEO_TAG.replace_all(&text, "[视频]");
    let text = AUDIO_TAG.replace_all(&text, "[音频]");
    text.into_owned()
}

/// Rewrites every `<at id=".." name=".."/>` as `@name`. Mentions without a
/// name are looked up concurrently; an unresolved id becomes `@<id>`.
pub async fn resolve_mentions(content: &str, directory: &dyn UserDirectory) -> String {
    let mentions: Vec<Mention> = MENTION_TAG
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.get(1)?.as_str().trim().to_string();
            let name = caps.get(2).map(|m| m.as_str().trim().to_string());
            Some(Mention {
                start: whole.start(),
                end: whole.end(),
                id,
                name,
            })
        })
        .collect();

    if mentions.is_empty() {
        return content.to_string();
    }

    let names = join_all(mentions.iter().map(|mention| async move {
        match &mention.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => match directory.display_name(&mention.id).await {
                Ok(name) => name,
                Err(err) => {
                    warn!(user_id = %mention.id, "mention left unresolved: {err}");
                    mention.id.clone()
                }
            },
        }
    }))
    .await;

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for (mention, name) in mentions.iter().zip(names) {
        out.push_str(&content[cursor..mention.start]);
        out.push('@');
        out.push_str(&name);
        cursor = mention.end;
    }
    out.push_str(&content[cursor..]);
    out
}

struct Mention {
    start: usize,
    end: usize,
    id: String,
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StaticDirectory {
        StaticDirectory::new(HashMap::from([("10001".to_string(), "alice".to_string())]))
    }

    #[test]
    fn media_tags_become_placeholders() {
        let raw = r#"look <img src="a.png"/> and <video src="b.mp4" /> plus <audio src="c.ogg"/>"#;
        assert_eq!(replace_media_tags(raw), "look [图片] and [视频] plus [音频]");
    }

    #[test]
    fn media_tags_match_lazily() {
        let raw = r#"<img src="1"/><img src="2"/>"#;
        assert_eq!(replace_media_tags(raw), "[图片][图片]");
    }

    #[tokio::test]
    async fn inline_name_wins_over_lookup() {
        let out = resolve_mentions(r#"hi <at id="10001" name="Ally"/>!"#, &directory()).await;
        assert_eq!(out, "hi @Ally!");
    }

    #[tokio::test]
    async fn missing_name_is_looked_up() {
        let out = resolve_mentions(r#"<at id="10001"/> ping"#, &directory()).await;
        assert_eq!(out, "@alice ping");
    }

    #[tokio::test]
    async fn unknown_user_falls_back_to_id() {
        let out = resolve_mentions(r#"<at id="404"/> and <at id="10001"/>"#, &directory()).await;
        assert_eq!(out, "@404 and @alice");
    }

    #[tokio::test]
    async fn normalize_handles_mentions_and_media() {
        let raw = r#"<at id="10001"/> <img src="x"/>"#;
        assert_eq!(normalize_content(raw, &directory()).await, "@alice [图片]");
    }

    #[tokio::test]
    async fn plain_text_passes_through() {
        assert_eq!(normalize_content("just text", &directory()).await, "just text");
    }
}
