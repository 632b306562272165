use crate::types::Identity;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub collector: CollectorConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub persona: Option<PersonaConfig>,
    #[serde(default)]
    pub users: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    #[serde(alias = "AllowedChannels")]
    pub allowed_channels: Vec<String>,
    #[serde(alias = "QueueLen", default = "default_queue_len")]
    pub queue_len: usize,
    #[serde(alias = "Cooldown", default)]
    pub cooldown: usize,
    #[serde(alias = "FilterList", default)]
    pub filter_list: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersonaConfig {
    pub name: String,
    pub id: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl CollectorConfig {
    pub fn is_allowed(&self, channel: &str) -> bool {
        self.allowed_channels.iter().any(|c| c == channel)
    }

    /// Substrings that keep a message out of the queue. Without an explicit
    /// `filter_list` the allowed channel ids are used.
    pub fn filters(&self) -> &[String] {
        self.filter_list
            .as_deref()
            .unwrap_or(&self.allowed_channels)
    }
}

impl PersonaConfig {
    pub fn identity(&self) -> Identity {
        Identity {
            name: self.name.clone(),
            id: self.id.clone(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(content).context("failed to parse config toml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.collector.allowed_channels.is_empty() {
            bail!("collector.allowed_channels must list at least one channel");
        }
        if self.collector.queue_len == 0 {
            bail!("collector.queue_len must be at least 1");
        }
        Ok(())
    }
}

fn default_queue_len() -> usize {
    10
}

fn default_output_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = Config::parse("[collector]\nallowed_channels = [\"g1\"]\n").unwrap();
        assert_eq!(cfg.collector.queue_len, 10);
        assert_eq!(cfg.collector.cooldown, 0);
        assert!(cfg.persona.is_none());
        assert!(cfg.users.is_empty());
        assert_eq!(cfg.collector.filters(), ["g1".to_string()]);
    }

    #[test]
    fn accepts_plugin_style_keys() {
        let cfg = Config::parse(
            "[collector]\nAllowedChannels = [\"g1\", \"g2\"]\nQueueLen = 4\nCooldown = 2\n",
        )
        .unwrap();
        assert_eq!(cfg.collector.allowed_channels, vec!["g1", "g2"]);
        assert_eq!(cfg.collector.queue_len, 4);
        assert_eq!(cfg.collector.cooldown, 2);
        assert!(cfg.collector.is_allowed("g2"));
        assert!(!cfg.collector.is_allowed("g3"));
    }

    #[test]
    fn explicit_filter_list_replaces_channel_ids() {
        let cfg = Config::parse(
            r#"
[collector]
allowed_channels = ["g1"]
filter_list = ["spam"]

[output]
dir = "/tmp/ytt"

[persona]
name = "bot"
id = "999"

[users]
"10001" = "alice"
"#,
        )
        .unwrap();
        assert_eq!(cfg.collector.filters(), ["spam".to_string()]);
        assert_eq!(cfg.output.dir, PathBuf::from("/tmp/ytt"));
        let persona = cfg.persona.unwrap().identity();
        assert_eq!(persona.name, "bot");
        assert_eq!(persona.id, "999");
        assert_eq!(cfg.users["10001"], "alice");
    }

    #[test]
    fn rejects_empty_channel_list() {
        let err = Config::parse("[collector]\nallowed_channels = []\n").unwrap_err();
        assert!(err.to_string().contains("allowed_channels"));
    }

    #[test]
    fn rejects_zero_queue_len() {
        let err = Config::parse("[collector]\nallowed_channels = [\"g1\"]\nqueue_len = 0\n")
            .unwrap_err();
        assert!(err.to_string().contains("queue_len"));
    }

    #[test]
    fn missing_collector_section_fails() {
        assert!(Config::parse("[output]\ndir = \".\"\n").is_err());
    }
}
