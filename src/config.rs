use std::collections::HashSet;
use std::fmt;

use tracing::trace;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Human-readable name for this monitor, used in startup logging
    pub name: String,

    #[serde(default)]
    pub channels: Vec<ChannelConfig>,

    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct BackendConfig {
    pub name: String,
    pub url: String,

    /// Poll interval in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Status code the backend is expected to answer with. Informational
    /// only; failure detection is driven by the report body.
    pub expect_code: Option<u16>,

    pub basic_auth: Option<BasicAuth>,

    /// Notification rules applied on every completed poll, in order
    #[serde(default)]
    pub on_failure: Vec<OnFailureRule>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct OnFailureRule {
    /// Name of a channel declared in the top-level channel list
    pub channel: String,

    /// Template source rendered with the poll result
    pub template: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ChannelConfig {
    pub name: String,

    #[serde(flatten)]
    pub kind: ChannelKind,
}

/// Channel-kind specific delivery configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelKind {
    /// Slack incoming webhook
    Slack { webhook_url: String },

    /// Plain JSON webhook
    Webhook { url: String },
}

impl ChannelKind {
    pub fn channel_type(&self) -> ChannelType {
        match self {
            ChannelKind::Slack { .. } => ChannelType::Slack,
            ChannelKind::Webhook { .. } => ChannelType::Webhook,
        }
    }
}

/// Discriminant of [`ChannelKind`], used to key the informer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Slack,
    Webhook,
}

impl ChannelType {
    /// Every channel type a configuration may reference.
    pub const ALL: [ChannelType; 2] = [ChannelType::Slack, ChannelType::Webhook];
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::Slack => write!(f, "slack"),
            ChannelType::Webhook => write!(f, "webhook"),
        }
    }
}

impl Config {
    /// Looks up a channel by its declared name.
    pub fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.channels.iter().find(|channel| channel.name == name)
    }

    /// Checks the cross-references and required fields that scheduling
    /// relies on. Runs once at startup; any error is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::MissingName);
        }

        let mut channel_names = HashSet::new();
        for channel in &self.channels {
            if channel.name.is_empty() {
                return Err(ConfigError::UnnamedChannel);
            }
            if !channel_names.insert(channel.name.as_str()) {
                return Err(ConfigError::DuplicateChannel(channel.name.clone()));
            }
            match &channel.kind {
                ChannelKind::Slack { webhook_url } if webhook_url.is_empty() => {
                    return Err(ConfigError::InvalidChannel {
                        channel: channel.name.clone(),
                        reason: "webhook_url must not be empty",
                    });
                }
                ChannelKind::Webhook { url } if url.is_empty() => {
                    return Err(ConfigError::InvalidChannel {
                        channel: channel.name.clone(),
                        reason: "url must not be empty",
                    });
                }
                _ => {}
            }
        }

        let mut backend_names = HashSet::new();
        for backend in &self.backends {
            if backend.name.is_empty() {
                return Err(ConfigError::UnnamedBackend);
            }
            if !backend_names.insert(backend.name.as_str()) {
                return Err(ConfigError::DuplicateBackend(backend.name.clone()));
            }
            if backend.url.is_empty() {
                return Err(ConfigError::MissingUrl {
                    backend: backend.name.clone(),
                });
            }
            if backend.interval == 0 {
                return Err(ConfigError::InvalidInterval {
                    backend: backend.name.clone(),
                });
            }
            for rule in &backend.on_failure {
                if !channel_names.contains(rule.channel.as_str()) {
                    return Err(ConfigError::UnknownChannel {
                        backend: backend.name.clone(),
                        channel: rule.channel.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Errors detected while validating a loaded configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Top-level monitor name is empty
    MissingName,

    /// A backend entry has no name
    UnnamedBackend,

    /// A channel entry has no name
    UnnamedChannel,

    /// Two backends share a name
    DuplicateBackend(String),

    /// Two channels share a name
    DuplicateChannel(String),

    /// A backend has no URL to poll
    MissingUrl { backend: String },

    /// A backend declares a zero poll interval
    InvalidInterval { backend: String },

    /// A notification rule references a channel that is not declared
    UnknownChannel { backend: String, channel: String },

    /// A channel is missing kind-specific required fields
    InvalidChannel {
        channel: String,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingName => write!(f, "configuration needs a non-empty name"),
            ConfigError::UnnamedBackend => write!(f, "every backend needs a name"),
            ConfigError::UnnamedChannel => write!(f, "every channel needs a name"),
            ConfigError::DuplicateBackend(name) => {
                write!(f, "backend {} is declared more than once", name)
            }
            ConfigError::DuplicateChannel(name) => {
                write!(f, "channel {} is declared more than once", name)
            }
            ConfigError::MissingUrl { backend } => {
                write!(f, "backend {} has no url to poll", backend)
            }
            ConfigError::InvalidInterval { backend } => {
                write!(f, "backend {} needs a poll interval greater than zero", backend)
            }
            ConfigError::UnknownChannel { backend, channel } => {
                write!(
                    f,
                    "backend {} references channel {} which is not declared",
                    backend, channel
                )
            }
            ConfigError::InvalidChannel { channel, reason } => {
                write!(f, "channel {} is invalid: {}", channel, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn default_interval() -> u64 {
    15
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config: &Config| trace!("loaded config: {config:?}"))
}
