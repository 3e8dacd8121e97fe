use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::{ChannelConfig, ChannelKind, ChannelType};

use super::Informer;
use super::error::{InformError, InformResult};

const BLOCK_TYPE_SECTION: &str = "section";
const TEXT_TYPE_MARKDOWN: &str = "mrkdwn";

#[derive(Debug, Clone, Serialize)]
struct SlackMessage {
    blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize)]
struct Block {
    #[serde(rename = "type")]
    kind: &'static str,
    text: BlockText,
}

#[derive(Debug, Clone, Serialize)]
struct BlockText {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl SlackMessage {
    fn section(message: &str) -> Self {
        Self {
            blocks: vec![Block {
                kind: BLOCK_TYPE_SECTION,
                text: BlockText {
                    kind: TEXT_TYPE_MARKDOWN,
                    text: message.to_string(),
                },
            }],
        }
    }
}

/// Posts rendered messages to Slack incoming webhooks.
#[derive(Debug, Clone)]
pub struct SlackInformer {
    client: Client,
}

impl SlackInformer {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for SlackInformer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Informer for SlackInformer {
    #[instrument(skip_all, fields(channel = %channel.name))]
    async fn inform(&self, channel: &ChannelConfig, message: &str) -> InformResult<()> {
        let ChannelKind::Slack { webhook_url } = &channel.kind else {
            return Err(InformError::MismatchedChannel {
                expected: ChannelType::Slack,
            });
        };

        let payload = SlackMessage::section(message);
        let response = self.client.post(webhook_url).json(&payload).send().await?;

        if response.status().is_success() {
            info!("delivered slack notification");
            Ok(())
        } else {
            Err(InformError::Rejected {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}
