use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tracing::{info, instrument};

use crate::config::{ChannelConfig, ChannelKind, ChannelType};

use super::Informer;
use super::error::{InformError, InformResult};

/// Posts rendered messages to plain JSON webhooks.
#[derive(Debug, Clone)]
pub struct WebhookInformer {
    client: Client,
}

impl WebhookInformer {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for WebhookInformer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Informer for WebhookInformer {
    #[instrument(skip_all, fields(channel = %channel.name))]
    async fn inform(&self, channel: &ChannelConfig, message: &str) -> InformResult<()> {
        let ChannelKind::Webhook { url } = &channel.kind else {
            return Err(InformError::MismatchedChannel {
                expected: ChannelType::Webhook,
            });
        };

        let payload = json!({
            "message": message,
            "channel": channel.name,
            "timestamp": Utc::now().to_rfc3339(),
        });

        let response = self.client.post(url).json(&payload).send().await?;

        if response.status().is_success() {
            info!("delivered webhook notification");
            Ok(())
        } else {
            Err(InformError::Rejected {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}
