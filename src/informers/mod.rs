//! Delivery channels for rendered notification messages.
//!
//! An [`Informer`] posts one already-rendered message to its kind of channel
//! endpoint. The dispatcher resolves informers through an [`InformerMap`]
//! keyed by [`ChannelType`], so delivery logic stays swappable in tests.
//!
//! Shipped informers:
//! - [`SlackInformer`] - Slack incoming webhooks (blocks payload)
//! - [`WebhookInformer`] - plain JSON webhooks

mod error;
mod slack;
mod webhook;

pub use error::{InformError, InformResult};
pub use slack::SlackInformer;
pub use webhook::WebhookInformer;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{ChannelConfig, ChannelType};

/// Delivers rendered messages through one kind of channel.
///
/// Implementations match on the channel's kind and answer with
/// [`InformError::MismatchedChannel`] when routed a foreign one.
#[async_trait]
pub trait Informer: Send + Sync {
    /// Delivers one rendered message to the configured endpoint.
    async fn inform(&self, channel: &ChannelConfig, message: &str) -> InformResult<()>;
}

/// Informer lookup table, one entry per channel type.
pub type InformerMap = HashMap<ChannelType, Arc<dyn Informer>>;

/// Builds the production informer table with a shared HTTP client.
pub fn default_informers() -> InformerMap {
    let client = Client::new();

    let mut informers: InformerMap = HashMap::new();
    informers.insert(
        ChannelType::Slack,
        Arc::new(SlackInformer::with_client(client.clone())),
    );
    informers.insert(
        ChannelType::Webhook,
        Arc::new(WebhookInformer::with_client(client)),
    );
    informers
}
