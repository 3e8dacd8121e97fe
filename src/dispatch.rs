//! Notification dispatch for completed polls.
//!
//! After every successful probe the dispatcher walks the backend's
//! `on_failure` rules in declared order: resolve the channel, render the
//! rule's template with the poll result, deliver through the informer for
//! the channel's type. One failing rule never stops the rest; every rule
//! error ends up in the returned aggregate for the caller to log.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::config::{BackendConfig, ChannelType, Config, OnFailureRule};
use crate::informers::{InformError, InformerMap};
use crate::probe::PingResult;
use crate::templates::{RenderError, TemplateRegistry};

/// Runs notification rules against poll results.
///
/// Holds only read-only state (configuration, compiled templates, informer
/// table), so one dispatcher is shared by every backend task.
pub struct Dispatcher {
    config: Arc<Config>,
    templates: Arc<TemplateRegistry>,
    informers: InformerMap,
}

impl Dispatcher {
    pub fn new(
        config: Arc<Config>,
        templates: Arc<TemplateRegistry>,
        informers: InformerMap,
    ) -> Self {
        Self {
            config,
            templates,
            informers,
        }
    }

    /// Applies every rule of the backend to this poll result.
    ///
    /// Runs unconditionally, also when the result carries no failures; a
    /// backend without rules is a no-op. Returns the per-rule errors as one
    /// aggregate, `Ok` when every rule delivered.
    #[instrument(skip_all, fields(backend = %backend.name))]
    pub async fn dispatch(
        &self,
        backend: &BackendConfig,
        ping: &PingResult,
    ) -> Result<(), DispatchError> {
        if backend.on_failure.is_empty() {
            return Ok(());
        }

        debug!(
            "running {} notification rules ({} component failures)",
            backend.on_failure.len(),
            ping.failures.len()
        );

        let mut failures = Vec::new();
        for rule in &backend.on_failure {
            if let Err(error) = self.run_rule(backend, rule, ping).await {
                if error.is_invariant_violation() {
                    error!(
                        "configuration invariant broken for channel {}: {}",
                        rule.channel, error
                    );
                } else {
                    warn!(
                        "informing channel {} failed: {}; continuing with remaining rules",
                        rule.channel, error
                    );
                }
                failures.push(RuleFailure {
                    channel: rule.channel.clone(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError { failures })
        }
    }

    async fn run_rule(
        &self,
        backend: &BackendConfig,
        rule: &OnFailureRule,
        ping: &PingResult,
    ) -> Result<(), RuleError> {
        let Some(channel) = self.config.channel(&rule.channel) else {
            return Err(RuleError::UnknownChannel);
        };

        let message = self.templates.render(&backend.name, &rule.channel, ping)?;

        let channel_type = channel.kind.channel_type();
        let Some(informer) = self.informers.get(&channel_type) else {
            return Err(RuleError::MissingInformer(channel_type));
        };

        informer.inform(channel, &message).await?;
        Ok(())
    }
}

/// Why a single notification rule failed
#[derive(Debug)]
pub enum RuleError {
    /// The rule references a channel that is not declared
    UnknownChannel,

    /// No informer is registered for the channel's type
    MissingInformer(ChannelType),

    /// The rule's template could not be rendered
    Render(RenderError),

    /// The informer could not deliver the message
    Deliver(InformError),
}

impl RuleError {
    /// Failures that startup validation is supposed to make impossible.
    fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            RuleError::UnknownChannel
                | RuleError::MissingInformer(_)
                | RuleError::Render(RenderError::MissingTemplate { .. })
        )
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::UnknownChannel => {
                write!(f, "channel is not declared in the configuration")
            }
            RuleError::MissingInformer(channel_type) => {
                write!(f, "no informer registered for channel type {}", channel_type)
            }
            RuleError::Render(err) => write!(f, "{}", err),
            RuleError::Deliver(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuleError::Render(err) => Some(err),
            RuleError::Deliver(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RenderError> for RuleError {
    fn from(err: RenderError) -> Self {
        RuleError::Render(err)
    }
}

impl From<InformError> for RuleError {
    fn from(err: InformError) -> Self {
        RuleError::Deliver(err)
    }
}

/// Aggregate of every rule failure of one dispatch
#[derive(Debug)]
pub struct DispatchError {
    pub failures: Vec<RuleFailure>,
}

/// One failed rule inside a [`DispatchError`]
#[derive(Debug)]
pub struct RuleFailure {
    pub channel: String,
    pub error: RuleError,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} notification rule(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; channel {}: {}", failure.channel, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for DispatchError {}
