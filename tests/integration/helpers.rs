//! Helper functions for integration tests

use std::sync::Arc;

use pulsewatch::{
    config::{BackendConfig, ChannelConfig, ChannelKind, Config, OnFailureRule},
    dispatch::Dispatcher,
    informers::default_informers,
    templates::TemplateRegistry,
};

pub fn create_test_backend(name: &str, url: &str, interval: u64) -> BackendConfig {
    BackendConfig {
        name: name.to_string(),
        url: url.to_string(),
        interval,
        expect_code: None,
        basic_auth: None,
        on_failure: vec![],
    }
}

pub fn create_slack_channel(name: &str, webhook_url: &str) -> ChannelConfig {
    ChannelConfig {
        name: name.to_string(),
        kind: ChannelKind::Slack {
            webhook_url: webhook_url.to_string(),
        },
    }
}

pub fn create_webhook_channel(name: &str, url: &str) -> ChannelConfig {
    ChannelConfig {
        name: name.to_string(),
        kind: ChannelKind::Webhook {
            url: url.to_string(),
        },
    }
}

pub fn create_rule(channel: &str, template: &str) -> OnFailureRule {
    OnFailureRule {
        channel: channel.to_string(),
        template: template.to_string(),
    }
}

pub fn create_test_config(channels: Vec<ChannelConfig>, backends: Vec<BackendConfig>) -> Config {
    Config {
        name: "test".to_string(),
        channels,
        backends,
    }
}

pub fn create_dispatcher(config: Arc<Config>) -> Arc<Dispatcher> {
    let templates = TemplateRegistry::compile(&config.backends).unwrap();
    Arc::new(Dispatcher::new(
        config,
        Arc::new(templates),
        default_informers(),
    ))
}

pub fn create_healthy_report_json() -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "timestamp": "2025-05-03T12:00:00Z",
        "details": [
            { "name": "database", "status": "ok" },
            { "name": "cache", "status": "ok" }
        ]
    })
}

pub fn create_failing_report_json(component: &str, reason: &str, fatal: bool) -> serde_json::Value {
    serde_json::json!({
        "status": "failed",
        "timestamp": "2025-05-03T12:00:00Z",
        "details": [
            { "name": "database", "status": "ok" },
            { "name": component, "status": "failed", "error": reason, "fatal": fatal }
        ]
    })
}
