//! Notification message templates.
//!
//! Every `on_failure` rule carries a template source; all of them are
//! compiled once at startup into a [`TemplateRegistry`] keyed by the
//! `(backend, channel)` pair. Compilation failures and duplicate keys abort
//! startup, so a running monitor can assume every configured rule renders.
//!
//! Templates are handlebars sources rendered against the poll result:
//!
//! ```text
//! Backend {{backend}} answered {{status_code}} at {{timestamp}}
//! {{#each failures}} - {{name}}: "{{reason}}"{{#if fatal}} (FATAL){{/if}}
//! {{/each}}
//! ```
//!
//! Rendering is strict (a typo in a field name fails the rule instead of
//! printing nothing) and unescaped (values appear verbatim).

use std::collections::HashMap;
use std::fmt;

use handlebars::Handlebars;
use tracing::debug;

use crate::config::BackendConfig;
use crate::probe::PingResult;

/// Compiled notification templates, one per `(backend, channel)` pair.
#[derive(Debug)]
pub struct TemplateRegistry {
    registry: Handlebars<'static>,
    keys: HashMap<(String, String), String>,
}

impl TemplateRegistry {
    /// Compiles the templates of every notification rule.
    ///
    /// Fails on the first duplicate `(backend, channel)` pair or template
    /// source that does not compile, naming the offending rule.
    pub fn compile(backends: &[BackendConfig]) -> Result<Self, CompileError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);

        let mut keys = HashMap::new();

        for backend in backends {
            for rule in &backend.on_failure {
                let key = (backend.name.clone(), rule.channel.clone());
                if keys.contains_key(&key) {
                    return Err(CompileError::Duplicate {
                        backend: backend.name.clone(),
                        channel: rule.channel.clone(),
                    });
                }

                // Index prefix keeps engine names unique even if composed
                // backend/channel strings ever collide
                let name = format!("{}:{}/{}", keys.len(), backend.name, rule.channel);
                registry
                    .register_template_string(&name, &rule.template)
                    .map_err(|source| CompileError::Syntax {
                        backend: backend.name.clone(),
                        channel: rule.channel.clone(),
                        source,
                    })?;

                keys.insert(key, name);
            }
        }

        debug!("compiled {} notification templates", keys.len());

        Ok(Self { registry, keys })
    }

    /// Renders the template registered for this `(backend, channel)` pair.
    pub fn render(
        &self,
        backend: &str,
        channel: &str,
        ping: &PingResult,
    ) -> Result<String, RenderError> {
        let key = (backend.to_string(), channel.to_string());
        let Some(name) = self.keys.get(&key) else {
            return Err(RenderError::MissingTemplate {
                backend: backend.to_string(),
                channel: channel.to_string(),
            });
        };

        self.registry.render(name, ping).map_err(RenderError::Engine)
    }

    pub fn contains(&self, backend: &str, channel: &str) -> bool {
        self.keys
            .contains_key(&(backend.to_string(), channel.to_string()))
    }

    /// Number of compiled templates.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Errors raised while building the registry at startup
#[derive(Debug)]
pub enum CompileError {
    /// Two rules share the same `(backend, channel)` pair
    Duplicate { backend: String, channel: String },

    /// A template source does not compile
    Syntax {
        backend: String,
        channel: String,
        source: handlebars::TemplateError,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Duplicate { backend, channel } => {
                write!(
                    f,
                    "duplicate template for backend {} and channel {}",
                    backend, channel
                )
            }
            CompileError::Syntax {
                backend,
                channel,
                source,
            } => {
                write!(
                    f,
                    "template for backend {} and channel {} does not compile: {}",
                    backend, channel, source
                )
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Syntax { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors raised when rendering a compiled template
#[derive(Debug)]
pub enum RenderError {
    /// No template was compiled for this pair; startup validation should
    /// make this unreachable
    MissingTemplate { backend: String, channel: String },

    /// The engine rejected the render (strict mode field miss, bad block)
    Engine(handlebars::RenderError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MissingTemplate { backend, channel } => {
                write!(
                    f,
                    "no template compiled for backend {} and channel {}",
                    backend, channel
                )
            }
            RenderError::Engine(err) => write!(f, "template rendering failed: {}", err),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Engine(err) => Some(err),
            _ => None,
        }
    }
}
