// src/exec/template.rs

use crate::watch::event::RawEvent;

/// The configured command template, with `{path}` / `{event}` placeholders
/// resolved at dispatch time.
///
/// Substitution is purely textual: every occurrence of a recognized
/// placeholder is replaced, anything else (including unknown `{...}` tokens)
/// passes through unchanged.
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    template: String,
}

impl CommandTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The raw template string.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the command line for the given representative event.
    ///
    /// With no event (the startup run) the template is returned unchanged.
    pub fn render(&self, event: Option<&RawEvent>) -> String {
        let Some(event) = event else {
            return self.template.clone();
        };

        // `{event}` goes first so a path containing that literal token is
        // never re-substituted.
        self.template
            .replace("{event}", event.kind.as_str())
            .replace("{path}", &event.path.to_string_lossy())
    }
}
