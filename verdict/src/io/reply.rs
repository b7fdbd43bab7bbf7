//! Reply rendering for matched scenario clauses.
//!
//! A clause reply is a minijinja template rendered against the matched
//! payload. Available variables:
//!
//! - `value`: the payload's plain-text form
//! - `payload`: the payload as structured JSON
//! - `kind`: the payload's runtime kind name

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::value::Value;

/// Template engine wrapper around minijinja.
pub struct ReplyRenderer {
    env: Environment<'static>,
}

impl Default for ReplyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyRenderer {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Parse `template` without rendering it.
    pub fn check(&self, template: &str) -> Result<()> {
        self.env
            .template_from_str(template)
            .with_context(|| format!("parse reply template '{template}'"))?;
        Ok(())
    }

    pub fn render(&self, template: &str, value: &Value) -> Result<String> {
        self.env
            .render_str(
                template,
                context! {
                    value => value.to_string(),
                    payload => value.to_json(),
                    kind => value.kind().as_str(),
                },
            )
            .with_context(|| format!("render reply template '{template}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::Outcome;

    #[test]
    fn renders_plain_text_and_kind() {
        let renderer = ReplyRenderer::new();
        let reply = renderer
            .render("got {{ value }} ({{ kind }})", &Value::from(3))
            .expect("render");
        assert_eq!(reply, "got 3 (int)");
    }

    #[test]
    fn structured_payload_is_addressable() {
        let renderer = ReplyRenderer::new();
        let value = Value::from(Outcome::failure("inner"));
        let reply = renderer
            .render("{{ payload.Failure }}", &value)
            .expect("render");
        assert_eq!(reply, "inner");
    }

    #[test]
    fn check_rejects_broken_templates() {
        let renderer = ReplyRenderer::new();
        assert!(renderer.check("{{ value").is_err());
        assert!(renderer.check("plain text").is_ok());
    }
}
