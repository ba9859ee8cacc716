//! Release name templating

use minijinja::{Environment, UndefinedBehavior, context};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ReleaseError, Result};

/// Matches Go-style field references such as `{{ .Name }}`
static FIELD_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\{\{-?\s*)\.([A-Za-z_])").expect("valid regex"));

/// Renders release names from a chart name and version
///
/// Both `{{ Name }}` and the Go-style `{{ .Name }}` are accepted; lowercase
/// `name` and `version` are available too.
pub struct ReleaseNameTemplate {
    env: Environment<'static>,
    source: String,
}

impl ReleaseNameTemplate {
    /// Parse and validate a template
    pub fn new(template: &str) -> Result<Self> {
        let source = FIELD_REFERENCE.replace_all(template, "${1}${2}").into_owned();

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.template_from_str(&source)?;

        Ok(Self { env, source })
    }

    /// Render the release name for one chart version
    pub fn render(&self, name: &str, version: &str) -> Result<String> {
        let rendered = self.env.render_str(
            &self.source,
            context! {
                Name => name,
                Version => version,
                name => name,
                version => version,
            },
        )?;

        let rendered = rendered.trim().to_string();
        if rendered.is_empty() {
            return Err(ReleaseError::Template {
                message: format!("'{}' renders to an empty release name", self.source),
            });
        }
        Ok(rendered)
    }
}
