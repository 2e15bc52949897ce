//! Handlebars wrapper holding the bundle templates.
//!
//! Templates emit JavaScript, so HTML escaping is disabled, and strict mode
//! turns a missing context field into a render error instead of an empty
//! string in the generated script.

use edgelink_core::{Error, Result};
use handlebars::Handlebars;
use serde::Serialize;

/// Name of the top-level bundle template.
pub const BUNDLE_TEMPLATE: &str = "bundle";

/// Template engine with the bundle templates registered.
#[derive(Debug)]
pub struct TemplateEngine<'a> {
    handlebars: Handlebars<'a>,
}

impl TemplateEngine<'_> {
    /// Creates an engine with the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns `Error::TemplateError` if a built-in template fails to parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgelink_linker::template_engine::TemplateEngine;
    ///
    /// let engine = TemplateEngine::new().unwrap();
    /// assert!(engine.has_template("bundle"));
    /// ```
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string(BUNDLE_TEMPLATE, include_str!("../templates/bundle.js.hbs"))
            .map_err(|e| Error::TemplateError {
                message: format!("Failed to register bundle template: {e}"),
            })?;

        handlebars
            .register_partial("polyfills", include_str!("../templates/polyfills.js.hbs"))
            .map_err(|e| Error::TemplateError {
                message: format!("Failed to register polyfills partial: {e}"),
            })?;

        Ok(Self { handlebars })
    }

    /// Returns `true` if a template named `name` is registered.
    #[must_use]
    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Renders `template_name` with `context`.
    ///
    /// # Errors
    ///
    /// Returns `Error::TemplateError` if the template is unknown or a field
    /// it references is missing from the context.
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(template_name, context)
            .map_err(|e| Error::TemplateError {
                message: format!("Template rendering failed: {e}"),
            })
    }
}
