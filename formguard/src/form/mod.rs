//! Headless form components.
//!
//! These mirror the markup a rendering layer would draw: a [`Form`] owning
//! the [`ValidationContext`], [`Field`]s collecting the errors of the inputs
//! they wrap, and the inputs themselves. Nothing here draws anything; the
//! components expose the state and class lists a renderer needs.

mod field;
mod input;

pub use field::{Field, FieldOptions, FieldView};
pub use input::{Button, Checkbox, InputOptions, TextInput};

use log::debug;

use crate::observable::{ValueSource, get_value};
use crate::utils::css;
use crate::validation::ValidationContext;

/// Form-wide configuration.
#[derive(Debug, Clone)]
pub struct FormConfig {
    /// Custom CSS class applied to the form element.
    pub class_name: Option<String>,

    /// Run a full validation pass when focus leaves an element of the form.
    pub validate_on_blur: ValueSource<bool>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            class_name: None,
            validate_on_blur: ValueSource::Value(false),
        }
    }
}

impl FormConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the custom CSS class.
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Validate on blur, from a plain flag or an observable one.
    pub fn validate_on_blur(mut self, enabled: impl Into<ValueSource<bool>>) -> Self {
        self.validate_on_blur = enabled.into();
        self
    }
}

/// Result of a submit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The form was valid and the handler ran.
    Submitted,
    /// The form was invalid; the handler did not run.
    Blocked,
}

/// A form and the validation context shared by its inputs.
#[derive(Debug, Clone)]
pub struct Form {
    config: FormConfig,
    context: ValidationContext,
}

impl Form {
    /// Create a form with a fresh validation context.
    pub fn new(config: FormConfig) -> Self {
        Self::with_context(config, ValidationContext::new())
    }

    /// Create a form around an existing context.
    pub fn with_context(config: FormConfig, context: ValidationContext) -> Self {
        Self { config, context }
    }

    /// The context to hand to the form's fields and inputs.
    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Class list of the form element.
    pub fn class_name(&self) -> String {
        css([self.config.class_name.as_deref(), Some("form")])
    }

    /// Start validating on change and validate everything once, after all
    /// inputs are registered.
    ///
    /// Must be called from within a tokio runtime; the change driver is
    /// spawned onto it and runs until the form's context is dropped.
    pub async fn mount(&self) {
        if let Some(driver) = self.context.take_change_driver() {
            tokio::spawn(driver.run());
        }
        self.validate().await;
    }

    /// Focus left an element of the form.
    ///
    /// Returns whether a validation pass ran.
    pub async fn blur(&self) -> bool {
        if !get_value(&self.config.validate_on_blur) {
            return false;
        }
        self.validate().await;
        true
    }

    /// Run `on_submit` unless the form is currently invalid.
    pub fn submit<F: FnOnce()>(&self, on_submit: F) -> SubmitOutcome {
        if self.context.is_invalid() {
            debug!("Submit blocked, form is invalid");
            return SubmitOutcome::Blocked;
        }
        on_submit();
        SubmitOutcome::Submitted
    }

    async fn validate(&self) {
        match self.context.validate().await {
            Ok(valid) => debug!("Form pass finished, valid: {}", valid),
            // An interrupted pass is replaced by the newer one.
            Err(err) => debug!("Ignoring form pass: {}", err),
        }
    }
}
