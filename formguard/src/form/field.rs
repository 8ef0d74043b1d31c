//! Labelled field wrapping one or more inputs.

use crate::utils::css;
use crate::validation::{FieldId, ValidationContext};

/// Presentation and validation options of a [`Field`].
#[derive(Debug, Clone)]
pub struct FieldOptions {
    /// Custom CSS class applied to the outer element.
    pub class_name: Option<String>,

    /// Reduce the spacing between fields.
    pub compact: bool,

    /// Human readable name shown above the input.
    pub label: Option<String>,

    /// Show the required marker next to the label.
    ///
    /// This is presentation only; use a rule to enforce a value.
    pub required: bool,

    /// Render the error lines. When off, errors still count towards the
    /// form's invalid flag and still set the error-state class.
    pub show_errors: bool,

    /// Collect the errors of the wrapped inputs. When off the field renders
    /// plain markup and errors only reach the form.
    pub validate: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            class_name: None,
            compact: false,
            label: None,
            required: false,
            show_errors: true,
            validate: true,
        }
    }
}

impl FieldOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the custom CSS class.
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Use the compact layout.
    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Set the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Show the required marker.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Render error lines or not.
    pub fn show_errors(mut self, show_errors: bool) -> Self {
        self.show_errors = show_errors;
        self
    }

    /// Collect errors of the wrapped inputs or not.
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// What a rendering layer needs to draw a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldView {
    /// Class list of the outer element.
    pub class_name: String,
    pub label: Option<String>,
    /// Draw the required marker.
    pub required: bool,
    /// Error lines to render, in report order.
    pub errors: Vec<String>,
}

/// Wraps inputs with a label and collects their validation errors.
#[derive(Debug, Clone)]
pub struct Field {
    options: FieldOptions,
    context: ValidationContext,
    inputs: Vec<FieldId>,
}

impl Field {
    /// Create an empty field.
    pub fn new(context: &ValidationContext, options: FieldOptions) -> Self {
        Self {
            options,
            context: context.clone(),
            inputs: Vec::new(),
        }
    }

    /// Add an input's validation to this field.
    ///
    /// Inputs that validate nothing have no [`FieldId`] and are ignored.
    pub fn wrap(mut self, input: Option<FieldId>) -> Self {
        self.inputs.extend(input);
        self
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Committed errors of all wrapped inputs, in input order.
    ///
    /// Always empty when the field doesn't validate.
    pub fn errors(&self) -> Vec<String> {
        if !self.options.validate {
            return Vec::new();
        }

        self.inputs
            .iter()
            .filter_map(|id| self.context.field(*id))
            .flat_map(|state| state.errors)
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    /// Build the render model from the committed state.
    pub fn view(&self) -> FieldView {
        let errors = self.errors();
        let class_name = if self.options.validate {
            css([
                self.options.class_name.as_deref(),
                Some("field"),
                self.options.compact.then_some("field-compact"),
                (!errors.is_empty()).then_some("field-error-state"),
            ])
        } else {
            css([
                self.options.class_name.as_deref(),
                Some("field"),
                self.options.compact.then_some("compact"),
            ])
        };

        FieldView {
            class_name,
            label: self.options.label.clone(),
            required: self.options.required && self.options.label.is_some(),
            errors: if self.options.show_errors {
                errors
            } else {
                Vec::new()
            },
        }
    }
}
