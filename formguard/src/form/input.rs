//! Headless input components.
//!
//! Inputs are controlled: they never change their value themselves. The
//! owner updates the backing [`Observable`](crate::observable::Observable)
//! from its change handler and the input reads the current value on demand.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::observable::{ValueSource, get_value};
use crate::utils::css;
use crate::validation::{FieldId, Rule, ValidationContext};

static NEXT_CHECKBOX: AtomicU64 = AtomicU64::new(0);

/// Validation wiring for an input.
#[derive(Clone)]
pub struct InputOptions {
    /// Custom CSS class added to the input.
    pub class_name: Option<String>,

    /// Revalidate whenever the input's value changes.
    ///
    /// Turn this off for inputs whose value takes part in no rule, so typing
    /// doesn't run rules needlessly.
    pub validate_on_change: bool,

    /// Rule run for this input on every validation pass.
    pub validation: Option<Rule>,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            class_name: None,
            validate_on_change: true,
            validation: None,
        }
    }
}

impl InputOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the custom CSS class.
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Enable or disable validation on change.
    pub fn validate_on_change(mut self, enabled: bool) -> Self {
        self.validate_on_change = enabled;
        self
    }

    /// Set the validation rule.
    pub fn validation(mut self, rule: Rule) -> Self {
        self.validation = Some(rule);
        self
    }
}

impl fmt::Debug for InputOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputOptions")
            .field("class_name", &self.class_name)
            .field("validate_on_change", &self.validate_on_change)
            .field("validation", &self.validation.is_some())
            .finish()
    }
}

/// Register the input with the context when it validates anything.
///
/// The value is only watched when it is observable and change validation is
/// on.
fn attach<T>(
    context: &ValidationContext,
    value: &ValueSource<T>,
    options: &InputOptions,
) -> Option<FieldId>
where
    T: Clone + 'static,
{
    if options.validation.is_none() && !options.validate_on_change {
        return None;
    }

    let rule = options.validation.clone();
    match value.as_observable() {
        Some(observable) if options.validate_on_change => {
            Some(context.register_watching(rule, observable))
        }
        _ => Some(context.register(rule)),
    }
}

/// Single-line text input.
#[derive(Debug, Clone)]
pub struct TextInput {
    value: ValueSource<String>,
    class_name: String,
    field: Option<FieldId>,
}

impl TextInput {
    /// Create a text input showing `value`.
    pub fn new(
        context: &ValidationContext,
        value: impl Into<ValueSource<String>>,
        options: InputOptions,
    ) -> Self {
        let value = value.into();
        let field = attach(context, &value, &options);
        Self {
            class_name: css([options.class_name.as_deref(), Some("textfield")]),
            value,
            field,
        }
    }

    /// Current text.
    pub fn value(&self) -> String {
        get_value(&self.value)
    }

    /// Class list of the input element.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Field registered for this input, if it validates anything.
    pub fn field_id(&self) -> Option<FieldId> {
        self.field
    }
}

/// Checkbox with an optional label.
#[derive(Debug, Clone)]
pub struct Checkbox {
    id: String,
    checked: ValueSource<bool>,
    label: Option<String>,
    class_name: String,
    field: Option<FieldId>,
}

impl Checkbox {
    /// Create a checkbox reflecting `checked`.
    pub fn new(
        context: &ValidationContext,
        checked: impl Into<ValueSource<bool>>,
        options: InputOptions,
    ) -> Self {
        let checked = checked.into();
        let field = attach(context, &checked, &options);
        let id = NEXT_CHECKBOX.fetch_add(1, Ordering::SeqCst) + 1;
        Self {
            id: format!("checkbox_{}", id),
            class_name: css([options.class_name.as_deref(), Some("checkbox")]),
            checked,
            label: None,
            field,
        }
    }

    /// Set the label shown next to the box.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Element id linking the label to the box.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current checked state.
    pub fn is_checked(&self) -> bool {
        get_value(&self.checked)
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Class list of the wrapping element.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Field registered for this checkbox, if it validates anything.
    pub fn field_id(&self) -> Option<FieldId> {
        self.field
    }
}

/// Push button whose disabled state may be observable.
#[derive(Debug, Clone)]
pub struct Button {
    label: String,
    disabled: ValueSource<bool>,
}

impl Button {
    /// Create an enabled button.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            disabled: ValueSource::Value(false),
        }
    }

    /// Bind the disabled state, e.g. to a form's invalid flag.
    pub fn disabled(mut self, disabled: impl Into<ValueSource<bool>>) -> Self {
        self.disabled = disabled.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current disabled state.
    pub fn is_disabled(&self) -> bool {
        get_value(&self.disabled)
    }

    /// Run `on_click` unless the button is disabled.
    ///
    /// Returns whether the handler ran.
    pub fn click<F: FnOnce()>(&self, on_click: F) -> bool {
        if self.is_disabled() {
            return false;
        }
        on_click();
        true
    }
}
