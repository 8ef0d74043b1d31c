//! Observable values, composable validation rules and headless form
//! components.

pub mod form;
pub mod observable;
pub mod utils;
pub mod validation;

pub mod prelude {
    pub use crate::form::{
        Button, Checkbox, Field, FieldOptions, FieldView, Form, FormConfig, InputOptions,
        SubmitOutcome, TextInput,
    };
    pub use crate::observable::{Observable, Subscription, ValueSource, get_value};
    pub use crate::utils::css;
    pub use crate::validation::{
        ChangeDriver, FieldId, FieldState, Rule, Supplied, ValidationContext, ValidationError,
        ValidationEvent, aggregate, equal, equal_with, phone_number, required, rule,
    };
}
