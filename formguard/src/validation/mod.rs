//! Validation rules and the validation context.
//!
//! A [`Rule`] inspects values and reports into a [`ValidationEvent`]: it
//! either does nothing (passed), calls `fail` with a message, or registers
//! asynchronous work with `pending`. The [`ValidationContext`] runs one pass
//! per field, waits for pending work, commits the outcome unless a newer pass
//! for the same field has started, and keeps the form-wide invalid flag.
//!
//! # Example
//!
//! ```ignore
//! use formguard::prelude::*;
//!
//! let context = ValidationContext::new();
//! let name = Observable::new(String::from("DakotaEmber"));
//! let pn = Observable::new(String::from("800-555-1212"));
//!
//! context.register_watching(
//!     Some(aggregate([equal(&name, "DakotaEmber".to_string()), required(&name)])),
//!     &name,
//! );
//! context.register_watching(Some(phone_number(&pn)), &pn);
//!
//! if context.validate().await? {
//!     // Proceed with form submission
//! }
//! ```

mod context;
mod error;
mod event;
mod rule;
mod rules;

pub use context::{ChangeDriver, FieldId, FieldState, ValidationContext};
pub use error::{ValidationError, extract_panic_message};
pub use event::ValidationEvent;
pub use rule::{BoxFuture, Rule, rule};
pub use rules::{
    PHONE_NUMBER_MESSAGE, REQUIRED_MESSAGE, Supplied, aggregate, equal, equal_with, phone_number,
    required,
};
