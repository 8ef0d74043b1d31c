//! The "Form Validation 101" sample form.

use std::fmt::{self, Write};
use std::time::Duration;

use formguard::prelude::*;
use log::{info, warn};
use serde::Serialize;

/// Message reported by the delayed terms-of-service rule.
pub const TERMS_MESSAGE: &str = "You must agree to the terms of service";

/// Features of the sample that can be switched on and off.
#[derive(Debug, Clone)]
pub struct SampleOptions {
    /// Render error lines under the Name and Phone fields.
    pub show_errors: bool,
    /// Validate the whole form when focus leaves an input.
    pub validate_on_blur: Observable<bool>,
    /// Revalidate Name and Phone as they are edited.
    pub validate_on_change: bool,
    /// How long the terms-of-service check takes.
    pub terms_delay: Duration,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            show_errors: true,
            validate_on_blur: Observable::new(true),
            validate_on_change: true,
            terms_delay: Duration::from_millis(100),
        }
    }
}

/// Data "submitted" by the form.
#[derive(Debug, Clone, Serialize)]
pub struct FieldData {
    pub address: String,
    pub inc: bool,
    pub name: String,
    pub pn: String,
}

/// All state of the sample form.
///
/// Every input is controlled: the observables below are the only place the
/// values live, and the setters stand in for the inputs' change handlers.
pub struct SampleForm {
    pub form: Form,
    pub address: Observable<String>,
    pub agree: Observable<bool>,
    pub inc: Observable<bool>,
    pub name: Observable<String>,
    pub pn: Observable<String>,
    name_field: Field,
    phone_field: Field,
    address_field: Field,
    inputs: Vec<TextInput>,
    mailing_list: Checkbox,
    terms: Checkbox,
    clear_button: Button,
    submit_button: Button,
}

/// Rule that checks the terms-of-service box after `delay`, like a remote
/// check would.
fn terms_rule(agree: &Observable<bool>, delay: Duration) -> Rule {
    let agree = agree.clone();
    rule(move |event| {
        let agree = agree.clone();
        let handle = event.clone();
        event.pending(async move {
            tokio::time::sleep(delay).await;
            if !agree.get() {
                handle.fail(TERMS_MESSAGE);
            }
        });
    })
}

impl SampleForm {
    /// Build the form and register every input with its context.
    pub fn new(options: &SampleOptions) -> Self {
        let form = Form::new(
            FormConfig::new()
                .class_name("flex-grow")
                .validate_on_blur(&options.validate_on_blur),
        );
        let context = form.context().clone();

        let address = Observable::new(String::new());
        let agree = Observable::new(false);
        let inc = Observable::new(true);
        let name = Observable::new(String::from("DakotaEmber"));
        let pn = Observable::new(String::from("800-555-1212"));

        let name_input = TextInput::new(
            &context,
            &name,
            InputOptions::new()
                .class_name("flex-grow")
                .validate_on_change(options.validate_on_change)
                .validation(aggregate([
                    equal(&name, "DakotaEmber".to_string()),
                    required(&name),
                ])),
        );
        let name_field = Field::new(
            &context,
            FieldOptions::new()
                .label("Name")
                .required(true)
                .show_errors(options.show_errors),
        )
        .wrap(name_input.field_id());

        let pn_input = TextInput::new(
            &context,
            &pn,
            InputOptions::new()
                .class_name("flex-grow")
                .validate_on_change(options.validate_on_change)
                .validation(phone_number(&pn)),
        );
        let phone_field = Field::new(
            &context,
            FieldOptions::new()
                .label("Phone")
                .required(true)
                .show_errors(options.show_errors),
        )
        .wrap(pn_input.field_id());

        // Address takes part in no rule, so typing in it runs nothing.
        let address_input = TextInput::new(
            &context,
            &address,
            InputOptions::new()
                .class_name("flex-grow")
                .validate_on_change(false),
        );
        let address_field = Field::new(&context, FieldOptions::new().label("Address").validate(false))
            .wrap(address_input.field_id());

        let mailing_list = Checkbox::new(
            &context,
            &inc,
            InputOptions::new()
                .class_name("flex-self-start")
                .validate_on_change(false),
        )
        .with_label("Include me on the mailing list");

        let terms = Checkbox::new(
            &context,
            &agree,
            InputOptions::new()
                .class_name("flex-self-start")
                .validation(terms_rule(&agree, options.terms_delay)),
        )
        .with_label("I agree to the terms of service");

        Self {
            clear_button: Button::new("Clear"),
            submit_button: Button::new("Submit").disabled(context.invalid()),
            form,
            address,
            agree,
            inc,
            name,
            pn,
            name_field,
            phone_field,
            address_field,
            inputs: vec![name_input, pn_input, address_input],
            mailing_list,
            terms,
        }
    }

    /// Snapshot of the current values.
    pub fn field_data(&self) -> FieldData {
        FieldData {
            address: self.address.get(),
            inc: self.inc.get(),
            name: self.name.get(),
            pn: self.pn.get(),
        }
    }

    /// Reset the text values without going through the inputs.
    pub fn clear(&self) -> bool {
        self.clear_button.click(|| {
            self.address.set(String::new());
            self.name.set(String::new());
            self.pn.set(String::new());
        })
    }

    /// Click Submit. Returns the submitted data when the form was valid.
    ///
    /// Nothing is sent anywhere; the data is only logged.
    pub fn submit(&self) -> Option<FieldData> {
        let mut submitted = None;
        let clicked = self.submit_button.click(|| {
            self.form.submit(|| {
                let data = self.field_data();
                match serde_json::to_string(&data) {
                    Ok(json) => info!("submitting form ... with {}", json),
                    Err(e) => info!("submitting form ... ({})", e),
                }
                submitted = Some(data);
            });
        });

        if !clicked {
            info!("Submit is disabled while the form is invalid");
        }
        submitted
    }

    /// Draw the form as text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Err(e) = self.write_to(&mut out) {
            warn!("Rendering form failed: {}", e);
        }
        out
    }

    fn write_to(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "[{}]", self.form.class_name())?;

        for (field, input) in [&self.name_field, &self.phone_field, &self.address_field]
            .into_iter()
            .zip(&self.inputs)
        {
            let view = field.view();
            let marker = if view.required { " *" } else { "" };
            writeln!(
                out,
                "  {}{}: {:?}  [{}]",
                view.label.as_deref().unwrap_or(""),
                marker,
                input.value(),
                view.class_name
            )?;
            for error in &view.errors {
                writeln!(out, "      ! {}", error)?;
            }
        }

        for checkbox in [&self.mailing_list, &self.terms] {
            let mark = if checkbox.is_checked() { "x" } else { " " };
            writeln!(
                out,
                "  [{}] {}",
                mark,
                checkbox.label().unwrap_or(checkbox.id())
            )?;
        }

        let state = if self.submit_button.is_disabled() {
            "disabled"
        } else {
            "enabled"
        };
        writeln!(
            out,
            "  ({}) ({} {})",
            self.clear_button.label(),
            self.submit_button.label(),
            state
        )
    }
}
