//! Built-in validation rules.

use std::fmt::Display;
use std::sync::{Arc, LazyLock};

use chrono::NaiveDate;
use regex::Regex;

use super::event::ValidationEvent;
use super::rule::{Rule, run_rule};
use crate::observable::{ValueSource, get_value};

/// Message reported by [`required`].
pub const REQUIRED_MESSAGE: &str = "This is a required value and hasn't been supplied.";

/// Message reported by [`phone_number`].
pub const PHONE_NUMBER_MESSAGE: &str = "Value should look like a phone number.";

static PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?([0-9]{3})\)?[-]?([0-9]{3})[-]?([0-9]{4})$")
        .expect("phone number pattern is valid")
});

/// Values that can be checked by [`required`].
///
/// A value is supplied when it is truthy: not `None`, not an empty string,
/// not `false` and not zero.
pub trait Supplied {
    /// Check if the value counts as supplied.
    fn is_supplied(&self) -> bool;
}

impl Supplied for String {
    fn is_supplied(&self) -> bool {
        !self.is_empty()
    }
}

impl Supplied for &str {
    fn is_supplied(&self) -> bool {
        !self.is_empty()
    }
}

/// An unchecked box is unsupplied, so `required` on a checkbox means "must
/// be checked".
impl Supplied for bool {
    fn is_supplied(&self) -> bool {
        *self
    }
}

impl<T: Supplied> Supplied for Option<T> {
    fn is_supplied(&self) -> bool {
        self.as_ref().is_some_and(Supplied::is_supplied)
    }
}

macro_rules! supplied_nonzero {
    ($($ty:ty),*) => {
        $(
            impl Supplied for $ty {
                fn is_supplied(&self) -> bool {
                    *self != 0
                }
            }
        )*
    };
}

supplied_nonzero!(i32, i64, u32, u64, usize);

impl Supplied for f64 {
    fn is_supplied(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Supplied for NaiveDate {
    fn is_supplied(&self) -> bool {
        true
    }
}

/// Run several rules against the same value as one rule.
///
/// Every rule runs, in order, even after an earlier one failed, so all
/// failures are reported. `None` entries are skipped.
///
/// ```ignore
/// let rule = aggregate([equal(&name, "DakotaEmber".to_string()), required(&name)]);
/// ```
pub fn aggregate<I>(rules: I) -> Rule
where
    I: IntoIterator,
    I::Item: Into<Option<Rule>>,
{
    let rules: Vec<Rule> = rules.into_iter().filter_map(Into::into).collect();
    Arc::new(move |event: &ValidationEvent| {
        for rule in &rules {
            run_rule(rule, event);
        }
    })
}

/// Require the value to strictly equal `expected`.
pub fn equal<T>(value: impl Into<ValueSource<T>>, expected: T) -> Rule
where
    T: PartialEq + Display + Clone + Send + Sync + 'static,
{
    let value = value.into();
    Arc::new(move |event: &ValidationEvent| {
        let resolved = get_value(&value);
        if resolved != expected {
            event.fail(format!(
                "The value '{}' doesn't match the required value '{}'.",
                resolved, expected
            ));
        }
    })
}

/// Delegate the comparison to `matcher`.
///
/// `matcher` receives the event and the resolved value, which allows rules
/// like "equal to another field".
pub fn equal_with<T, F>(value: impl Into<ValueSource<T>>, matcher: F) -> Rule
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&ValidationEvent, &T) + Send + Sync + 'static,
{
    let value = value.into();
    Arc::new(move |event: &ValidationEvent| {
        let resolved = get_value(&value);
        matcher(event, &resolved);
    })
}

/// Require the value to be supplied.
///
/// See [`Supplied`] for what counts as supplied.
pub fn required<T>(value: impl Into<ValueSource<T>>) -> Rule
where
    T: Supplied + Clone + Send + Sync + 'static,
{
    let value = value.into();
    Arc::new(move |event: &ValidationEvent| {
        if !get_value(&value).is_supplied() {
            event.fail(REQUIRED_MESSAGE);
        }
    })
}

/// Require the value to look like `###-###-####` or `(###)###-####`.
///
/// Hyphens and the parentheses are optional, so `8005551212` passes. There
/// is no whitespace in the pattern, so `(800) 555-1212` fails.
pub fn phone_number(value: impl Into<ValueSource<String>>) -> Rule {
    let value = value.into();
    Arc::new(move |event: &ValidationEvent| {
        if !PHONE_NUMBER.is_match(&get_value(&value)) {
            event.fail(PHONE_NUMBER_MESSAGE);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::Observable;

    fn failures(rule: &Rule) -> Vec<String> {
        let event = ValidationEvent::new();
        run_rule(rule, &event);
        event.errors()
    }

    #[test]
    fn test_required_fails_for_unsupplied_values() {
        assert_eq!(failures(&required("")), vec![REQUIRED_MESSAGE]);
        assert_eq!(failures(&required(None::<String>)), vec![REQUIRED_MESSAGE]);
        assert_eq!(failures(&required(None::<bool>)), vec![REQUIRED_MESSAGE]);
        assert_eq!(failures(&required(false)), vec![REQUIRED_MESSAGE]);
    }

    #[test]
    fn test_required_passes_for_supplied_values() {
        assert!(failures(&required("x")).is_empty());
        assert!(failures(&required(true)).is_empty());
        assert!(failures(&required(Some("x".to_string()))).is_empty());
        assert!(failures(&required(7_i32)).is_empty());
    }

    #[test]
    fn test_required_reads_observable_at_call_time() {
        let name = Observable::new(String::new());
        let rule = required(&name);
        assert_eq!(failures(&rule), vec![REQUIRED_MESSAGE]);

        name.set("DakotaEmber".to_string());
        assert!(failures(&rule).is_empty());
    }

    #[test]
    fn test_equal_is_strict_and_case_sensitive() {
        let name = Observable::new("dakotaember".to_string());
        let rule = equal(&name, "DakotaEmber".to_string());
        assert_eq!(
            failures(&rule),
            vec!["The value 'dakotaember' doesn't match the required value 'DakotaEmber'."]
        );

        name.set("DakotaEmber".to_string());
        assert!(failures(&rule).is_empty());
    }

    #[test]
    fn test_equal_numbers() {
        assert!(failures(&equal(42_i32, 42)).is_empty());
        assert_eq!(
            failures(&equal(41_i32, 42)),
            vec!["The value '41' doesn't match the required value '42'."]
        );
    }

    #[test]
    fn test_equal_with_delegates_to_matcher() {
        let password = Observable::new("secret".to_string());
        let confirm = Observable::new("secret!".to_string());
        let rule = equal_with(&confirm, {
            let password = password.clone();
            move |event: &ValidationEvent, value: &String| {
                if *value != password.get() {
                    event.fail("Passwords don't match.");
                }
            }
        });

        assert_eq!(failures(&rule), vec!["Passwords don't match."]);
        confirm.set("secret".to_string());
        assert!(failures(&rule).is_empty());
    }

    #[test]
    fn test_phone_number_accepted_shapes() {
        for number in ["800-555-1212", "(800)555-1212", "8005551212", "(800)5551212"] {
            assert!(failures(&phone_number(number)).is_empty(), "{number}");
        }
    }

    #[test]
    fn test_phone_number_rejected_shapes() {
        for number in ["(800) 555-1212", "12345", "", "800-555-12123", "800.555.1212"] {
            assert_eq!(
                failures(&phone_number(number)),
                vec![PHONE_NUMBER_MESSAGE],
                "{number}"
            );
        }
    }

    #[test]
    fn test_aggregate_reports_every_failure_in_order() {
        let name = Observable::new(String::new());
        let rule = aggregate([equal(&name, "DakotaEmber".to_string()), required(&name)]);

        assert_eq!(
            failures(&rule),
            vec![
                "The value '' doesn't match the required value 'DakotaEmber'.".to_string(),
                REQUIRED_MESSAGE.to_string(),
            ]
        );
    }

    #[test]
    fn test_aggregate_skips_none() {
        let rule = aggregate([None, Some(required("")), None, Some(phone_number("1"))]);
        assert_eq!(failures(&rule), vec![REQUIRED_MESSAGE, PHONE_NUMBER_MESSAGE]);
    }

    #[test]
    fn test_aggregate_failure_count_is_sum_of_rules() {
        let rules = vec![
            required(""),
            phone_number("12345"),
            equal(1_i32, 2),
            required(true),
            aggregate([required(false), required(0_i32)]),
        ];
        let expected: usize = rules.iter().map(|rule| failures(rule).len()).sum();
        let expected_messages: Vec<String> = rules.iter().flat_map(failures).collect();

        let combined = aggregate(rules);
        assert_eq!(failures(&combined).len(), expected);
        assert_eq!(failures(&combined), expected_messages);
    }

    #[test]
    fn test_aggregate_continues_after_panicking_rule() {
        let rule = aggregate([crate::validation::rule(|_| panic!("bad rule")), required("")]);
        assert_eq!(
            failures(&rule),
            vec![
                "Validation rule panicked: bad rule".to_string(),
                REQUIRED_MESSAGE.to_string(),
            ]
        );
    }
}
