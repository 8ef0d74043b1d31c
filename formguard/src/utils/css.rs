//! CSS class list helper.

/// Build a class list from optional class names.
///
/// `None` and empty entries are dropped; the rest are joined with single
/// spaces.
///
/// ```ignore
/// let compact = true;
/// assert_eq!(css([Some("field"), compact.then_some("field-compact")]), "field field-compact");
/// ```
pub fn css<'a, I>(classes: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    classes
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|class| !class.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_skips_missing_classes() {
        let x = 41;
        assert_eq!(
            css([Some("base"), Some("active"), (x == 42).then_some("optional")]),
            "base active"
        );
        assert_eq!(
            css([Some("base"), Some("active"), (x + 1 == 42).then_some("optional")]),
            "base active optional"
        );
    }

    #[test]
    fn test_css_empty() {
        assert_eq!(css([None, Some(""), Some("  ")]), "");
    }
}
