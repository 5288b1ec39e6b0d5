//! Field validation.
//!
//! Every entity implements [`Validate`], which runs the checks that need
//! nothing but the entity itself (blank, null, length, range). Checks that
//! need the store (uniqueness, referenced rows) are added on top by
//! [`Database::full_clean`](crate::schema::Database::full_clean).

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Key used for errors that belong to a group of fields rather than one.
pub const NON_FIELD_ERRORS: &str = "__all__";

pub(crate) const BLANK: &str = "This field cannot be blank.";
pub(crate) const NULL: &str = "This field cannot be null.";

/// Validation failures keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any message was recorded for `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Messages recorded for `field`, empty if there are none.
    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of the fields that failed, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// All `(field, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().flat_map(|(field, messages)| {
            messages
                .iter()
                .map(move |message| (field.as_str(), message.as_str()))
        })
    }

    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Per-field checks that need no access to the store.
pub trait Validate {
    /// Run every field check and collect the failures.
    fn clean_fields(&self) -> ValidationErrors;

    fn validate(&self) -> Result<(), ValidationErrors> {
        self.clean_fields().into_result()
    }
}

/// A text field that must not be blank.
pub(crate) fn required_text(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
    } else {
        max_length(errors, field, value, max);
    }
}

/// A text field that may be blank.
pub(crate) fn max_length(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, len
            ),
        );
    }
}

/// A nullable column that validation still requires.
pub(crate) fn required<T>(errors: &mut ValidationErrors, field: &str, value: Option<&T>) {
    if value.is_none() {
        errors.add(field, NULL);
    }
}

/// An inclusive numeric range.
pub(crate) fn in_range<T>(errors: &mut ValidationErrors, field: &str, value: T, min: T, max: T)
where
    T: PartialOrd + fmt::Display,
{
    if value < min {
        errors.add(
            field,
            format!("Ensure this value is greater than or equal to {}.", min),
        );
    } else if value > max {
        errors.add(
            field,
            format!("Ensure this value is less than or equal to {}.", max),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_errors_are_ok() {
        assert_eq!(ValidationErrors::new().into_result(), Ok(()));
    }

    #[test]
    fn test_required_text_rejects_whitespace() {
        let mut errors = ValidationErrors::new();
        required_text(&mut errors, "name", "   ", 10);
        assert_eq!(errors.messages("name"), [BLANK.to_string()]);
    }

    #[test]
    fn test_max_length_counts_characters() {
        let mut errors = ValidationErrors::new();
        max_length(&mut errors, "name", "B♭♭", 3);
        assert!(errors.is_empty());

        max_length(&mut errors, "name", "B♭♭♭", 3);
        assert_eq!(
            errors.messages("name"),
            ["Ensure this value has at most 3 characters (it has 4).".to_string()]
        );
    }

    #[test]
    fn test_in_range_bounds_are_inclusive() {
        let mut errors = ValidationErrors::new();
        in_range(&mut errors, "bpm", 40, 40, 300);
        in_range(&mut errors, "bpm", 300, 40, 300);
        assert!(errors.is_empty());

        in_range(&mut errors, "bpm", 301, 40, 300);
        assert!(errors.messages("bpm")[0].contains("less than or equal to 300"));
    }

    #[test]
    fn test_display_lists_every_message() {
        let mut errors = ValidationErrors::new();
        errors.add("last_name", BLANK);
        errors.add("first_name", BLANK);
        errors.add("first_name", "second");

        assert_eq!(
            errors.to_string(),
            "first_name: This field cannot be blank.; first_name: second; last_name: This field cannot be blank."
        );
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["first_name", "last_name"]);
    }

    #[test]
    fn test_merge_appends_messages() {
        let mut a = ValidationErrors::new();
        a.add("name", "one");
        let mut b = ValidationErrors::new();
        b.add("name", "two");
        b.add(NON_FIELD_ERRORS, "three");

        a.merge(b);
        assert_eq!(a.messages("name").len(), 2);
        assert!(a.contains(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_serializes_as_field_map() {
        let mut errors = ValidationErrors::new();
        errors.add("name", BLANK);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "name": [BLANK] }));
    }
}
