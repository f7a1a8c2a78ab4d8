//! Entry form state with live validation
//!
//! Each field change re-validates only that field and adds or removes its
//! entry in the error map. Submission re-validates the whole form and replaces
//! the map wholesale.

use crate::models::MemberForm;
use crate::validation::{self, FamilyField, Field, FieldPath, ValidationErrors};
use crate::{Error, Result};

/// A form being filled in, plus the errors currently shown next to its fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    form: MemberForm,
    errors: ValidationErrors,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing form values without validating them yet
    pub fn from_form(form: MemberForm) -> Self {
        Self {
            form,
            errors: ValidationErrors::new(),
        }
    }

    pub fn form(&self) -> &MemberForm {
        &self.form
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Update one field and re-validate just that field
    pub fn set_field(&mut self, path: &FieldPath, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let result = validation::validate_path(path, &value);

        let slot = field_mut(&mut self.form, path)
            .ok_or_else(|| Error::InvalidInput(format!("No such form field: {}", path)))?;
        *slot = value;

        self.errors.apply(path, result);
        Ok(())
    }

    /// Validate the whole form, replacing the error map
    ///
    /// Returns true when the form is valid.
    pub fn validate_all(&mut self) -> bool {
        self.errors = validation::validate_form(&self.form);
        self.errors.is_empty()
    }

    /// Clear all values and errors
    pub fn reset(&mut self) {
        self.form = MemberForm::default();
        self.errors.clear();
    }
}

fn field_mut<'a>(form: &'a mut MemberForm, path: &FieldPath) -> Option<&'a mut String> {
    match path {
        FieldPath::Primary(field) => Some(match field {
            Field::Name => &mut form.name,
            Field::Mobile => &mut form.mobile,
            Field::Village => &mut form.village,
            Field::CurrentAddress => &mut form.current_address,
            Field::Remark => &mut form.remark,
        }),
        FieldPath::Family { slot, field } => {
            let member = form.slot_mut(*slot)?;
            Some(match field {
                FamilyField::Name => &mut member.name,
                FamilyField::Age => &mut member.age,
                FamilyField::BusinessJob => &mut member.business_job,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_field_adds_then_clears_error() {
        let mut state = FormState::new();
        let mobile = FieldPath::Primary(Field::Mobile);

        state.set_field(&mobile, "12345").unwrap();
        assert_eq!(state.form().mobile, "12345");
        assert_eq!(
            state.errors().get(&mobile),
            Some("Mobile number must be exactly 10 digits")
        );

        state.set_field(&mobile, "9876543210").unwrap();
        assert!(state.errors().is_empty());
    }

    #[test]
    fn test_set_family_field_only_touches_that_entry() {
        let mut state = FormState::new();
        let age = FieldPath::family(4, FamilyField::Age);

        state.set_field(&age, "abc").unwrap();
        assert_eq!(state.form().member4.age, "abc");
        assert_eq!(state.errors().len(), 1);
        assert!(state.errors().contains(&age));
        // Incremental validation does not report the untouched required fields
        assert!(!state.errors().contains(&FieldPath::Primary(Field::Name)));
    }

    #[test]
    fn test_set_field_rejects_invalid_slot() {
        let mut state = FormState::new();
        let result = state.set_field(&FieldPath::family(9, FamilyField::Name), "Ravi");
        assert!(result.is_err());
        assert!(state.errors().is_empty());
    }

    #[test]
    fn test_validate_all_replaces_errors() {
        let mut state = FormState::new();
        state
            .set_field(&FieldPath::family(2, FamilyField::Age), "999")
            .unwrap();

        assert!(!state.validate_all());
        // name, mobile, village, currentAddress are required; member2.age is invalid
        assert_eq!(state.errors().len(), 5);

        state.reset();
        assert_eq!(state, FormState::new());
    }
}
