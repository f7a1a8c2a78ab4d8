//! Field-level validation for the new-member form
//!
//! All rules are pure functions of `(field, raw value)` and operate on the
//! trimmed value. Each returns the message of the first rule that fails, or
//! `None` when the value is acceptable.

use crate::models::{MemberForm, FAMILY_SLOTS};
use crate::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Letters, whitespace and dots only
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\s.]+$").expect("name pattern is valid"));

/// Exactly ten ASCII digits
static MOBILE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("mobile pattern is valid"));

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;
const VILLAGE_MIN: usize = 2;
const VILLAGE_MAX: usize = 100;
const ADDRESS_MIN: usize = 5;
const ADDRESS_MAX: usize = 500;
const REMARK_MAX: usize = 500;
const BUSINESS_MAX: usize = 100;
const AGE_MAX: u64 = 150;

/// Primary (top-level) form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Mobile,
    Village,
    CurrentAddress,
    Remark,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Mobile,
        Field::Village,
        Field::CurrentAddress,
        Field::Remark,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Mobile => "mobile",
            Field::Village => "village",
            Field::CurrentAddress => "currentAddress",
            Field::Remark => "remark",
        }
    }

    /// Raw value of this field on a form
    pub fn value_of(self, form: &MemberForm) -> &str {
        match self {
            Field::Name => &form.name,
            Field::Mobile => &form.mobile,
            Field::Village => &form.village,
            Field::CurrentAddress => &form.current_address,
            Field::Remark => &form.remark,
        }
    }
}

/// Sub-field of a family-member slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FamilyField {
    Name,
    Age,
    BusinessJob,
}

impl FamilyField {
    pub const ALL: [FamilyField; 3] = [FamilyField::Name, FamilyField::Age, FamilyField::BusinessJob];

    pub fn key(self) -> &'static str {
        match self {
            FamilyField::Name => "name",
            FamilyField::Age => "age",
            FamilyField::BusinessJob => "businessJob",
        }
    }
}

/// Path of a form field, as used for validation error keys
///
/// Renders as `"name"`, `"currentAddress"`, `"member3.age"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Primary(Field),
    Family { slot: u8, field: FamilyField },
}

impl FieldPath {
    pub fn family(slot: u8, field: FamilyField) -> Self {
        FieldPath::Family { slot, field }
    }

    /// Every path on the form: five primary fields then 5 x 3 family fields
    pub fn all() -> Vec<FieldPath> {
        let mut paths: Vec<FieldPath> = Field::ALL.into_iter().map(FieldPath::Primary).collect();
        for slot in FAMILY_SLOTS {
            for field in FamilyField::ALL {
                paths.push(FieldPath::family(slot, field));
            }
        }
        paths
    }
}

impl From<Field> for FieldPath {
    fn from(field: Field) -> Self {
        FieldPath::Primary(field)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Primary(field) => f.write_str(field.key()),
            FieldPath::Family { slot, field } => write!(f, "member{}.{}", slot, field.key()),
        }
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(field) = Field::ALL.into_iter().find(|f| f.key() == s) {
            return Ok(FieldPath::Primary(field));
        }

        let unknown = || Error::InvalidInput(format!("Unknown form field: {}", s));

        let (member, sub) = s.split_once('.').ok_or_else(unknown)?;
        let slot: u8 = member
            .strip_prefix("member")
            .and_then(|n| n.parse().ok())
            .filter(|n| FAMILY_SLOTS.contains(n))
            .ok_or_else(unknown)?;
        let field = FamilyField::ALL
            .into_iter()
            .find(|f| f.key() == sub)
            .ok_or_else(unknown)?;

        Ok(FieldPath::family(slot, field))
    }
}

/// Validate a primary form field
pub fn validate_field(field: Field, raw: &str) -> Option<String> {
    let value = raw.trim();
    let len = value.chars().count();

    match field {
        Field::Name => {
            if value.is_empty() {
                return Some("Name is required".to_string());
            }
            name_rules(value, len)
        }
        Field::Mobile => {
            if value.is_empty() {
                return Some("Mobile number is required".to_string());
            }
            if !MOBILE_PATTERN.is_match(value) {
                return Some("Mobile number must be exactly 10 digits".to_string());
            }
            if !value.starts_with(['6', '7', '8', '9']) {
                return Some("Mobile number must start with 6, 7, 8, or 9".to_string());
            }
            None
        }
        Field::Village => {
            if value.is_empty() {
                return Some("Village is required".to_string());
            }
            if len < VILLAGE_MIN {
                return Some("Village name must be at least 2 characters".to_string());
            }
            if len > VILLAGE_MAX {
                return Some("Village name must be less than 100 characters".to_string());
            }
            None
        }
        Field::CurrentAddress => {
            if value.is_empty() {
                return Some("Current address is required".to_string());
            }
            if len < ADDRESS_MIN {
                return Some("Address must be at least 5 characters".to_string());
            }
            if len > ADDRESS_MAX {
                return Some("Address must be less than 500 characters".to_string());
            }
            None
        }
        Field::Remark => {
            if len > REMARK_MAX {
                return Some("Remark must be less than 500 characters".to_string());
            }
            None
        }
    }
}

/// Validate one sub-field of a family member
///
/// Every sub-field is optional on its own; rules only apply to non-empty values.
pub fn validate_family_field(field: FamilyField, raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    let len = value.chars().count();

    match field {
        FamilyField::Name => name_rules(value, len),
        FamilyField::Age => {
            let in_range = value.bytes().all(|b| b.is_ascii_digit())
                && value.parse::<u64>().map(|age| age <= AGE_MAX).unwrap_or(false);
            if in_range {
                None
            } else {
                Some("Age must be a valid number between 0 and 150".to_string())
            }
        }
        FamilyField::BusinessJob => {
            if len > BUSINESS_MAX {
                return Some("Business/Job must be less than 100 characters".to_string());
            }
            None
        }
    }
}

/// Validate a value for any field path
pub fn validate_path(path: &FieldPath, raw: &str) -> Option<String> {
    match path {
        FieldPath::Primary(field) => validate_field(*field, raw),
        FieldPath::Family { field, .. } => validate_family_field(*field, raw),
    }
}

/// Validate a whole form
///
/// Primary fields are always checked. A family slot is checked (all three
/// sub-fields) only when at least one of its sub-fields is non-blank.
pub fn validate_form(form: &MemberForm) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    for field in Field::ALL {
        if let Some(message) = validate_field(field, field.value_of(form)) {
            errors.insert(&FieldPath::Primary(field), message);
        }
    }

    for (slot, member) in form.family_members() {
        if member.is_blank() {
            continue;
        }
        let values = [
            (FamilyField::Name, member.name.as_str()),
            (FamilyField::Age, member.age.as_str()),
            (FamilyField::BusinessJob, member.business_job.as_str()),
        ];
        for (field, value) in values {
            if let Some(message) = validate_family_field(field, value) {
                errors.insert(&FieldPath::family(slot, field), message);
            }
        }
    }

    errors
}

fn name_rules(value: &str, len: usize) -> Option<String> {
    if len < NAME_MIN {
        return Some("Name must be at least 2 characters".to_string());
    }
    if len > NAME_MAX {
        return Some("Name must be less than 100 characters".to_string());
    }
    if !NAME_PATTERN.is_match(value) {
        return Some("Name can only contain letters, spaces, and dots".to_string());
    }
    None
}

/// Map of field path to message, holding only currently-invalid fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.0.insert(path.to_string(), message.into());
    }

    pub fn remove(&mut self, path: &FieldPath) {
        self.0.remove(&path.to_string());
    }

    /// Set or clear the entry for `path` from a validator result
    pub fn apply(&mut self, path: &FieldPath, result: Option<String>) {
        match result {
            Some(message) => self.insert(path, message),
            None => self.remove(path),
        }
    }

    pub fn get(&self, path: &FieldPath) -> Option<&str> {
        self.0.get(&path.to_string()).map(String::as_str)
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.0.contains_key(&path.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) failed validation", self.0.len())
    }
}

impl std::error::Error for ValidationErrors {}
