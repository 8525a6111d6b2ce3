//! Form payloads accepted by the POST handlers and their validation rules.
//!
//! Every field is `#[serde(default)]` so that a missing field shows up as an
//! inline "required" error instead of a body rejection.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Inline errors keyed by field name. Errors that belong to no single field
/// are stored under [`NON_FIELD_ERRORS`].
pub type FormErrors = BTreeMap<String, Vec<String>>;

pub const NON_FIELD_ERRORS: &str = "__all__";
pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_CHOICE_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "The two password fields didn't match.";
pub const PASSWORD_MIN_LENGTH: usize = 8;

pub fn add_error(errors: &mut FormErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Run the declarative rules of `form` and collect their messages.
pub fn collect_errors<T: Validate>(form: &T) -> FormErrors {
    let mut errors = FormErrors::new();
    if let Err(validation) = form.validate() {
        for (field, field_errors) in validation.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                add_error(&mut errors, &field.to_string(), message);
            }
        }
    }
    errors
}

fn error_with_message(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error_with_message("required", REQUIRED_MESSAGE));
    }
    Ok(())
}

fn valid_license_number(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    model::validate_license_number(value)
        .map_err(|reason| error_with_message("license_number", reason.to_string()))
}

fn valid_username(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !value.chars().all(allowed) {
        return Err(error_with_message(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

fn valid_password(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    if value.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(error_with_message(
            "password_too_short",
            "This password is too short. It must contain at least 8 characters.",
        ));
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Err(error_with_message(
            "password_entirely_numeric",
            "This password is entirely numeric.",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ManufacturerForm {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "Ensure this value has at most 255 characters.")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "Ensure this value has at most 255 characters.")
    )]
    pub country: String,
}

impl ManufacturerForm {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }
}

/// Car form. `drivers` may be submitted as repeated keys, so this form is
/// built from raw urlencoded pairs with [`CarForm::from_pairs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CarForm {
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "Ensure this value has at most 255 characters.")
    )]
    pub model: String,
    #[validate(required(message = "This field is required."))]
    pub manufacturer: Option<i32>,
    pub drivers: Vec<i32>,
}

impl CarForm {
    /// Parse urlencoded pairs. Values that are not valid IDs are reported as
    /// invalid choices; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> (Self, FormErrors) {
        let mut form = CarForm::default();
        let mut errors = FormErrors::new();

        for (key, value) in pairs {
            let value = value.trim();
            match key.as_str() {
                "model" => form.model = value.to_string(),
                "manufacturer" if value.is_empty() => form.manufacturer = None,
                "manufacturer" => match value.parse() {
                    Ok(id) => form.manufacturer = Some(id),
                    Err(_) => add_error(&mut errors, "manufacturer", INVALID_CHOICE_MESSAGE),
                },
                "drivers" if value.is_empty() => {}
                "drivers" => match value.parse() {
                    Ok(id) => form.drivers.push(id),
                    Err(_) => add_error(
                        &mut errors,
                        "drivers",
                        format!("\u{201c}{value}\u{201d} is not a valid value."),
                    ),
                },
                _ => {}
            }
        }

        (form, errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct DriverCreationForm {
    #[serde(default)]
    #[validate(
        custom(function = "valid_username"),
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "valid_password"))]
    pub password1: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub password2: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    #[serde(default)]
    #[validate(custom(function = "valid_license_number"))]
    pub license_number: String,
}

impl DriverCreationForm {
    /// Field rules plus the cross-field password confirmation check.
    pub fn clean(&self) -> FormErrors {
        let mut errors = collect_errors(self);
        if !self.password1.is_empty()
            && !self.password2.is_empty()
            && self.password1 != self.password2
        {
            add_error(&mut errors, "password2", PASSWORD_MISMATCH_MESSAGE);
        }
        errors
    }

    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            license_number: self.license_number.trim().to_string(),
            ..self
        }
    }

    /// Copy safe to echo back to the client.
    pub fn without_passwords(&self) -> Self {
        Self {
            password1: String::new(),
            password2: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct DriverLicenseUpdateForm {
    #[serde(default)]
    #[validate(custom(function = "valid_license_number"))]
    pub license_number: String,
}

#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Where to go after logging in
    #[serde(default)]
    pub next: Option<String>,
}
