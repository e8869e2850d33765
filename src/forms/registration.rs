use serde::Serialize;

use crate::controller::{FormController, FormOptions, FormResult, Messages};
use crate::rules::{self, FieldError};
use crate::validation::FormModel;

/// Account-creation form. Address, city, ZIP, and country are optional and
/// never validated.
#[derive(Clone, Debug, Default, Serialize, formflow_derive::FormModel)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone_number: String,
    pub date_of_birth: String,
    pub license_number: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
}

/// A registration controller with the full rule set wired in. Resets its
/// fields after a successful submission so the user gets a blank form.
pub fn registration_form() -> FormResult<FormController<RegistrationForm, FieldError>> {
    let options = FormOptions {
        reset_on_success: true,
        messages: Messages {
            success: "Registration successful! Please check your email to verify your account."
                .into(),
            failure_prefix: "Registration failed: ".into(),
            failure_fallback: "Please try again.".into(),
            network_failure: "Network error. Please try again.".into(),
        },
        redirect: None,
    };
    let controller = FormController::new(RegistrationForm::default(), options);
    let fields = RegistrationForm::fields();

    controller.register_field_validator(
        fields.first_name(),
        rules::required("First name is required"),
    )?;
    controller.register_field_validator(
        fields.last_name(),
        rules::required("Last name is required"),
    )?;
    controller.register_field_validator(fields.email(), rules::required("Email is required"))?;
    controller.register_field_validator(
        fields.email(),
        rules::email("Please enter a valid email address"),
    )?;
    controller
        .register_field_validator(fields.password(), rules::required("Password is required"))?;
    controller.register_field_validator(
        fields.password(),
        rules::min_length(8, "Password must be at least 8 characters long"),
    )?;
    controller.register_field_validator(
        fields.confirm_password(),
        rules::required("Confirm password is required"),
    )?;
    controller.register_field_validator(
        fields.confirm_password(),
        |model: &RegistrationForm, value: &String| {
            if *value != model.password {
                Err(FieldError::new("Passwords do not match"))
            } else {
                Ok(())
            }
        },
    )?;
    controller.register_field_validator(
        fields.phone_number(),
        rules::required("Phone number is required"),
    )?;
    controller.register_field_validator(
        fields.phone_number(),
        rules::phone("Please enter a valid phone number"),
    )?;
    controller.register_field_validator(
        fields.date_of_birth(),
        rules::required("Date of birth is required"),
    )?;
    controller.register_field_validator(
        fields.date_of_birth(),
        rules::minimum_age(
            18,
            "Please enter a valid date of birth",
            "You must be at least 18 years old to register",
        ),
    )?;
    controller.register_field_validator(
        fields.license_number(),
        rules::required("License number is required"),
    )?;

    Ok(controller)
}
