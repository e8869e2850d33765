use std::time::Duration;

use serde::Serialize;

use crate::controller::{FormController, FormOptions, FormResult, Messages, Redirect};
use crate::rules::{self, FieldError};
use crate::validation::FormModel;

#[derive(Clone, Debug, Default, Serialize, formflow_derive::FormModel)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// A login controller. Credentials are kept after success (no reset); the
/// surrounding application is asked to navigate home shortly afterwards.
pub fn login_form() -> FormResult<FormController<LoginForm, FieldError>> {
    let options = FormOptions {
        reset_on_success: false,
        messages: Messages {
            success: "Login successful! Redirecting...".into(),
            failure_prefix: "Login failed: ".into(),
            failure_fallback: "Invalid credentials.".into(),
            network_failure: "Network error. Please try again.".into(),
        },
        redirect: Some(Redirect {
            destination: "/home".into(),
            delay: Duration::from_secs(2),
        }),
    };
    let controller = FormController::new(LoginForm::default(), options);
    let fields = LoginForm::fields();

    controller.register_field_validator(fields.email(), rules::required("Email is required"))?;
    controller.register_field_validator(
        fields.email(),
        rules::email("Please enter a valid email address"),
    )?;
    controller
        .register_field_validator(fields.password(), rules::required("Password is required"))?;

    Ok(controller)
}
