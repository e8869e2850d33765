pub mod login;
pub mod registration;

pub use login::{LoginForm, LoginFormFields, login_form};
pub use registration::{RegistrationForm, RegistrationFormFields, registration_form};
