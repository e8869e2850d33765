//! Headless form-state engine: field edits, rule-based validation, and the
//! submit lifecycle for data-entry forms, with rendering and transport left
//! to the caller.

pub mod controller;
pub mod forms;
pub mod rules;
pub mod submit;
pub mod validation;


pub use controller::{
    FieldKey, FieldMeta, FormController, FormError, FormId, FormOptions, FormResult, FormSnapshot,
    Messages, Redirect, SubmitState,
};
pub use formflow_derive::FormModel;
pub use rules::FieldError;
pub use submit::{Navigator, SubmitDisposition, SubmitResponse, TransportError};
pub use validation::{FieldLens, FieldValidator, FormModel, FormValidator, ValidationError};
