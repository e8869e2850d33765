use std::fmt::{Display, Formatter};
use std::future::Future;

use futures_timer::Delay;
use serde::Serialize;

use crate::controller::{
    FormController, FormError, FormResult, SubmitState, read_lock, reset_model_fields,
    transition_submit_state, write_lock,
};
use crate::validation::{FormModel, ValidationError};

/// What the remote endpoint said about an attempt that completed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmitResponse {
    Accepted,
    Rejected { message: Option<String> },
}

/// The request never completed (offline, DNS, caller-imposed timeout). The
/// detail is logged for diagnostics and never shown to the user.
#[derive(Debug)]
pub struct TransportError(String);

impl TransportError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for TransportError {}

/// How a submit request was handled. A request while another submission is in
/// flight is an idempotent no-op, not an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitDisposition {
    AlreadyInFlight,
    Invalid,
    Settled,
}

/// Seam to the surrounding application's routing. The controller only ever
/// says "navigate to this destination".
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &str);
}

impl<T, E> FormController<T, E>
where
    T: FormModel,
    E: ValidationError,
{
    /// One submission attempt, per the lifecycle contract:
    /// no-op while in flight, full validation before any network call, then
    /// `Submitting` until the submit future settles. Every completion path
    /// leaves `Submitting`, so the busy flag cannot stick.
    pub async fn submit_async<F, Fut>(&self, f: F) -> FormResult<SubmitDisposition>
    where
        F: FnOnce(&T) -> Fut + 'static,
        Fut: Future<Output = Result<SubmitResponse, TransportError>> + Send + 'static,
    {
        {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if state.submit_state == SubmitState::Submitting {
                return Ok(SubmitDisposition::AlreadyInFlight);
            }
            state.submit_count = state.submit_count.saturating_add(1);
        }

        if !self.validate_form()? {
            let mut state = write_lock(&self.state, "settling validation failure")?;
            transition_submit_state(&mut state, SubmitState::Idle)?;
            return Ok(SubmitDisposition::Invalid);
        }

        let model = {
            let mut state = write_lock(&self.state, "entering submitting state")?;
            transition_submit_state(&mut state, SubmitState::Submitting)?;
            state.message = None;
            state.model.clone()
        };
        let outcome = f(&model).await;

        let mut state = write_lock(&self.state, "settling submit")?;
        match outcome {
            Ok(SubmitResponse::Accepted) => {
                transition_submit_state(&mut state, SubmitState::Succeeded)?;
                state.message = Some(self.options.messages.success.clone().into_owned());
                if self.options.reset_on_success {
                    reset_model_fields(&mut state);
                }
            }
            Ok(SubmitResponse::Rejected { message }) => {
                transition_submit_state(&mut state, SubmitState::Failed)?;
                let detail = message
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| self.options.messages.failure_fallback.clone().into_owned());
                state.message = Some(format!("{}{detail}", self.options.messages.failure_prefix));
            }
            Err(error) => {
                transition_submit_state(&mut state, SubmitState::Failed)?;
                log::warn!(
                    "form {:?} submit transport failure: {error}",
                    state.id
                );
                state.message = Some(format!(
                    "{}{}",
                    self.options.messages.failure_prefix, self.options.messages.network_failure
                ));
            }
        }
        Ok(SubmitDisposition::Settled)
    }

    /// `submit_async`, then the optional success-side navigation: when the
    /// attempt succeeded and the form configures a redirect, waits out the
    /// configured delay and hands the destination to the navigator.
    pub async fn submit_with_redirect<F, Fut, N>(
        &self,
        f: F,
        navigator: &N,
    ) -> FormResult<SubmitDisposition>
    where
        F: FnOnce(&T) -> Fut + 'static,
        Fut: Future<Output = Result<SubmitResponse, TransportError>> + Send + 'static,
        N: Navigator + ?Sized,
    {
        let disposition = self.submit_async(f).await?;
        if disposition == SubmitDisposition::Settled
            && self.submit_state()? == SubmitState::Succeeded
        {
            if let Some(redirect) = self.options.redirect.as_ref() {
                Delay::new(redirect.delay).await;
                navigator.navigate(&redirect.destination);
            }
        }
        Ok(disposition)
    }
}

impl<T, E> FormController<T, E>
where
    T: FormModel + Serialize,
    E: ValidationError,
{
    /// Current model as the JSON request body. Wire field names come from the
    /// model's serde attributes, so keys match the remote contract exactly.
    pub fn payload(&self) -> FormResult<serde_json::Value> {
        let state = read_lock(&self.state, "serializing submit payload")?;
        serde_json::to_value(&state.model)
            .map_err(|error| FormError::PayloadSerialization(error.to_string()))
    }
}
