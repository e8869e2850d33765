use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::validation::{FieldLens, FormModel, ValidationError};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Submission lifecycle: `Idle -> Submitting -> {Succeeded | Failed}`.
/// A field edit folds a terminal state back to `Idle`; a new submit attempt
/// moves a terminal state straight to `Submitting`. Validation failure never
/// leaves `Idle`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// User-facing strings for one form's submission outcomes. The failure text
/// shown to the user is always `failure_prefix` followed by either the
/// server-provided message, `failure_fallback`, or `network_failure`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Messages {
    pub success: Cow<'static, str>,
    pub failure_prefix: Cow<'static, str>,
    pub failure_fallback: Cow<'static, str>,
    pub network_failure: Cow<'static, str>,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            success: Cow::Borrowed("Submitted successfully."),
            failure_prefix: Cow::Borrowed("Submission failed: "),
            failure_fallback: Cow::Borrowed("Please try again."),
            network_failure: Cow::Borrowed("Network error. Please try again."),
        }
    }
}

/// Navigation scheduled after a successful submission.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Redirect {
    pub destination: Cow<'static, str>,
    pub delay: Duration,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormOptions {
    /// Create-style forms reset their fields after a successful submission;
    /// login-style forms retain them.
    pub reset_on_success: bool,
    pub messages: Messages,
    pub redirect: Option<Redirect>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldMeta<E> {
    pub dirty: bool,
    pub errors: Vec<E>,
}

impl<E> Default for FieldMeta<E> {
    fn default() -> Self {
        Self {
            dirty: false,
            errors: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot<T, E> {
    pub model: T,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub message: Option<String>,
    pub is_dirty: bool,
    pub is_valid: bool,
    pub field_meta: BTreeMap<FieldKey, FieldMeta<E>>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    PayloadSerialization(String),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::InvalidStateTransition { from, to } => {
                write!(f, "invalid submit state transition: {from:?} -> {to:?}")
            }
            FormError::PayloadSerialization(error) => {
                write!(f, "failed to serialize submit payload: {error}")
            }
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub(crate) type FieldValidatorFn<T, E> = Arc<dyn Fn(&T) -> Result<(), E> + Send + Sync>;
pub(crate) type FormValidatorFn<T, E> = Arc<dyn Fn(&T) -> Vec<(FieldKey, E)> + Send + Sync>;

pub(crate) struct FormState<T, E> {
    pub(crate) id: FormId,
    pub(crate) initial_model: T,
    pub(crate) model: T,
    pub(crate) submit_state: SubmitState,
    pub(crate) submit_count: u32,
    pub(crate) message: Option<String>,
    pub(crate) dirty_fields: BTreeSet<FieldKey>,
    pub(crate) field_meta: BTreeMap<FieldKey, FieldMeta<E>>,
}

impl<T, E> FormState<T, E> {
    pub(crate) fn ensure_meta(&mut self, key: FieldKey) -> &mut FieldMeta<E> {
        self.field_meta.entry(key).or_default()
    }
}

/// Mediates between raw field edits and a submission attempt: validate before
/// any network call, at most one submission in flight per instance.
#[derive(Clone)]
pub struct FormController<T, E>
where
    T: FormModel,
    E: ValidationError,
{
    pub(crate) options: FormOptions,
    pub(crate) state: Arc<RwLock<FormState<T, E>>>,
    pub(crate) field_validators: Arc<RwLock<BTreeMap<FieldKey, Vec<FieldValidatorFn<T, E>>>>>,
    pub(crate) form_validators: Arc<RwLock<Vec<FormValidatorFn<T, E>>>>,
}

impl<T, E> FormController<T, E>
where
    T: FormModel,
    E: ValidationError,
{
    pub fn new(initial: T, options: FormOptions) -> Self {
        Self {
            options,
            state: Arc::new(RwLock::new(FormState {
                id: FormId::next(),
                initial_model: initial.clone(),
                model: initial,
                submit_state: SubmitState::Idle,
                submit_count: 0,
                message: None,
                dirty_fields: BTreeSet::new(),
                field_meta: BTreeMap::new(),
            })),
            field_validators: Arc::new(RwLock::new(BTreeMap::new())),
            form_validators: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Writes one field. Clears any error recorded for that field (and only
    /// that field) without re-running validation, and folds a terminal
    /// submit state back to `Idle`. Accepted while a submission is in flight.
    pub fn set<L>(&self, lens: L, value: L::Value) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        let mut state = write_lock(&self.state, "writing form model")?;
        lens.set(&mut state.model, value);
        let is_dirty = lens.get(&state.model) != lens.get(&state.initial_model);
        if is_dirty {
            state.dirty_fields.insert(key);
        } else {
            state.dirty_fields.remove(&key);
        }
        let meta = state.ensure_meta(key);
        meta.dirty = is_dirty;
        meta.errors.clear();
        if matches!(
            state.submit_state,
            SubmitState::Succeeded | SubmitState::Failed
        ) {
            transition_submit_state(&mut state, SubmitState::Idle)?;
            state.message = None;
        }
        Ok(())
    }

    pub fn reset_to_initial(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        reset_model_fields(&mut state);
        state.submit_state = SubmitState::Idle;
        state.message = None;
        Ok(())
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T, E>> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        let is_valid = state.field_meta.values().all(|meta| meta.errors.is_empty());
        Ok(FormSnapshot {
            model: state.model.clone(),
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            message: state.message.clone(),
            is_dirty: !state.dirty_fields.is_empty(),
            is_valid,
            field_meta: state.field_meta.clone(),
        })
    }

    pub fn submit_state(&self) -> FormResult<SubmitState> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state)
    }

    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(self.submit_state()? == SubmitState::Submitting)
    }

    pub fn message(&self) -> FormResult<Option<String>> {
        Ok(read_lock(&self.state, "reading submit message")?
            .message
            .clone())
    }

    pub fn field_errors<L>(&self, lens: L) -> FormResult<Vec<E>>
    where
        L: FieldLens<T>,
    {
        Ok(read_lock(&self.state, "reading field errors")?
            .field_meta
            .get(&lens.key())
            .map(|meta| meta.errors.clone())
            .unwrap_or_default())
    }

    /// Display text for a field. Later rules win on a shared key, so the
    /// message is taken from the last recorded error.
    pub fn field_error_message<L>(&self, lens: L) -> FormResult<Option<Cow<'static, str>>>
    where
        L: FieldLens<T>,
    {
        Ok(read_lock(&self.state, "reading field error message")?
            .field_meta
            .get(&lens.key())
            .and_then(|meta| meta.errors.last())
            .map(ValidationError::message))
    }

    pub fn field_meta<L>(&self, lens: L) -> FormResult<Option<FieldMeta<E>>>
    where
        L: FieldLens<T>,
    {
        Ok(read_lock(&self.state, "reading field meta")?
            .field_meta
            .get(&lens.key())
            .cloned())
    }
}

pub(crate) fn reset_model_fields<T, E>(state: &mut FormState<T, E>)
where
    T: Clone,
{
    state.model = state.initial_model.clone();
    state.dirty_fields.clear();
    for meta in state.field_meta.values_mut() {
        meta.dirty = false;
        meta.errors.clear();
    }
}

pub(crate) fn transition_submit_state<T, E>(
    state: &mut FormState<T, E>,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Submitting)
            | (SubmitState::Succeeded, SubmitState::Submitting)
            | (SubmitState::Failed, SubmitState::Submitting)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(crate) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(crate) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
