//! Add/edit form for a single record: draft state, required-field validation,
//! one submission at a time, and the success continuation.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use serde_json::Value;
use shared::domain::{ActionType, Record, RecordId};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    error::{FieldError, OperationError, ValidationErrors},
    feedback::Feedback,
    navigation::{Navigator, Route},
    resource::{Resource, ResourceClient, Submission},
};

pub const DEFAULT_SAVE_MESSAGE: &str = "Saved successfully";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormSchema {
    pub resource: Resource,
    pub fields: Vec<FieldSpec>,
}

impl FormSchema {
    pub fn new(resource: Resource, fields: Vec<FieldSpec>) -> Self {
        Self { resource, fields }
    }

    /// The visual-test add/edit form: a single required description.
    pub fn visual_test() -> Self {
        Self::new(Resource::visual_test(), vec![FieldSpec::required("description")])
    }

    /// Blank or whitespace-only required fields fail.
    pub fn validate(&self, draft: &Record) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for field in self.fields.iter().filter(|f| f.required) {
            if draft.text(&field.name).trim().is_empty() {
                errors.add(field.name.clone(), FieldError::Required);
            }
        }
        errors.into_result()
    }

    /// Keeps only the fields this form edits.
    fn project(&self, record: &Record) -> Record {
        self.fields
            .iter()
            .filter_map(|f| record.get(&f.name).map(|v| (f.name.clone(), v.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(RecordId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Record),
    Failed(OperationError),
    /// A save is outstanding; mode and draft were left alone.
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Accepted by the server; the continuation has already run.
    Saved,
    /// Nothing was sent.
    Invalid(ValidationErrors),
    /// Server answered `status=false`; the draft is untouched.
    Rejected(String),
    Failed(OperationError),
    /// Another save on this form is still outstanding.
    Busy,
}

struct FormState {
    mode: FormMode,
    draft: Record,
}

pub struct FormController {
    client: Arc<dyn ResourceClient>,
    schema: FormSchema,
    feedback: Feedback,
    navigator: Arc<dyn Navigator>,
    return_route: Route,
    success_delay: Duration,
    state: Mutex<FormState>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the save finishes or its future is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FormController {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        schema: FormSchema,
        feedback: Feedback,
        navigator: Arc<dyn Navigator>,
        return_route: Route,
        success_delay: Duration,
    ) -> Self {
        Self {
            client,
            schema,
            feedback,
            navigator,
            return_route,
            success_delay,
            state: Mutex::new(FormState {
                mode: FormMode::Create,
                draft: Record::new(),
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn mode(&self) -> FormMode {
        self.state.lock().await.mode.clone()
    }

    pub async fn draft(&self) -> Record {
        self.state.lock().await.draft.clone()
    }

    pub async fn set_field(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.state.lock().await.draft.set(field, value);
    }

    /// Back to an empty create form.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.mode = FormMode::Create;
        state.draft = Record::new();
    }

    /// Fetches the record into the draft. The form edits `id` from here on,
    /// even when the fetch fails and the draft stays empty.
    pub async fn load(&self, id: RecordId) -> LoadOutcome {
        if self.is_submitting() {
            debug!(resource = %self.schema.resource.name, %id, "load ignored while submitting");
            return LoadOutcome::Busy;
        }
        let result = self.client.fetch_one(&self.schema.resource, &id).await;
        let loaded = match result {
            Ok(envelope) if envelope.status => match envelope.first_record() {
                Some(record) => Ok(record),
                None => Err(OperationError::rejection(
                    envelope.message().or(Some("Record not found")),
                )),
            },
            Ok(envelope) => Err(OperationError::rejection(envelope.message())),
            Err(err) => Err(OperationError::from(err)),
        };

        let mut state = self.state.lock().await;
        state.mode = FormMode::Edit(id.clone());
        match loaded {
            Ok(record) => {
                state.draft = self.schema.project(&record);
                debug!(resource = %self.schema.resource.name, %id, "form loaded");
                LoadOutcome::Loaded(record)
            }
            Err(err) => {
                state.draft = Record::new();
                drop(state);
                self.feedback.error(err.clone());
                LoadOutcome::Failed(err)
            }
        }
    }

    pub async fn validate(&self) -> Result<(), ValidationErrors> {
        let state = self.state.lock().await;
        self.schema.validate(&state.draft)
    }

    pub async fn save(&self) -> SaveOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!(resource = %self.schema.resource.name, "save ignored while submitting");
            return SaveOutcome::Busy;
        };

        let submission = {
            let state = self.state.lock().await;
            if let Err(errors) = self.schema.validate(&state.draft) {
                drop(state);
                self.feedback.error(OperationError::Validation(errors.clone()));
                return SaveOutcome::Invalid(errors);
            }
            let payload = self.schema.project(&state.draft);
            match &state.mode {
                FormMode::Create => Submission::create(payload),
                FormMode::Edit(id) => Submission::action(id.clone(), ActionType::Update, payload),
            }
        };

        match self.client.submit(&self.schema.resource, &submission).await {
            Ok(envelope) if envelope.status => {
                self.feedback
                    .success(envelope.message().unwrap_or(DEFAULT_SAVE_MESSAGE));
                tokio::time::sleep(self.success_delay).await;
                info!(
                    resource = %self.schema.resource.name,
                    route = %self.return_route,
                    "form saved"
                );
                self.navigator.navigate(self.return_route.clone()).await;
                self.reset().await;
                SaveOutcome::Saved
            }
            Ok(envelope) => {
                let err = OperationError::rejection(envelope.message());
                let message = err.user_message();
                self.feedback.error(err);
                SaveOutcome::Rejected(message)
            }
            Err(err) => {
                let err = OperationError::from(err);
                self.feedback.error(err.clone());
                SaveOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
