//! Row actions inside a table: accept, assign, approve, reject, update.
//!
//! Each row id has its own button state machine:
//! `Idle -> Submitting -> Idle` on failure, `-> Resolved` on success. Only a
//! server response leaves `Submitting`.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use async_trait::async_trait;
use shared::domain::{ActionType, Record, RecordId};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    error::OperationError,
    feedback::Feedback,
    navigation::{Navigator, Route},
    resource::{Filters, Resource, ResourceClient, Submission},
};

/// What a successful action does to the owning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEffect {
    /// Terminal actions: the row leaves the active list.
    Remove,
    /// Continuing actions: the user moves on to the row's detail screen.
    OpenDetail,
    /// The row stays, with the submitted fields applied.
    Replace,
}

pub fn row_effect(action: ActionType) -> RowEffect {
    match action {
        ActionType::Accept | ActionType::Approve | ActionType::Reject => RowEffect::Remove,
        ActionType::Assign => RowEffect::OpenDetail,
        ActionType::Update => RowEffect::Replace,
    }
}

fn default_success_message(action: ActionType) -> &'static str {
    match action {
        ActionType::Accept => "Item accepted",
        ActionType::Assign => "Item assigned",
        ActionType::Approve => "Request approved",
        ActionType::Reject => "Request rejected",
        ActionType::Update => "Updated successfully",
    }
}

/// Table-level mutations the controller is allowed to perform. Passed in
/// explicitly at construction.
#[async_trait]
pub trait TableCallbacks: Send + Sync {
    async fn replace_rows(&self, rows: Vec<Record>);
    async fn remove_row(&self, id: &RecordId);
    async fn replace_row(&self, id: &RecordId, row: Record);
    async fn open_detail(&self, id: &RecordId);
}

/// Row collection backing one table screen.
pub struct TableState {
    id_field: String,
    rows: Mutex<Vec<Record>>,
    navigator: Arc<dyn Navigator>,
    detail_route: String,
}

impl TableState {
    /// `detail_route` is a template; `{id}` is replaced by the row id.
    pub fn new(
        id_field: impl Into<String>,
        navigator: Arc<dyn Navigator>,
        detail_route: impl Into<String>,
    ) -> Self {
        Self {
            id_field: id_field.into(),
            rows: Mutex::new(Vec::new()),
            navigator,
            detail_route: detail_route.into(),
        }
    }

    pub fn with_rows(self, rows: Vec<Record>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..self
        }
    }

    pub async fn rows(&self) -> Vec<Record> {
        self.rows.lock().await.clone()
    }

    pub async fn contains(&self, id: &RecordId) -> bool {
        self.rows
            .lock()
            .await
            .iter()
            .any(|row| row.id(&self.id_field).as_ref() == Some(id))
    }

    pub async fn find(&self, id: &RecordId) -> Option<Record> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|row| row.id(&self.id_field).as_ref() == Some(id))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

#[async_trait]
impl TableCallbacks for TableState {
    async fn replace_rows(&self, rows: Vec<Record>) {
        *self.rows.lock().await = rows;
    }

    async fn remove_row(&self, id: &RecordId) {
        self.rows
            .lock()
            .await
            .retain(|row| row.id(&self.id_field).as_ref() != Some(id));
    }

    async fn replace_row(&self, id: &RecordId, row: Record) {
        let mut rows = self.rows.lock().await;
        if let Some(slot) = rows
            .iter_mut()
            .find(|r| r.id(&self.id_field).as_ref() == Some(id))
        {
            *slot = row;
        }
    }

    async fn open_detail(&self, id: &RecordId) {
        self.navigator
            .navigate(Route::from_template(&self.detail_route, id))
            .await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Idle,
    Submitting,
    Resolved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Completed(RowEffect),
    /// Server answered `status=false`; the row is untouched.
    Rejected(String),
    Failed(OperationError),
    /// An action on this row is still outstanding.
    Busy,
    /// The row's button was already resolved by an earlier success.
    AlreadyResolved,
    /// The row carries no usable id.
    MissingId,
}

impl ActionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed(_))
    }
}

#[derive(Default)]
struct RowActivity {
    in_flight: HashSet<RecordId>,
    resolved: HashSet<RecordId>,
}

/// Releases a row's in-flight mark when the action ends or is dropped.
struct RowGuard<'a> {
    activity: &'a StdMutex<RowActivity>,
    id: RecordId,
}

impl<'a> RowGuard<'a> {
    fn acquire(activity: &'a StdMutex<RowActivity>, id: &RecordId) -> Result<Self, ActionOutcome> {
        let mut guard = activity.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.resolved.contains(id) {
            return Err(ActionOutcome::AlreadyResolved);
        }
        if !guard.in_flight.insert(id.clone()) {
            return Err(ActionOutcome::Busy);
        }
        Ok(Self {
            activity,
            id: id.clone(),
        })
    }

    fn resolve(&self) {
        self.activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .resolved
            .insert(self.id.clone());
    }
}

impl Drop for RowGuard<'_> {
    fn drop(&mut self) {
        self.activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .remove(&self.id);
    }
}

pub struct ListActionController {
    client: Arc<dyn ResourceClient>,
    resource: Resource,
    table: Arc<dyn TableCallbacks>,
    feedback: Feedback,
    activity: StdMutex<RowActivity>,
}

impl ListActionController {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        resource: Resource,
        table: Arc<dyn TableCallbacks>,
        feedback: Feedback,
    ) -> Self {
        Self {
            client,
            resource,
            table,
            feedback,
            activity: StdMutex::new(RowActivity::default()),
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn button_state(&self, id: &RecordId) -> ButtonState {
        let activity = self.activity.lock().unwrap_or_else(PoisonError::into_inner);
        if activity.in_flight.contains(id) {
            ButtonState::Submitting
        } else if activity.resolved.contains(id) {
            ButtonState::Resolved
        } else {
            ButtonState::Idle
        }
    }

    /// Reloads the table. Resolved buttons from the previous listing are
    /// forgotten.
    pub async fn refresh(&self, filters: &Filters) -> Result<usize, OperationError> {
        let result = self.client.fetch_many(&self.resource, filters).await;
        let err = match result {
            Ok(envelope) if envelope.status => {
                let rows = envelope.records();
                let count = rows.len();
                self.table.replace_rows(rows).await;
                self.activity
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .resolved
                    .clear();
                debug!(resource = %self.resource.name, count, "table refreshed");
                return Ok(count);
            }
            Ok(envelope) => OperationError::rejection(envelope.message()),
            Err(err) => OperationError::from(err),
        };
        self.feedback.error(err.clone());
        Err(err)
    }

    pub async fn run_action(
        &self,
        row: &Record,
        action: ActionType,
        extra_payload: Record,
    ) -> ActionOutcome {
        let Some(id) = row.id(&self.resource.id_field) else {
            self.feedback.error(OperationError::Misconfigured(format!(
                "{} row has no {} field",
                self.resource.name, self.resource.id_field
            )));
            return ActionOutcome::MissingId;
        };

        let guard = match RowGuard::acquire(&self.activity, &id) {
            Ok(guard) => guard,
            Err(outcome) => {
                debug!(resource = %self.resource.name, %id, %action, ?outcome, "row action ignored");
                return outcome;
            }
        };

        let submission = Submission::action(id.clone(), action, extra_payload.clone());
        match self.client.submit(&self.resource, &submission).await {
            Ok(envelope) if envelope.status => {
                self.feedback
                    .success(envelope.message().unwrap_or(default_success_message(action)));
                let effect = row_effect(action);
                match effect {
                    RowEffect::Remove => {
                        guard.resolve();
                        self.table.remove_row(&id).await;
                    }
                    RowEffect::OpenDetail => {
                        guard.resolve();
                        self.table.open_detail(&id).await;
                    }
                    RowEffect::Replace => {
                        let mut updated = row.clone();
                        updated.merge(&extra_payload);
                        self.table.replace_row(&id, updated).await;
                    }
                }
                info!(resource = %self.resource.name, %id, %action, ?effect, "row action completed");
                ActionOutcome::Completed(effect)
            }
            Ok(envelope) => {
                let err = OperationError::rejection(envelope.message());
                let message = err.user_message();
                self.feedback.error(err);
                ActionOutcome::Rejected(message)
            }
            Err(err) => {
                let err = OperationError::from(err);
                self.feedback.error(err.clone());
                ActionOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/actions_tests.rs"]
mod tests;
