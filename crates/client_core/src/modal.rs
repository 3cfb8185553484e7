//! Approve/reject confirmation modal for revision requests.
//!
//! `open -> edit reason/remark -> submit -> close`, closing only on success.

use std::sync::Arc;

use shared::domain::{ActionType, Record};
use tokio::sync::Mutex;

use crate::{
    actions::{ActionOutcome, ListActionController},
    error::{FieldError, OperationError, ValidationErrors},
};

pub const REASON_FIELD: &str = "reason";
pub const REMARK_FIELD: &str = "remark";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn action(self) -> ActionType {
        match self {
            Decision::Approve => ActionType::Approve,
            Decision::Reject => ActionType::Reject,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalOutcome {
    NotOpen,
    /// Nothing was sent; the modal stays open.
    Invalid(ValidationErrors),
    /// The request ran. The modal is closed only when this is `Completed`.
    Action(ActionOutcome),
}

#[derive(Debug, Clone)]
struct OpenModal {
    row: Record,
    reason: String,
    remark: String,
}

pub struct ConfirmationModal {
    actions: Arc<ListActionController>,
    open: Mutex<Option<OpenModal>>,
}

impl ConfirmationModal {
    pub fn new(actions: Arc<ListActionController>) -> Self {
        Self {
            actions,
            open: Mutex::new(None),
        }
    }

    pub async fn open(&self, row: Record) {
        *self.open.lock().await = Some(OpenModal {
            row,
            reason: String::new(),
            remark: String::new(),
        });
    }

    pub async fn close(&self) {
        *self.open.lock().await = None;
    }

    pub async fn is_open(&self) -> bool {
        self.open.lock().await.is_some()
    }

    pub async fn row(&self) -> Option<Record> {
        self.open.lock().await.as_ref().map(|m| m.row.clone())
    }

    pub async fn set_reason(&self, reason: impl Into<String>) {
        if let Some(modal) = self.open.lock().await.as_mut() {
            modal.reason = reason.into();
        }
    }

    pub async fn set_remark(&self, remark: impl Into<String>) {
        if let Some(modal) = self.open.lock().await.as_mut() {
            modal.remark = remark.into();
        }
    }

    pub async fn submit(&self, decision: Decision) -> ModalOutcome {
        let (row, payload) = {
            let open = self.open.lock().await;
            let Some(modal) = open.as_ref() else {
                return ModalOutcome::NotOpen;
            };
            let mut errors = ValidationErrors::new();
            if modal.reason.trim().is_empty() {
                errors.add(REASON_FIELD, FieldError::Required);
            }
            if modal.remark.trim().is_empty() {
                errors.add(REMARK_FIELD, FieldError::Required);
            }
            if let Err(errors) = errors.into_result() {
                drop(open);
                self.actions
                    .feedback()
                    .error(OperationError::Validation(errors.clone()));
                return ModalOutcome::Invalid(errors);
            }
            let payload = Record::new()
                .with(REASON_FIELD, modal.reason.trim())
                .with(REMARK_FIELD, modal.remark.trim());
            (modal.row.clone(), payload)
        };

        let outcome = self
            .actions
            .run_action(&row, decision.action(), payload)
            .await;
        if outcome.is_completed() {
            let id_field = &self.actions.resource().id_field;
            let mut open = self.open.lock().await;
            // Reopened on another row while the request ran: leave that one open.
            if open.as_ref().map(|m| m.row.id(id_field)) == Some(row.id(id_field)) {
                *open = None;
            }
        }
        ModalOutcome::Action(outcome)
    }
}

#[cfg(test)]
#[path = "tests/modal_tests.rs"]
mod tests;
