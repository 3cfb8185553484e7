//! Client side of the calibration-lab admin workflows: a typed REST resource
//! client plus the form, row-action and confirmation controllers built on it.

pub mod actions;
pub mod capabilities;
pub mod error;
pub mod feedback;
pub mod form;
pub mod http;
pub mod modal;
pub mod navigation;
pub mod resource;
pub mod settings;

pub use actions::{
    row_effect, ActionOutcome, ButtonState, ListActionController, RowEffect, TableCallbacks,
    TableState,
};
pub use capabilities::{visible_columns, CapabilitySet, ColumnSpec, PermissionCode};
pub use error::{ClientError, OperationError, ValidationErrors};
pub use feedback::{Feedback, FeedbackEvent};
pub use form::{FieldSpec, FormController, FormMode, FormSchema, LoadOutcome, SaveOutcome};
pub use http::HttpResourceClient;
pub use modal::{ConfirmationModal, Decision, ModalOutcome};
pub use navigation::{Navigator, RecordingNavigator, Route};
pub use resource::{ActionEndpoint, Filters, IdPlacement, Resource, ResourceClient, Submission};
pub use settings::ClientSettings;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
