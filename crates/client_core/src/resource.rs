//! Resource descriptions and the `ResourceClient` seam the controllers talk to.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use shared::{
    domain::{ActionType, Record, RecordId},
    protocol::{ActionRequest, ResponseEnvelope},
};

use crate::error::ClientError;

pub type Filters = BTreeMap<String, String>;

/// Where an action carries the target id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdPlacement {
    /// Appended as the last path segment: `POST /update-visualtest/{id}`.
    Path,
    /// Inserted into the JSON body under the given field: `{revrequestid, ...}`.
    Body(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEndpoint {
    pub path: String,
    pub id_placement: IdPlacement,
}

impl ActionEndpoint {
    pub fn path_id(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id_placement: IdPlacement::Path,
        }
    }

    pub fn body_id(path: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id_placement: IdPlacement::Body(field.into()),
        }
    }
}

/// Endpoint table for one backend entity. Missing entries mean the backend
/// offers no such operation for the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub id_field: String,
    pub get_path: Option<String>,
    pub list_path: Option<String>,
    pub create_path: Option<String>,
    pub actions: HashMap<ActionType, ActionEndpoint>,
}

impl Resource {
    pub fn new(name: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_field: id_field.into(),
            get_path: None,
            list_path: None,
            create_path: None,
            actions: HashMap::new(),
        }
    }

    pub fn with_get(mut self, path: impl Into<String>) -> Self {
        self.get_path = Some(path.into());
        self
    }

    pub fn with_list(mut self, path: impl Into<String>) -> Self {
        self.list_path = Some(path.into());
        self
    }

    pub fn with_create(mut self, path: impl Into<String>) -> Self {
        self.create_path = Some(path.into());
        self
    }

    pub fn with_action(mut self, action: ActionType, endpoint: ActionEndpoint) -> Self {
        self.actions.insert(action, endpoint);
        self
    }

    pub fn action(&self, action: ActionType) -> Option<&ActionEndpoint> {
        self.actions.get(&action)
    }

    pub fn visual_test() -> Self {
        Self::new("visual_test", "id")
            .with_get("/calibrationoperations/get-visualtest-byid")
            .with_list("/calibrationoperations/get-all-visualtest")
            .with_create("/calibrationoperations/add-visualtest")
            .with_action(
                ActionType::Update,
                ActionEndpoint::path_id("/calibrationoperations/update-visualtest"),
            )
    }

    pub fn revision_request() -> Self {
        Self::new("revision_request", "revrequestid")
            .with_list("/calibrationoperations/get-rev-requests")
            .with_action(
                ActionType::Approve,
                ActionEndpoint::body_id("/calibrationoperations/approve-rev-requests", "revrequestid"),
            )
            .with_action(
                ActionType::Reject,
                ActionEndpoint::body_id("/calibrationoperations/reject-rev-requests", "revrequestid"),
            )
    }

    pub fn action_item() -> Self {
        Self::new("action_item", "id")
            .with_list("/actionitem/get-alloted-items")
            .with_action(
                ActionType::Accept,
                ActionEndpoint::body_id("/actionitem/accept-alloted-item", "id"),
            )
            .with_action(
                ActionType::Assign,
                ActionEndpoint::body_id("/actionitem/assign-alloted-item", "id"),
            )
    }

    pub(crate) fn unsupported(&self, operation: impl Into<String>) -> ClientError {
        ClientError::Unsupported {
            resource: self.name.clone(),
            operation: operation.into(),
        }
    }
}

/// A write against a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create { payload: Record },
    Action(ActionRequest),
}

impl Submission {
    pub fn create(payload: Record) -> Self {
        Submission::Create { payload }
    }

    pub fn action(target_id: RecordId, action_type: ActionType, payload: Record) -> Self {
        Submission::Action(ActionRequest::new(target_id, action_type, payload))
    }

    pub fn operation_name(&self) -> &'static str {
        match self {
            Submission::Create { .. } => "create",
            Submission::Action(request) => request.action_type.as_str(),
        }
    }

    pub fn payload(&self) -> &Record {
        match self {
            Submission::Create { payload } => payload,
            Submission::Action(request) => &request.payload,
        }
    }
}

/// A resolved write: endpoint path, the id to append as a trailing path
/// segment when the endpoint takes it there, and the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSubmission {
    pub path: String,
    pub id_segment: Option<RecordId>,
    pub body: Record,
}

impl Submission {
    /// Resolves the endpoint and places the target id where the backend
    /// expects it.
    pub fn prepare(&self, resource: &Resource) -> Result<PreparedSubmission, ClientError> {
        match self {
            Submission::Create { payload } => {
                let path = resource
                    .create_path
                    .clone()
                    .ok_or_else(|| resource.unsupported("create"))?;
                Ok(PreparedSubmission {
                    path,
                    id_segment: None,
                    body: payload.clone(),
                })
            }
            Submission::Action(request) => {
                let endpoint = resource
                    .action(request.action_type)
                    .ok_or_else(|| resource.unsupported(request.action_type.as_str()))?;
                let mut body = request.payload.clone();
                let id_segment = match &endpoint.id_placement {
                    IdPlacement::Path => Some(request.target_id.clone()),
                    IdPlacement::Body(field) => {
                        body.set(field.clone(), request.target_id.clone());
                        None
                    }
                };
                Ok(PreparedSubmission {
                    path: endpoint.path.clone(),
                    id_segment,
                    body,
                })
            }
        }
    }
}

#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn fetch_one(
        &self,
        resource: &Resource,
        id: &RecordId,
    ) -> Result<ResponseEnvelope, ClientError>;

    async fn fetch_many(
        &self,
        resource: &Resource,
        filters: &Filters,
    ) -> Result<ResponseEnvelope, ClientError>;

    async fn submit(
        &self,
        resource: &Resource,
        submission: &Submission,
    ) -> Result<ResponseEnvelope, ClientError>;
}
