use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ActionType, Record, RecordId};

/// The `{status, message, data}` wrapper every endpoint returns.
///
/// `status=false` means nothing changed on the backend; `data` is only
/// meaningful when `status=true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn ok_with_data(data: impl Into<Value>) -> Self {
        Self {
            status: true,
            message: None,
            data: Some(data.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Server message, ignoring blanks.
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// All records carried in `data`, whether it is a single object or a
    /// sequence. Non-object entries are skipped. Empty on a failed envelope.
    pub fn records(&self) -> Vec<Record> {
        if !self.status {
            return Vec::new();
        }
        match &self.data {
            Some(Value::Array(items)) => items.iter().filter_map(record_from_value).collect(),
            Some(value) => record_from_value(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// The single record in `data`; a sequence is unwrapped to its first element.
    pub fn first_record(&self) -> Option<Record> {
        if !self.status {
            return None;
        }
        match &self.data {
            Some(Value::Array(items)) => items.first().and_then(record_from_value),
            Some(value) => record_from_value(value),
            None => None,
        }
    }
}

fn record_from_value(value: &Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(Record::from(map.clone())),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub target_id: RecordId,
    pub action_type: ActionType,
    #[serde(default)]
    pub payload: Record,
}

impl ActionRequest {
    pub fn new(target_id: RecordId, action_type: ActionType, payload: Record) -> Self {
        Self {
            target_id,
            action_type,
            payload,
        }
    }
}
